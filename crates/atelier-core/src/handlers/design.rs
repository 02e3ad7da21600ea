//! Mirrors each order's coarse status onto its design.

use crate::store::{OrderStore, StoreError};
use atelier_types::{truncate_id, Order};
use std::sync::Arc;
use tracing::instrument;

pub struct DesignStatusHandler {
	store: Arc<OrderStore>,
}

impl DesignStatusHandler {
	pub fn new(store: Arc<OrderStore>) -> Self {
		Self { store }
	}

	/// Copies `order.status` onto the design; a no-op when it already matches.
	#[instrument(skip_all, fields(order_id = %truncate_id(&order.id)))]
	pub async fn handle(&self, order: &Order) -> Result<(), StoreError> {
		// Re-read so a delayed event never writes an older status
		let current = self.store.read_order(&order.id).await?;
		self.store
			.update_design_status(&current.design_id, &current.status.to_string())
			.await?;
		Ok(())
	}
}
