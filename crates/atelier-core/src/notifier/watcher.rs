//! Keeps one actor's snapshot of an order current from its subscription.

use super::{OrderNotification, OrderSubscription};
use crate::store::{authorize_view, OrderStore, StoreError};
use crate::workflow::WorkflowSnapshot;
use atelier_types::Actor;
use std::sync::Arc;

/// Watches one order on behalf of one actor.
///
/// Delivered order states replace the held order directly. Match activity
/// re-reads the design's matches. A lag, or the channel closing, triggers a
/// full read; a closed channel is re-subscribed first.
///
/// Every new snapshot is authorized for the actor before it is kept. Once a
/// manufacturer loses eligibility (its match is rejected or the order is
/// bound elsewhere) the update is refused and the held snapshot stays at the
/// last state the manufacturer was entitled to.
pub struct OrderWatcher {
	store: Arc<OrderStore>,
	actor: Actor,
	order_id: String,
	subscription: OrderSubscription,
	snapshot: WorkflowSnapshot,
}

impl OrderWatcher {
	/// Subscribes, then performs the initial full read.
	pub async fn open(
		store: Arc<OrderStore>,
		actor: Actor,
		order_id: &str,
	) -> Result<Self, StoreError> {
		let subscription = store.subscribe_order_changes(order_id).await?;
		let snapshot = store.snapshot(order_id).await?;
		authorize_view(&actor, &snapshot)?;
		Ok(Self {
			store,
			actor,
			order_id: order_id.to_string(),
			subscription,
			snapshot,
		})
	}

	pub fn snapshot(&self) -> &WorkflowSnapshot {
		&self.snapshot
	}

	pub fn order_id(&self) -> &str {
		&self.order_id
	}

	pub fn actor(&self) -> &Actor {
		&self.actor
	}

	/// Performs one authoritative full read.
	pub async fn resync(&mut self) -> Result<&WorkflowSnapshot, StoreError> {
		let fresh = self.store.snapshot(&self.order_id).await?;
		self.keep(fresh)
	}

	/// Waits for the next change and returns the updated snapshot.
	///
	/// On error the held snapshot is left as it was.
	pub async fn next(&mut self) -> Result<&WorkflowSnapshot, StoreError> {
		let candidate = match self.subscription.recv().await {
			Some(OrderNotification::Changed { order, .. }) => WorkflowSnapshot {
				order,
				..self.snapshot.clone()
			},
			Some(OrderNotification::DesignChanged(design)) => WorkflowSnapshot {
				design,
				..self.snapshot.clone()
			},
			Some(OrderNotification::MatchActivity(_)) => WorkflowSnapshot {
				matches: self.store.list_matches(&self.snapshot.design.id).await?,
				..self.snapshot.clone()
			},
			Some(OrderNotification::Lagged { .. }) => self.store.snapshot(&self.order_id).await?,
			None => {
				tracing::debug!(order_id = %self.order_id, "Change feed closed, re-subscribing");
				self.subscription = self.store.subscribe_order_changes(&self.order_id).await?;
				self.store.snapshot(&self.order_id).await?
			},
		};
		self.keep(candidate)
	}

	fn keep(&mut self, candidate: WorkflowSnapshot) -> Result<&WorkflowSnapshot, StoreError> {
		authorize_view(&self.actor, &candidate)?;
		self.snapshot = candidate;
		Ok(&self.snapshot)
	}
}
