//! A single actor's live view of one order.

use super::cursor::{CursorError, WorkflowCursor};
use super::resolver::resolve;
use super::WorkflowSnapshot;
use crate::notifier::OrderWatcher;
use crate::store::{authorize_view, OrderStore, StoreError};
use atelier_types::{Actor, Order, OrderPatch, Resolution, RoleView, Stage};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
	#[error(transparent)]
	Store(#[from] StoreError),
	#[error(transparent)]
	Cursor(#[from] CursorError),
}

/// Binds an actor, an order, a watcher and a cursor.
///
/// Every read re-runs the resolver and nudges the cursor. A failed read or
/// write leaves the cursor and the last resolution untouched; that includes
/// a manufacturer whose eligibility lapsed, which gets a resolve error
/// instead of the new state.
pub struct WorkflowSession {
	store: Arc<OrderStore>,
	actor: Actor,
	watcher: OrderWatcher,
	cursor: WorkflowCursor,
	resolution: Resolution,
}

impl WorkflowSession {
	pub async fn open(
		store: Arc<OrderStore>,
		actor: Actor,
		order_id: &str,
	) -> Result<Self, SessionError> {
		let watcher = OrderWatcher::open(store.clone(), actor.clone(), order_id).await?;
		let resolution = Self::resolve_for(&actor, watcher.snapshot())?;
		let cursor = WorkflowCursor::new(RoleView::from(&actor), resolution.stage);
		Ok(Self {
			store,
			actor,
			watcher,
			cursor,
			resolution,
		})
	}

	fn resolve_for(actor: &Actor, snapshot: &WorkflowSnapshot) -> Result<Resolution, StoreError> {
		let view = authorize_view(actor, snapshot)?;
		Ok(resolve(&view, snapshot)?)
	}

	fn apply_resolution(&mut self) -> Result<&Resolution, SessionError> {
		let resolution = Self::resolve_for(&self.actor, self.watcher.snapshot())?;
		self.cursor.observe(resolution.stage);
		self.resolution = resolution;
		Ok(&self.resolution)
	}

	pub fn order_id(&self) -> &str {
		self.watcher.order_id()
	}

	pub fn actor(&self) -> &Actor {
		&self.actor
	}

	pub fn resolution(&self) -> &Resolution {
		&self.resolution
	}

	pub fn cursor(&self) -> &WorkflowCursor {
		&self.cursor
	}

	pub fn snapshot(&self) -> &WorkflowSnapshot {
		self.watcher.snapshot()
	}

	/// Full authoritative read.
	pub async fn refresh(&mut self) -> Result<&Resolution, SessionError> {
		self.watcher.resync().await?;
		self.apply_resolution()
	}

	/// Waits for one change delivery and re-resolves.
	pub async fn next_update(&mut self) -> Result<&Resolution, SessionError> {
		self.watcher.next().await?;
		self.apply_resolution()
	}

	/// Writes fields through the store, then re-reads.
	pub async fn write(&mut self, patch: OrderPatch) -> Result<Order, SessionError> {
		let order = self
			.store
			.write_order_fields(&self.actor, self.watcher.order_id(), patch)
			.await?;
		self.refresh().await?;
		Ok(order)
	}

	/// "Continue" on the displayed stage.
	pub fn advance(&mut self) -> Result<Stage, SessionError> {
		Ok(self.cursor.advance(self.watcher.snapshot())?)
	}

	pub fn back(&mut self) -> Result<Stage, SessionError> {
		Ok(self.cursor.back()?)
	}

	pub fn forward(&mut self) -> Result<Stage, SessionError> {
		Ok(self.cursor.forward()?)
	}

	pub fn select(&mut self, stage: Stage) -> Result<Stage, SessionError> {
		Ok(self.cursor.select(stage)?)
	}
}
