//! Server-sent change feed for one order.
//!
//! Each `order` event carries the full order after an accepted write. A
//! `stage` event carries the caller's fresh resolution after design or
//! match activity. A `resync` event tells the client it missed deliveries
//! and must re-read. The feed re-checks the caller's access on every
//! delivery; once it is lost a single `closed` event ends the stream.

use super::{store_error, RequestActor};
use crate::server::AppState;
use atelier_core::{OrderNotification, OrderStore, OrderSubscription, StoreError};
use atelier_types::{APIError, Actor, StageResponse};
use axum::{
	extract::{Path, State},
	response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, Stream};
use std::sync::Arc;

/// Handles GET /api/orders/{id}/events.
pub async fn order_events(
	State(state): State<AppState>,
	RequestActor(actor): RequestActor,
	Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, APIError> {
	let store = state.engine.store().clone();
	let subscription = store
		.subscribe_order_changes(&id)
		.await
		.map_err(store_error)?;
	store.resolve(&actor, &id).await.map_err(store_error)?;

	tracing::debug!(order_id = %id, role = %actor.role, "Order event stream opened");
	let feed = OrderFeed {
		store,
		actor,
		order_id: id,
		subscription,
		closed: false,
	};
	Ok(Sse::new(order_stream(feed)).keep_alive(KeepAlive::default()))
}

struct OrderFeed {
	store: Arc<OrderStore>,
	actor: Actor,
	order_id: String,
	subscription: OrderSubscription,
	closed: bool,
}

fn order_stream(feed: OrderFeed) -> impl Stream<Item = Result<Event, axum::Error>> {
	stream::unfold(feed, |mut feed| async move {
		if feed.closed {
			return None;
		}
		let notification = feed.subscription.recv().await?;

		let resolution = match feed.store.resolve(&feed.actor, &feed.order_id).await {
			Ok(resolution) => resolution,
			Err(e @ (StoreError::Resolve(_) | StoreError::Ownership(_))) => {
				tracing::debug!(
					order_id = %feed.order_id,
					actor = %feed.actor.id,
					reason = %e,
					"Order event stream closed"
				);
				feed.closed = true;
				let event = Event::default()
					.event("closed")
					.json_data(serde_json::json!({ "reason": e.to_string() }));
				return Some((event, feed));
			},
			Err(e) => {
				tracing::warn!(order_id = %feed.order_id, error = %e, "Order event stream re-read failed");
				return Some((Ok(Event::default().event("resync").data("0")), feed));
			},
		};

		let event = match notification {
			OrderNotification::Changed { order, .. } => {
				Event::default().event("order").json_data(&order)
			},
			OrderNotification::DesignChanged(_) | OrderNotification::MatchActivity(_) => {
				Event::default().event("stage").json_data(&StageResponse {
					order_id: feed.order_id.clone(),
					resolution,
				})
			},
			OrderNotification::Lagged { skipped } => Ok(Event::default()
				.event("resync")
				.data(skipped.to_string())),
		};
		Some((event, feed))
	})
}
