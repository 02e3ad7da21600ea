//! Change notifier.
//!
//! Subscriptions scoped to one order, filtered out of the shared event bus.
//! Delivery is at-least-once and best effort: a subscriber that falls behind
//! is told it lagged and must re-read instead of receiving a replay.

pub mod watcher;

pub use watcher::OrderWatcher;

use atelier_types::{
	Design, DesignEvent, ManufacturerMatch, MatchEvent, Message, MessageEvent, Order, OrderEvent,
	Role, WorkflowEvent,
};
use tokio::sync::broadcast::{self, error::RecvError};

/// One delivery on an order subscription.
#[derive(Debug, Clone)]
pub enum OrderNotification {
	/// The order changed; `order` is the full state after the write.
	Changed {
		order: Order,
		changed_fields: Vec<String>,
		writer: Role,
	},
	/// The design was updated.
	DesignChanged(Design),
	/// A match for the order's design was created or answered.
	MatchActivity(ManufacturerMatch),
	/// `skipped` events were dropped; the subscriber must re-read.
	Lagged { skipped: u64 },
}

/// Change feed for a single order.
///
/// Dropping the subscription or calling [`unsubscribe`](Self::unsubscribe)
/// ends it.
pub struct OrderSubscription {
	order_id: String,
	design_id: String,
	receiver: broadcast::Receiver<WorkflowEvent>,
}

impl OrderSubscription {
	pub(crate) fn new(
		order_id: String,
		design_id: String,
		receiver: broadcast::Receiver<WorkflowEvent>,
	) -> Self {
		Self {
			order_id,
			design_id,
			receiver,
		}
	}

	pub fn order_id(&self) -> &str {
		&self.order_id
	}

	/// Waits for the next notification about this order.
	///
	/// Returns `None` once the bus is closed.
	pub async fn recv(&mut self) -> Option<OrderNotification> {
		loop {
			match self.receiver.recv().await {
				Ok(event) => {
					if let Some(notification) = self.filter(event) {
						return Some(notification);
					}
				},
				Err(RecvError::Lagged(skipped)) => {
					tracing::warn!(order_id = %self.order_id, skipped, "Order subscription lagged");
					return Some(OrderNotification::Lagged { skipped });
				},
				Err(RecvError::Closed) => return None,
			}
		}
	}

	fn filter(&self, event: WorkflowEvent) -> Option<OrderNotification> {
		match event {
			WorkflowEvent::Order(OrderEvent::Changed {
				order,
				changed_fields,
				writer,
			}) if order.id == self.order_id => Some(OrderNotification::Changed {
				order,
				changed_fields,
				writer,
			}),
			WorkflowEvent::Design(DesignEvent::Updated { design }) if design.id == self.design_id => {
				Some(OrderNotification::DesignChanged(design))
			},
			WorkflowEvent::Match(MatchEvent::Created { record })
			| WorkflowEvent::Match(MatchEvent::StatusChanged { record })
				if record.design_id == self.design_id =>
			{
				Some(OrderNotification::MatchActivity(record))
			},
			_ => None,
		}
	}

	pub fn unsubscribe(self) {}
}

/// One delivery on a message subscription.
#[derive(Debug, Clone)]
pub enum MessageNotification {
	Appended(Message),
	Lagged { skipped: u64 },
}

/// Message feed for a single order.
pub struct MessageSubscription {
	order_id: String,
	receiver: broadcast::Receiver<WorkflowEvent>,
}

impl MessageSubscription {
	pub(crate) fn new(order_id: String, receiver: broadcast::Receiver<WorkflowEvent>) -> Self {
		Self { order_id, receiver }
	}

	pub fn order_id(&self) -> &str {
		&self.order_id
	}

	/// Waits for the next message appended to this order.
	pub async fn recv(&mut self) -> Option<MessageNotification> {
		loop {
			match self.receiver.recv().await {
				Ok(WorkflowEvent::Message(MessageEvent::Appended { message }))
					if message.order_id == self.order_id =>
				{
					return Some(MessageNotification::Appended(message));
				},
				Ok(_) => continue,
				Err(RecvError::Lagged(skipped)) => {
					return Some(MessageNotification::Lagged { skipped })
				},
				Err(RecvError::Closed) => return None,
			}
		}
	}

	pub fn unsubscribe(self) {}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::engine::event_bus::EventBus;
	use atelier_types::MatchStatus;
	use chrono::Utc;

	fn order(id: &str, design_id: &str) -> Order {
		Order::new(id, design_id, "designer-1", Utc::now())
	}

	fn changed(order: Order) -> WorkflowEvent {
		WorkflowEvent::Order(OrderEvent::Changed {
			order,
			changed_fields: vec!["quantity".into()],
			writer: Role::Designer,
		})
	}

	#[tokio::test]
	async fn test_subscription_filters_by_order_and_design() {
		let bus = EventBus::new(16);
		let mut sub = OrderSubscription::new("order-1".into(), "design-1".into(), bus.subscribe());

		bus.publish(changed(order("order-2", "design-2")));
		bus.publish(WorkflowEvent::Match(MatchEvent::Created {
			record: ManufacturerMatch {
				id: "m1".into(),
				design_id: "design-1".into(),
				manufacturer_id: "mfr-a".into(),
				score: 50.0,
				status: MatchStatus::Pending,
				created_at: Utc::now(),
				responded_at: None,
			},
		}));
		bus.publish(changed(order("order-1", "design-1")));

		assert!(matches!(
			sub.recv().await,
			Some(OrderNotification::MatchActivity(m)) if m.manufacturer_id == "mfr-a"
		));
		assert!(matches!(
			sub.recv().await,
			Some(OrderNotification::Changed { order, .. }) if order.id == "order-1"
		));
	}

	#[tokio::test]
	async fn test_lag_is_reported_not_replayed() {
		let bus = EventBus::new(2);
		let mut sub = OrderSubscription::new("order-1".into(), "design-1".into(), bus.subscribe());
		for _ in 0..5 {
			bus.publish(changed(order("order-1", "design-1")));
		}
		assert!(matches!(
			sub.recv().await,
			Some(OrderNotification::Lagged { skipped: 3 })
		));
		assert!(matches!(sub.recv().await, Some(OrderNotification::Changed { .. })));
	}

	#[tokio::test]
	async fn test_closed_bus_ends_subscription() {
		let bus = EventBus::new(4);
		let mut sub = MessageSubscription::new("order-1".into(), bus.subscribe());
		drop(bus);
		assert!(sub.recv().await.is_none());
	}
}
