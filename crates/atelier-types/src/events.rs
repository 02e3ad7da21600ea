//! Event types for change notification.
//!
//! Every accepted write to an order, match or message is published on the
//! event bus. Subscribers filter by order or design id and treat each event
//! as a cue to re-read, never as a delta to apply.

use crate::{Design, ManufacturerMatch, Message, Order, Role};
use serde::{Deserialize, Serialize};

/// Main event type encompassing all workflow events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WorkflowEvent {
	/// Events about a design.
	Design(DesignEvent),
	/// Events about the shared order record.
	Order(OrderEvent),
	/// Events from the match registry.
	Match(MatchEvent),
	/// Events about order messages.
	Message(MessageEvent),
}

impl WorkflowEvent {
	/// The order this event concerns, if any.
	pub fn order_id(&self) -> Option<&str> {
		match self {
			WorkflowEvent::Order(OrderEvent::Created { order })
			| WorkflowEvent::Order(OrderEvent::Changed { order, .. }) => Some(&order.id),
			WorkflowEvent::Message(MessageEvent::Appended { message }) => Some(&message.order_id),
			WorkflowEvent::Design(_) | WorkflowEvent::Match(_) => None,
		}
	}

	/// The design this event concerns, if any.
	pub fn design_id(&self) -> Option<&str> {
		match self {
			WorkflowEvent::Design(DesignEvent::Updated { design }) => Some(&design.id),
			WorkflowEvent::Order(OrderEvent::Created { order })
			| WorkflowEvent::Order(OrderEvent::Changed { order, .. }) => Some(&order.design_id),
			WorkflowEvent::Match(MatchEvent::Created { record })
			| WorkflowEvent::Match(MatchEvent::StatusChanged { record }) => Some(&record.design_id),
			WorkflowEvent::Message(_) => None,
		}
	}
}

/// Design-level changes (tech pack attached, status mirror refreshed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DesignEvent {
	Updated { design: Design },
}

/// Events related to the order record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OrderEvent {
	/// An order was created for a design.
	Created { order: Order },
	/// An accepted write changed the order.
	Changed {
		/// Full order state after the write.
		order: Order,
		/// Names of the fields whose value changed.
		changed_fields: Vec<String>,
		/// Role that performed the write.
		writer: Role,
	},
}

/// Events related to manufacturer matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MatchEvent {
	/// A new match request was recorded.
	Created { record: ManufacturerMatch },
	/// A manufacturer accepted or rejected a match.
	StatusChanged { record: ManufacturerMatch },
}

/// Events related to order messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MessageEvent {
	Appended { message: Message },
}
