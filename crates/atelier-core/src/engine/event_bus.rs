//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! Every accepted write is published here after it is persisted. Subscribers
//! that fall behind observe `RecvError::Lagged` and must re-read.

use atelier_types::WorkflowEvent;
use tokio::sync::broadcast;

/// Default buffer capacity for the broadcast channel.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Fan-out bus for [`WorkflowEvent`]s. Cheap to clone.
#[derive(Clone)]
pub struct EventBus {
	sender: broadcast::Sender<WorkflowEvent>,
}

impl EventBus {
	/// Create a bus with a specific channel capacity.
	///
	/// When the buffer is full the oldest unconsumed events are dropped for
	/// slow receivers.
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity.max(1));
		Self { sender }
	}

	/// Publish an event to all current subscribers.
	///
	/// Publishing with no subscribers is not an error; the event is dropped.
	pub fn publish(&self, event: WorkflowEvent) {
		let _ = self.sender.send(event);
	}

	/// Subscribe to all events published after this call.
	pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
		self.sender.subscribe()
	}

	/// Number of live subscribers.
	pub fn receiver_count(&self) -> usize {
		self.sender.receiver_count()
	}
}

impl Default for EventBus {
	fn default() -> Self {
		Self::new(DEFAULT_CAPACITY)
	}
}
