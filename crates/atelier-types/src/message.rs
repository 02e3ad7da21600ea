//! Order messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Role;

/// A chat message attached to an order. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
	pub id: String,
	pub order_id: String,
	/// Per-order sequence number, starting at 1. Breaks creation-time ties.
	pub seq: u64,
	pub sender_role: Role,
	pub sender_id: String,
	pub content: String,
	/// Opaque references to uploaded attachments.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub attachments: Vec<String>,
	pub created_at: DateTime<Utc>,
}

impl Message {
	/// Ordering key: creation time, then sequence.
	pub fn sort_key(&self) -> (DateTime<Utc>, u64) {
		(self.created_at, self.seq)
	}
}
