//! Manufacturer match records.
//!
//! A match links one design to one candidate manufacturer. The status moves
//! `pending -> accepted | rejected` exactly once and is written only by the
//! manufacturer side.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Status of a manufacturer match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
	#[default]
	Pending,
	Accepted,
	Rejected,
}

impl MatchStatus {
	pub fn is_terminal(&self) -> bool {
		!matches!(self, MatchStatus::Pending)
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			MatchStatus::Pending => "pending",
			MatchStatus::Accepted => "accepted",
			MatchStatus::Rejected => "rejected",
		}
	}
}

impl fmt::Display for MatchStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for MatchStatus {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"pending" => Ok(Self::Pending),
			"accepted" => Ok(Self::Accepted),
			"rejected" => Ok(Self::Rejected),
			other => Err(format!("unknown match status '{}'", other)),
		}
	}
}

/// A candidate pairing between a design and a manufacturer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManufacturerMatch {
	/// Unique identifier for this match.
	pub id: String,
	pub design_id: String,
	pub manufacturer_id: String,
	/// Score computed once when the request was sent.
	pub score: f64,
	pub status: MatchStatus,
	pub created_at: DateTime<Utc>,
	/// When the manufacturer accepted or rejected.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub responded_at: Option<DateTime<Utc>>,
}

impl ManufacturerMatch {
	pub fn is_accepted(&self) -> bool {
		self.status == MatchStatus::Accepted
	}
}
