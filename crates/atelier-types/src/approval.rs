//! Tri-state approval gates.
//!
//! Every `*_approved` field on an order is an [`Approval`]. The three values
//! have distinct writers: `Approved` and `Rejected` come only from the
//! designer reviewing an `Unset` submission, while `Unset` is restored only by
//! the manufacturer resubmitting after a rejection. `Approved` is terminal.
//! On the wire the gate is `null | true | false`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Three-valued approval gate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum Approval {
	/// Nothing decided yet; blocks the downstream stage.
	#[default]
	Unset,
	/// Unlocks the downstream stage. Never changes afterwards.
	Approved,
	/// Needs resubmission; loops back without touching upstream gates.
	Rejected,
}

impl Approval {
	pub fn is_approved(&self) -> bool {
		matches!(self, Approval::Approved)
	}

	pub fn is_rejected(&self) -> bool {
		matches!(self, Approval::Rejected)
	}

	pub fn is_unset(&self) -> bool {
		matches!(self, Approval::Unset)
	}

	/// Applies a designer verdict, enforcing value ownership.
	///
	/// Only an `Unset` gate can receive a verdict. Re-applying the verdict the
	/// gate already holds is accepted as a no-op so a double-submitted review
	/// does not fail.
	pub fn review(self, verdict: Verdict) -> Result<Approval, ApprovalTransitionError> {
		let target = verdict.as_approval();
		match self {
			Approval::Unset => Ok(target),
			current if current == target => Ok(current),
			Approval::Approved => Err(ApprovalTransitionError::AlreadyApproved),
			Approval::Rejected => Err(ApprovalTransitionError::AwaitingResubmission),
		}
	}

	/// Applies a manufacturer resubmission.
	///
	/// A rejected gate returns to `Unset`; an unset gate stays unset. An
	/// approved gate cannot be reopened.
	pub fn resubmit(self) -> Result<Approval, ApprovalTransitionError> {
		match self {
			Approval::Approved => Err(ApprovalTransitionError::AlreadyApproved),
			Approval::Rejected | Approval::Unset => Ok(Approval::Unset),
		}
	}
}

impl From<Option<bool>> for Approval {
	fn from(value: Option<bool>) -> Self {
		match value {
			None => Approval::Unset,
			Some(true) => Approval::Approved,
			Some(false) => Approval::Rejected,
		}
	}
}

impl From<Approval> for Option<bool> {
	fn from(value: Approval) -> Self {
		match value {
			Approval::Unset => None,
			Approval::Approved => Some(true),
			Approval::Rejected => Some(false),
		}
	}
}

impl fmt::Display for Approval {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Approval::Unset => write!(f, "pending"),
			Approval::Approved => write!(f, "approved"),
			Approval::Rejected => write!(f, "rejected"),
		}
	}
}

/// Designer decision on a manufacturer submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
	Approve,
	Reject,
}

impl Verdict {
	pub fn as_approval(&self) -> Approval {
		match self {
			Verdict::Approve => Approval::Approved,
			Verdict::Reject => Approval::Rejected,
		}
	}
}

/// Illegal approval value changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ApprovalTransitionError {
	#[error("already approved; approvals are final")]
	AlreadyApproved,
	#[error("rejected and awaiting resubmission")]
	AwaitingResubmission,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_wire_format_is_nullable_bool() {
		assert_eq!(serde_json::to_string(&Approval::Unset).unwrap(), "null");
		assert_eq!(serde_json::to_string(&Approval::Approved).unwrap(), "true");
		assert_eq!(serde_json::to_string(&Approval::Rejected).unwrap(), "false");

		let parsed: Approval = serde_json::from_str("false").unwrap();
		assert_eq!(parsed, Approval::Rejected);
	}

	#[test]
	fn test_review_only_from_unset() {
		assert_eq!(
			Approval::Unset.review(Verdict::Approve),
			Ok(Approval::Approved)
		);
		assert_eq!(
			Approval::Unset.review(Verdict::Reject),
			Ok(Approval::Rejected)
		);
		assert_eq!(
			Approval::Approved.review(Verdict::Reject),
			Err(ApprovalTransitionError::AlreadyApproved)
		);
		assert_eq!(
			Approval::Rejected.review(Verdict::Approve),
			Err(ApprovalTransitionError::AwaitingResubmission)
		);
		// Double-submit of the same verdict is tolerated
		assert_eq!(
			Approval::Approved.review(Verdict::Approve),
			Ok(Approval::Approved)
		);
	}

	#[test]
	fn test_resubmit_reopens_rejection_only() {
		assert_eq!(Approval::Rejected.resubmit(), Ok(Approval::Unset));
		assert_eq!(Approval::Unset.resubmit(), Ok(Approval::Unset));
		assert_eq!(
			Approval::Approved.resubmit(),
			Err(ApprovalTransitionError::AlreadyApproved)
		);
	}
}
