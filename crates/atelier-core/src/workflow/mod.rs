//! Stage resolution, transition gating and per-session navigation.
//!
//! Everything here is a pure function of a [`WorkflowSnapshot`]: the design,
//! its order and every match recorded for the design. Nothing reads a clock
//! or a client-held history, so two sessions resolving the same snapshot
//! always agree.

pub mod cursor;
pub mod gate;
pub mod resolver;
pub mod session;

pub use cursor::{CursorError, WorkflowCursor};
pub use gate::{can_advance, check_advance, check_open, ApprovalGate, DenialCause, GateDenied};
pub use resolver::{resolve, ResolveError};
pub use session::{SessionError, WorkflowSession};

use atelier_types::{Design, ManufacturerMatch, Order};
use serde::{Deserialize, Serialize};

/// Everything the resolver and the gate read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSnapshot {
	pub design: Design,
	pub order: Order,
	/// Every match recorded for the design.
	pub matches: Vec<ManufacturerMatch>,
}

impl WorkflowSnapshot {
	/// The match pairing the design with `manufacturer_id`, if any.
	pub fn match_for(&self, manufacturer_id: &str) -> Option<&ManufacturerMatch> {
		self.matches
			.iter()
			.find(|m| m.manufacturer_id == manufacturer_id)
	}

	pub fn has_accepted_match(&self) -> bool {
		self.matches.iter().any(|m| m.is_accepted())
	}

	/// Whether the order is bound to a manufacturer whose match is accepted.
	pub fn is_bound_to_accepted(&self) -> bool {
		self.order
			.manufacturer_id
			.as_deref()
			.and_then(|id| self.match_for(id))
			.is_some_and(|m| m.is_accepted())
	}
}

#[cfg(test)]
pub(crate) mod fixtures {
	//! Snapshot builders shared by the workflow tests.

	use super::WorkflowSnapshot;
	use atelier_types::{
		Approval, Design, ManufacturerMatch, MatchStatus, Order, QcResult,
	};
	use chrono::{TimeZone, Utc};

	pub fn ts() -> chrono::DateTime<Utc> {
		Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
	}

	pub fn snapshot() -> WorkflowSnapshot {
		WorkflowSnapshot {
			design: Design {
				id: "design-1".into(),
				designer_id: "designer-1".into(),
				name: "Boxy tee".into(),
				category: "t-shirts".into(),
				status: String::new(),
				tech_pack_ref: None,
				created_at: ts(),
			},
			order: Order::new("order-1", "design-1", "designer-1", ts()),
			matches: Vec::new(),
		}
	}

	pub fn with_match(mut snap: WorkflowSnapshot, manufacturer: &str, status: MatchStatus) -> WorkflowSnapshot {
		snap.matches.push(ManufacturerMatch {
			id: format!("match-{}", manufacturer),
			design_id: snap.design.id.clone(),
			manufacturer_id: manufacturer.into(),
			score: 80.0,
			status,
			created_at: ts(),
			responded_at: None,
		});
		snap
	}

	/// Tech pack attached, `mfr-a` accepted and bound.
	pub fn bound() -> WorkflowSnapshot {
		let mut snap = with_match(snapshot(), "mfr-a", MatchStatus::Accepted);
		snap.design.tech_pack_ref = Some("techpacks/boxy-tee.pdf".into());
		snap.order.manufacturer_id = Some("mfr-a".into());
		snap
	}

	/// Bound, timeline reviewed and paid.
	pub fn paid() -> WorkflowSnapshot {
		let mut snap = bound();
		snap.order.timeline_reviewed_at = Some(ts());
		snap.order.payment_confirmed_at = Some(ts());
		snap
	}

	/// Every gate through QC approved.
	pub fn qc_approved() -> WorkflowSnapshot {
		let mut snap = paid();
		snap.order.production_params_submitted_at = Some(ts());
		snap.order.production_params_approved = Approval::Approved;
		snap.order.sample_submitted_at = Some(ts());
		snap.order.sample_approved = Approval::Approved;
		snap.order.qc_submitted_at = Some(ts());
		snap.order.qc_result = Some(QcResult::Passed);
		snap.order.qc_approved = Approval::Approved;
		snap
	}
}
