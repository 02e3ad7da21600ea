//! Stage resolver.
//!
//! Maps a role view and a snapshot to the current stage, what that stage asks
//! of the viewer and which actions the viewer may take. Each role walks its own
//! ordered stage list and stops at the first stage whose completion predicate
//! is false. Every predicate reads only its own fields and approvals never
//! move back from `Approved`, so resolution is monotone under accepted writes.

use super::WorkflowSnapshot;
use atelier_types::{
	Approval, DesignerStage, ManufacturerMatch, ManufacturerStage, MatchStatus, Order,
	Resolution, RoleView, Stage, StageState, WorkflowAction,
};
use thiserror::Error;

/// Why a manufacturer cannot see this order at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
	#[error("no match request names manufacturer {manufacturer_id}")]
	NoMatch { manufacturer_id: String },
	#[error("manufacturer {manufacturer_id} declined this design")]
	MatchRejected { manufacturer_id: String },
	#[error("the order is assigned to another manufacturer")]
	AssignedElsewhere { manufacturer_id: String },
}

/// Resolves the current stage for `view`.
pub fn resolve(view: &RoleView, snapshot: &WorkflowSnapshot) -> Result<Resolution, ResolveError> {
	match view {
		RoleView::Designer => Ok(resolve_designer(snapshot)),
		RoleView::Manufacturer(id) => resolve_manufacturer(id, snapshot),
	}
}

/// Completion predicate for a designer stage.
pub fn designer_stage_complete(stage: DesignerStage, snapshot: &WorkflowSnapshot) -> bool {
	let order = &snapshot.order;
	match stage {
		DesignerStage::TechPack => snapshot.design.tech_pack_ref.is_some(),
		DesignerStage::FactoryMatch | DesignerStage::Sending => !snapshot.matches.is_empty(),
		DesignerStage::Waiting => snapshot.is_bound_to_accepted(),
		DesignerStage::ReviewTimeline => order.timeline_reviewed_at.is_some(),
		DesignerStage::Payment => order.payment_confirmed_at.is_some(),
		DesignerStage::Production => order.production_params_approved.is_approved(),
		DesignerStage::WaitingSample => order.sample_submitted_at.is_some(),
		DesignerStage::Sample => order.sample_approved.is_approved(),
		DesignerStage::Quality => order.qc_approved.is_approved(),
		DesignerStage::Shipping => order.delivery_confirmed_at.is_some(),
	}
}

/// Completion predicate for a manufacturer stage, given that manufacturer's match.
pub fn manufacturer_stage_complete(
	stage: ManufacturerStage,
	record: &ManufacturerMatch,
	order: &Order,
) -> bool {
	match stage {
		ManufacturerStage::TechPack => record.is_accepted(),
		ManufacturerStage::ProductionApproval => order.production_params_approved.is_approved(),
		ManufacturerStage::SampleDevelopment => order.sample_approved.is_approved(),
		ManufacturerStage::Quality => order.qc_approved.is_approved(),
		ManufacturerStage::Shipping => order.delivery_confirmed_at.is_some(),
	}
}

/// Checks that a manufacturer may view the order and returns its match.
pub fn manufacturer_eligibility<'a>(
	manufacturer_id: &str,
	snapshot: &'a WorkflowSnapshot,
) -> Result<&'a ManufacturerMatch, ResolveError> {
	let record = snapshot
		.match_for(manufacturer_id)
		.ok_or_else(|| ResolveError::NoMatch {
			manufacturer_id: manufacturer_id.to_string(),
		})?;
	if record.status == MatchStatus::Rejected {
		return Err(ResolveError::MatchRejected {
			manufacturer_id: manufacturer_id.to_string(),
		});
	}
	match snapshot.order.manufacturer_id.as_deref() {
		Some(bound) if bound != manufacturer_id => Err(ResolveError::AssignedElsewhere {
			manufacturer_id: manufacturer_id.to_string(),
		}),
		_ => Ok(record),
	}
}

fn resolve_designer(snapshot: &WorkflowSnapshot) -> Resolution {
	let current = DesignerStage::ALL
		.into_iter()
		.find(|stage| !designer_stage_complete(*stage, snapshot));

	let Some(stage) = current else {
		return Resolution {
			stage: Stage::Designer(DesignerStage::Shipping),
			state: StageState::Complete,
			actions: Vec::new(),
		};
	};

	let order = &snapshot.order;
	let (state, actions) = match stage {
		DesignerStage::TechPack => actionable(&[WorkflowAction::AttachTechPack]),
		DesignerStage::FactoryMatch | DesignerStage::Sending => {
			actionable(&[WorkflowAction::SendMatchRequests])
		},
		DesignerStage::Waiting if snapshot.has_accepted_match() => {
			actionable(&[WorkflowAction::SelectManufacturer, WorkflowAction::SendMatchRequests])
		},
		// Nobody has accepted yet; more candidates may still be requested
		DesignerStage::Waiting => (
			StageState::AwaitingCounterparty,
			vec![WorkflowAction::SendMatchRequests],
		),
		DesignerStage::ReviewTimeline => actionable(&[WorkflowAction::ReviewTimeline]),
		DesignerStage::Payment => actionable(&[WorkflowAction::ConfirmPayment]),
		DesignerStage::Production => review_state(
			order.production_params_submitted_at.is_some(),
			order.production_params_approved,
			&[
				WorkflowAction::ApproveProductionParams,
				WorkflowAction::RejectProductionParams,
			],
		),
		DesignerStage::WaitingSample => awaiting(),
		DesignerStage::Sample => review_state(
			order.sample_submitted_at.is_some(),
			order.sample_approved,
			&[WorkflowAction::ApproveSample, WorkflowAction::RejectSample],
		),
		DesignerStage::Quality => review_state(
			order.qc_submitted_at.is_some(),
			order.qc_approved,
			&[WorkflowAction::ApproveQc, WorkflowAction::RejectQc],
		),
		DesignerStage::Shipping => actionable(&[WorkflowAction::ConfirmDelivery]),
	};

	Resolution {
		stage: Stage::Designer(stage),
		state,
		actions,
	}
}

fn resolve_manufacturer(
	manufacturer_id: &str,
	snapshot: &WorkflowSnapshot,
) -> Result<Resolution, ResolveError> {
	let record = manufacturer_eligibility(manufacturer_id, snapshot)?;
	let order = &snapshot.order;

	let current = ManufacturerStage::ALL
		.into_iter()
		.find(|stage| !manufacturer_stage_complete(*stage, record, order));

	let Some(stage) = current else {
		return Ok(Resolution {
			stage: Stage::Manufacturer(ManufacturerStage::Shipping),
			state: StageState::Complete,
			actions: Vec::new(),
		});
	};

	let (state, actions) = match stage {
		ManufacturerStage::TechPack => {
			actionable(&[WorkflowAction::AcceptMatch, WorkflowAction::RejectMatch])
		},
		// Accepted, but the designer has not selected this manufacturer yet
		ManufacturerStage::ProductionApproval if order.manufacturer_id.is_none() => awaiting(),
		ManufacturerStage::ProductionApproval => submission_state(
			order.production_params_submitted_at.is_some(),
			order.production_params_approved,
			WorkflowAction::SubmitProductionParams,
		),
		ManufacturerStage::SampleDevelopment => submission_state(
			order.sample_submitted_at.is_some(),
			order.sample_approved,
			WorkflowAction::SubmitSample,
		),
		ManufacturerStage::Quality => submission_state(
			order.qc_submitted_at.is_some(),
			order.qc_approved,
			WorkflowAction::SubmitQc,
		),
		ManufacturerStage::Shipping if order.shipped_at.is_none() => {
			actionable(&[WorkflowAction::RecordShipment])
		},
		ManufacturerStage::Shipping => awaiting(),
	};

	Ok(Resolution {
		stage: Stage::Manufacturer(stage),
		state,
		actions,
	})
}

fn actionable(actions: &[WorkflowAction]) -> (StageState, Vec<WorkflowAction>) {
	(StageState::Actionable, actions.to_vec())
}

fn awaiting() -> (StageState, Vec<WorkflowAction>) {
	(StageState::AwaitingCounterparty, Vec::new())
}

/// Designer side of an approval gate.
fn review_state(
	submitted: bool,
	approval: Approval,
	review: &[WorkflowAction],
) -> (StageState, Vec<WorkflowAction>) {
	match approval {
		Approval::Unset if submitted => actionable(review),
		// Nothing submitted yet, or rejected and waiting for resubmission
		_ => awaiting(),
	}
}

/// Manufacturer side of an approval gate.
fn submission_state(
	submitted: bool,
	approval: Approval,
	submit: WorkflowAction,
) -> (StageState, Vec<WorkflowAction>) {
	match approval {
		Approval::Rejected => (StageState::Rejected, vec![submit]),
		Approval::Unset if submitted => awaiting(),
		_ => actionable(&[submit]),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::workflow::fixtures::*;
	use atelier_types::{MatchStatus, QcResult};

	fn designer(snapshot: &WorkflowSnapshot) -> Resolution {
		resolve(&RoleView::Designer, snapshot).unwrap()
	}

	fn manufacturer(id: &str, snapshot: &WorkflowSnapshot) -> Result<Resolution, ResolveError> {
		resolve(&RoleView::Manufacturer(id.into()), snapshot)
	}

	#[test]
	fn test_new_order_without_matches() {
		let mut snap = snapshot();
		snap.design.tech_pack_ref = Some("tp.pdf".into());

		let res = designer(&snap);
		assert_eq!(res.stage, Stage::Designer(DesignerStage::FactoryMatch));
		assert!(res.allows(WorkflowAction::SendMatchRequests));

		assert_eq!(
			manufacturer("mfr-a", &snap),
			Err(ResolveError::NoMatch {
				manufacturer_id: "mfr-a".into()
			})
		);
	}

	#[test]
	fn test_missing_tech_pack_comes_first() {
		let snap = with_match(snapshot(), "mfr-a", MatchStatus::Accepted);
		assert_eq!(designer(&snap).stage, Stage::Designer(DesignerStage::TechPack));
	}

	#[test]
	fn test_accepted_match_needs_explicit_selection() {
		let mut snap = with_match(snapshot(), "mfr-a", MatchStatus::Pending);
		snap = with_match(snap, "mfr-b", MatchStatus::Pending);
		snap.design.tech_pack_ref = Some("tp.pdf".into());

		let res = designer(&snap);
		assert_eq!(res.stage, Stage::Designer(DesignerStage::Waiting));
		assert_eq!(res.state, StageState::AwaitingCounterparty);

		snap.matches[0].status = MatchStatus::Accepted;
		let res = designer(&snap);
		assert_eq!(res.stage, Stage::Designer(DesignerStage::Waiting));
		assert!(res.allows(WorkflowAction::SelectManufacturer));

		snap.order.manufacturer_id = Some("mfr-a".into());
		assert_eq!(
			designer(&snap).stage,
			Stage::Designer(DesignerStage::ReviewTimeline)
		);
	}

	#[test]
	fn test_manufacturer_eligibility() {
		let mut snap = with_match(snapshot(), "mfr-a", MatchStatus::Accepted);
		snap = with_match(snap, "mfr-b", MatchStatus::Rejected);
		snap = with_match(snap, "mfr-c", MatchStatus::Accepted);
		snap.order.manufacturer_id = Some("mfr-a".into());

		assert!(manufacturer("mfr-a", &snap).is_ok());
		assert!(matches!(
			manufacturer("mfr-b", &snap),
			Err(ResolveError::MatchRejected { .. })
		));
		assert!(matches!(
			manufacturer("mfr-c", &snap),
			Err(ResolveError::AssignedElsewhere { .. })
		));
	}

	#[test]
	fn test_pending_match_is_techpack_review() {
		let snap = with_match(snapshot(), "mfr-a", MatchStatus::Pending);
		let res = manufacturer("mfr-a", &snap).unwrap();
		assert_eq!(res.stage, Stage::Manufacturer(ManufacturerStage::TechPack));
		assert!(res.allows(WorkflowAction::AcceptMatch));
		assert!(res.allows(WorkflowAction::RejectMatch));
	}

	#[test]
	fn test_accepted_but_unselected_waits_for_designer() {
		let snap = with_match(snapshot(), "mfr-a", MatchStatus::Accepted);
		let res = manufacturer("mfr-a", &snap).unwrap();
		assert_eq!(
			res.stage,
			Stage::Manufacturer(ManufacturerStage::ProductionApproval)
		);
		assert_eq!(res.state, StageState::AwaitingCounterparty);
		assert!(res.actions.is_empty());
	}

	#[test]
	fn test_submitted_production_params_await_review() {
		let mut snap = paid();
		snap.order.production_params_submitted_at = Some(ts());

		let m = manufacturer("mfr-a", &snap).unwrap();
		assert_eq!(m.stage, Stage::Manufacturer(ManufacturerStage::ProductionApproval));
		assert_eq!(m.state, StageState::AwaitingCounterparty);

		let d = designer(&snap);
		assert_eq!(d.stage, Stage::Designer(DesignerStage::Production));
		assert_eq!(d.state, StageState::Actionable);
		assert!(d.allows(WorkflowAction::ApproveProductionParams));
		assert!(d.allows(WorkflowAction::RejectProductionParams));
	}

	#[test]
	fn test_rejected_production_params_loop_back() {
		let mut snap = paid();
		snap.order.production_params_submitted_at = Some(ts());
		snap.order.production_params_approved = Approval::Rejected;

		let m = manufacturer("mfr-a", &snap).unwrap();
		assert_eq!(m.stage, Stage::Manufacturer(ManufacturerStage::ProductionApproval));
		assert_eq!(m.state, StageState::Rejected);
		assert_eq!(m.actions, vec![WorkflowAction::SubmitProductionParams]);

		let d = designer(&snap);
		assert_eq!(d.stage, Stage::Designer(DesignerStage::Production));
		assert_eq!(d.state, StageState::AwaitingCounterparty);
		// Upstream marks are untouched
		assert!(snap.order.payment_confirmed_at.is_some());
	}

	#[test]
	fn test_shipping_reconstructed_from_fields_alone() {
		let snap = qc_approved();
		let first = designer(&snap);
		let fresh = designer(&snap.clone());
		assert_eq!(first, fresh);
		assert_eq!(first.stage, Stage::Designer(DesignerStage::Shipping));
		assert!(first.allows(WorkflowAction::ConfirmDelivery));
		assert!(snap.order.sample_approved.is_approved());
		assert!(snap.order.qc_approved.is_approved());

		let m = manufacturer("mfr-a", &snap).unwrap();
		assert_eq!(m.stage, Stage::Manufacturer(ManufacturerStage::Shipping));
		assert!(m.allows(WorkflowAction::RecordShipment));
	}

	#[test]
	fn test_delivery_completes_both_views() {
		let mut snap = qc_approved();
		snap.order.shipped_at = Some(ts());
		snap.order.delivery_confirmed_at = Some(ts());

		let d = designer(&snap);
		assert_eq!(d.state, StageState::Complete);
		assert_eq!(d.stage, Stage::Designer(DesignerStage::Shipping));
		let m = manufacturer("mfr-a", &snap).unwrap();
		assert_eq!(m.state, StageState::Complete);
	}

	#[test]
	fn test_qc_rejection_keeps_sample_approved() {
		let mut snap = qc_approved();
		snap.order.qc_approved = Approval::Rejected;
		snap.order.qc_result = Some(QcResult::NeedsRework);

		let d = designer(&snap);
		assert_eq!(d.stage, Stage::Designer(DesignerStage::Quality));
		assert!(snap.order.sample_approved.is_approved());
		let m = manufacturer("mfr-a", &snap).unwrap();
		assert_eq!(m.stage, Stage::Manufacturer(ManufacturerStage::Quality));
		assert_eq!(m.state, StageState::Rejected);
	}

	/// Replays a full sequence of accepted writes and checks that neither view
	/// ever resolves to an earlier stage.
	#[test]
	fn test_resolution_is_monotone_over_workflow() {
		let mut snap = snapshot();
		let mut steps: Vec<Box<dyn Fn(&mut WorkflowSnapshot)>> = Vec::new();
		steps.push(Box::new(|s| s.design.tech_pack_ref = Some("tp.pdf".into())));
		steps.push(Box::new(|s| {
			*s = with_match(s.clone(), "mfr-a", MatchStatus::Pending);
		}));
		steps.push(Box::new(|s| s.matches[0].status = MatchStatus::Accepted));
		steps.push(Box::new(|s| s.order.manufacturer_id = Some("mfr-a".into())));
		steps.push(Box::new(|s| s.order.production_params_submitted_at = Some(ts())));
		steps.push(Box::new(|s| s.order.timeline_reviewed_at = Some(ts())));
		steps.push(Box::new(|s| s.order.production_params_approved = Approval::Rejected));
		steps.push(Box::new(|s| s.order.payment_confirmed_at = Some(ts())));
		steps.push(Box::new(|s| s.order.production_params_approved = Approval::Unset));
		steps.push(Box::new(|s| s.order.production_params_approved = Approval::Approved));
		steps.push(Box::new(|s| s.order.sample_submitted_at = Some(ts())));
		steps.push(Box::new(|s| s.order.sample_approved = Approval::Approved));
		steps.push(Box::new(|s| s.order.qc_submitted_at = Some(ts())));
		steps.push(Box::new(|s| s.order.qc_approved = Approval::Rejected));
		steps.push(Box::new(|s| s.order.qc_approved = Approval::Unset));
		steps.push(Box::new(|s| s.order.qc_approved = Approval::Approved));
		steps.push(Box::new(|s| s.order.shipped_at = Some(ts())));
		steps.push(Box::new(|s| s.order.delivery_confirmed_at = Some(ts())));

		let mut last_designer = designer(&snap).stage.index();
		let mut last_manufacturer: Option<usize> = None;
		for step in steps {
			step(&mut snap);
			let d = designer(&snap).stage.index();
			assert!(d >= last_designer, "designer moved back to {}", d);
			last_designer = d;
			if let Ok(m) = manufacturer("mfr-a", &snap) {
				let m = m.stage.index();
				if let Some(prev) = last_manufacturer {
					assert!(m >= prev, "manufacturer moved back to {}", m);
				}
				last_manufacturer = Some(m);
			}
		}
		assert_eq!(designer(&snap).state, StageState::Complete);
	}
}
