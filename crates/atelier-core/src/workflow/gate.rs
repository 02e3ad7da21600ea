//! Transition gate.
//!
//! Predicates evaluated before a cursor leaves a stage. A denial blocks the
//! move and names what is missing; it never touches data.

use super::resolver::{
	designer_stage_complete, manufacturer_eligibility, manufacturer_stage_complete, ResolveError,
};
use super::WorkflowSnapshot;
use atelier_types::{Approval, DesignerStage, ManufacturerStage, Role, RoleView, Stage};
use thiserror::Error;

/// The three designer-reviewed submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalGate {
	ProductionParams,
	Sample,
	Qc,
}

impl ApprovalGate {
	pub fn label(&self) -> &'static str {
		match self {
			ApprovalGate::ProductionParams => "production parameters",
			ApprovalGate::Sample => "sample",
			ApprovalGate::Qc => "quality check",
		}
	}

	fn is_plural(&self) -> bool {
		matches!(self, ApprovalGate::ProductionParams)
	}

	fn state(&self, snapshot: &WorkflowSnapshot) -> (bool, Approval) {
		let order = &snapshot.order;
		match self {
			ApprovalGate::ProductionParams => (
				order.production_params_submitted_at.is_some(),
				order.production_params_approved,
			),
			ApprovalGate::Sample => (order.sample_submitted_at.is_some(), order.sample_approved),
			ApprovalGate::Qc => (order.qc_submitted_at.is_some(), order.qc_approved),
		}
	}

	/// `Ok` when approved, otherwise the precise reason it is not.
	fn check(&self, snapshot: &WorkflowSnapshot) -> Result<(), DenialCause> {
		match self.state(snapshot) {
			(_, Approval::Approved) => Ok(()),
			(_, Approval::Rejected) => Err(DenialCause::Rejected(*self)),
			(true, Approval::Unset) => Err(DenialCause::Pending(*self)),
			(false, Approval::Unset) => Err(DenialCause::NotSubmitted(*self)),
		}
	}
}

/// Why a stage cannot be left yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenialCause {
	MissingTechPack,
	NoMatchRequests,
	NoAcceptedMatch,
	ManufacturerNotSelected,
	TimelineNotReviewed,
	PaymentNotConfirmed,
	NotSubmitted(ApprovalGate),
	Pending(ApprovalGate),
	Rejected(ApprovalGate),
	MatchNotAccepted,
	DeliveryNotConfirmed,
	Ineligible(ResolveError),
	ForeignStage,
}

/// A blocked cursor move.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", describe(.stage, .cause))]
pub struct GateDenied {
	/// The stage the cursor tried to leave or open.
	pub stage: Stage,
	pub cause: DenialCause,
}

impl GateDenied {
	pub fn role(&self) -> Role {
		self.stage.role()
	}
}

fn describe(stage: &Stage, cause: &DenialCause) -> String {
	let role = stage.role();
	let reason = match (role, cause) {
		(_, DenialCause::MissingTechPack) => "attach a tech pack before continuing".to_string(),
		(_, DenialCause::NoMatchRequests) => {
			"send a request to at least one manufacturer first".to_string()
		},
		(_, DenialCause::NoAcceptedMatch) => "waiting for a manufacturer to accept".to_string(),
		(_, DenialCause::ManufacturerNotSelected) => {
			"select one of the manufacturers that accepted".to_string()
		},
		(_, DenialCause::TimelineNotReviewed) => "review the production timeline first".to_string(),
		(_, DenialCause::PaymentNotConfirmed) => "payment has not been confirmed".to_string(),
		(Role::Designer, DenialCause::NotSubmitted(gate)) => {
			format!("waiting for the manufacturer to submit the {}", gate.label())
		},
		(Role::Manufacturer, DenialCause::NotSubmitted(gate)) => {
			format!("submit the {} first", gate.label())
		},
		(Role::Designer, DenialCause::Pending(gate)) => {
			format!("approve or reject the {} first", gate.label())
		},
		(Role::Manufacturer, DenialCause::Pending(gate)) => {
			format!("{} approval is pending with the designer", gate.label())
		},
		(Role::Designer, DenialCause::Rejected(gate)) => format!(
			"the {} {} rejected; waiting for the manufacturer to resubmit",
			gate.label(),
			if gate.is_plural() { "were" } else { "was" }
		),
		(Role::Manufacturer, DenialCause::Rejected(gate)) => format!(
			"the designer rejected the {}; resubmit to continue",
			gate.label()
		),
		(_, DenialCause::MatchNotAccepted) => "accept the match request first".to_string(),
		(_, DenialCause::DeliveryNotConfirmed) => {
			"waiting for the designer to confirm delivery".to_string()
		},
		(_, DenialCause::Ineligible(err)) => err.to_string(),
		(_, DenialCause::ForeignStage) => format!("not a {} stage", role.counterparty()),
	};
	format!("cannot leave {}: {}", stage.label(), reason)
}

/// Whether the viewer may move the cursor past `stage`.
///
/// Passes exactly when the stage's completion predicate holds. A manufacturer
/// view must also be eligible to see the order at all.
pub fn check_advance(
	view: &RoleView,
	stage: Stage,
	snapshot: &WorkflowSnapshot,
) -> Result<(), GateDenied> {
	let deny = |cause| GateDenied { stage, cause };
	match (view, stage) {
		(RoleView::Designer, Stage::Designer(s)) => {
			if designer_stage_complete(s, snapshot) {
				Ok(())
			} else {
				Err(deny(designer_cause(s, snapshot)))
			}
		},
		(RoleView::Manufacturer(id), Stage::Manufacturer(s)) => {
			let record = manufacturer_eligibility(id, snapshot)
				.map_err(|e| deny(DenialCause::Ineligible(e)))?;
			if manufacturer_stage_complete(s, record, &snapshot.order) {
				Ok(())
			} else {
				Err(deny(manufacturer_cause(s, snapshot)))
			}
		},
		_ => Err(deny(DenialCause::ForeignStage)),
	}
}

/// Whether the viewer may open `stage`: every stage before it must be passable.
pub fn check_open(
	view: &RoleView,
	stage: Stage,
	snapshot: &WorkflowSnapshot,
) -> Result<(), GateDenied> {
	if stage.role() != view.role() {
		return Err(GateDenied {
			stage,
			cause: DenialCause::ForeignStage,
		});
	}
	(0..stage.index())
		.filter_map(|i| Stage::at(stage.role(), i))
		.try_for_each(|earlier| check_advance(view, earlier, snapshot))
}

pub fn can_advance(view: &RoleView, stage: Stage, snapshot: &WorkflowSnapshot) -> bool {
	check_advance(view, stage, snapshot).is_ok()
}

fn designer_cause(stage: DesignerStage, snapshot: &WorkflowSnapshot) -> DenialCause {
	match stage {
		DesignerStage::TechPack => DenialCause::MissingTechPack,
		DesignerStage::FactoryMatch | DesignerStage::Sending => DenialCause::NoMatchRequests,
		DesignerStage::Waiting if !snapshot.has_accepted_match() => DenialCause::NoAcceptedMatch,
		DesignerStage::Waiting => DenialCause::ManufacturerNotSelected,
		DesignerStage::ReviewTimeline => DenialCause::TimelineNotReviewed,
		DesignerStage::Payment => DenialCause::PaymentNotConfirmed,
		DesignerStage::Production => approval_cause(ApprovalGate::ProductionParams, snapshot),
		DesignerStage::WaitingSample => DenialCause::NotSubmitted(ApprovalGate::Sample),
		DesignerStage::Sample => approval_cause(ApprovalGate::Sample, snapshot),
		DesignerStage::Quality => approval_cause(ApprovalGate::Qc, snapshot),
		DesignerStage::Shipping => DenialCause::DeliveryNotConfirmed,
	}
}

fn manufacturer_cause(stage: ManufacturerStage, snapshot: &WorkflowSnapshot) -> DenialCause {
	match stage {
		ManufacturerStage::TechPack => DenialCause::MatchNotAccepted,
		ManufacturerStage::ProductionApproval if snapshot.order.manufacturer_id.is_none() => {
			DenialCause::ManufacturerNotSelected
		},
		ManufacturerStage::ProductionApproval => {
			approval_cause(ApprovalGate::ProductionParams, snapshot)
		},
		ManufacturerStage::SampleDevelopment => approval_cause(ApprovalGate::Sample, snapshot),
		ManufacturerStage::Quality => approval_cause(ApprovalGate::Qc, snapshot),
		ManufacturerStage::Shipping => DenialCause::DeliveryNotConfirmed,
	}
}

fn approval_cause(gate: ApprovalGate, snapshot: &WorkflowSnapshot) -> DenialCause {
	match gate.check(snapshot) {
		Err(cause) => cause,
		// Only reached if the predicate and the gate disagree
		Ok(()) => DenialCause::Pending(gate),
	}
}
