//! Stage identifiers and resolution results.
//!
//! The designer and the manufacturer see two different ordered stage lists
//! over the same order record. [`Stage`] is the tagged union of the two.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Actor, Role};

/// Designer-side stages, in workflow order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DesignerStage {
	TechPack,
	FactoryMatch,
	Sending,
	Waiting,
	ReviewTimeline,
	Payment,
	Production,
	WaitingSample,
	Sample,
	Quality,
	Shipping,
}

impl DesignerStage {
	pub const ALL: [DesignerStage; 11] = [
		DesignerStage::TechPack,
		DesignerStage::FactoryMatch,
		DesignerStage::Sending,
		DesignerStage::Waiting,
		DesignerStage::ReviewTimeline,
		DesignerStage::Payment,
		DesignerStage::Production,
		DesignerStage::WaitingSample,
		DesignerStage::Sample,
		DesignerStage::Quality,
		DesignerStage::Shipping,
	];

	pub fn id(&self) -> &'static str {
		match self {
			DesignerStage::TechPack => "tech-pack",
			DesignerStage::FactoryMatch => "factory-match",
			DesignerStage::Sending => "sending",
			DesignerStage::Waiting => "waiting",
			DesignerStage::ReviewTimeline => "review-timeline",
			DesignerStage::Payment => "payment",
			DesignerStage::Production => "production",
			DesignerStage::WaitingSample => "waiting-sample",
			DesignerStage::Sample => "sample",
			DesignerStage::Quality => "quality",
			DesignerStage::Shipping => "shipping",
		}
	}

	pub fn label(&self) -> &'static str {
		match self {
			DesignerStage::TechPack => "Tech Pack",
			DesignerStage::FactoryMatch => "Factory Match",
			DesignerStage::Sending => "Sending Requests",
			DesignerStage::Waiting => "Waiting for Manufacturer",
			DesignerStage::ReviewTimeline => "Review Timeline",
			DesignerStage::Payment => "Payment",
			DesignerStage::Production => "Production Parameters",
			DesignerStage::WaitingSample => "Waiting for Sample",
			DesignerStage::Sample => "Sample Review",
			DesignerStage::Quality => "Quality Control",
			DesignerStage::Shipping => "Shipping",
		}
	}

	pub fn index(&self) -> usize {
		*self as usize
	}
}

impl FromStr for DesignerStage {
	type Err = UnknownStage;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		DesignerStage::ALL
			.into_iter()
			.find(|stage| stage.id() == s)
			.ok_or_else(|| UnknownStage(s.to_string()))
	}
}

/// Manufacturer-side stages, in workflow order.
///
/// The serialized ids keep the historical naming: `sample` is the production
/// approval step and `production` is sample development.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ManufacturerStage {
	#[serde(rename = "techpack")]
	TechPack,
	#[serde(rename = "sample")]
	ProductionApproval,
	#[serde(rename = "production")]
	SampleDevelopment,
	#[serde(rename = "quality")]
	Quality,
	#[serde(rename = "shipping")]
	Shipping,
}

impl ManufacturerStage {
	pub const ALL: [ManufacturerStage; 5] = [
		ManufacturerStage::TechPack,
		ManufacturerStage::ProductionApproval,
		ManufacturerStage::SampleDevelopment,
		ManufacturerStage::Quality,
		ManufacturerStage::Shipping,
	];

	pub fn id(&self) -> &'static str {
		match self {
			ManufacturerStage::TechPack => "techpack",
			ManufacturerStage::ProductionApproval => "sample",
			ManufacturerStage::SampleDevelopment => "production",
			ManufacturerStage::Quality => "quality",
			ManufacturerStage::Shipping => "shipping",
		}
	}

	pub fn label(&self) -> &'static str {
		match self {
			ManufacturerStage::TechPack => "Tech Pack Review",
			ManufacturerStage::ProductionApproval => "Production Approval",
			ManufacturerStage::SampleDevelopment => "Sample Development",
			ManufacturerStage::Quality => "Quality Check",
			ManufacturerStage::Shipping => "Shipping",
		}
	}

	pub fn index(&self) -> usize {
		*self as usize
	}
}

impl FromStr for ManufacturerStage {
	type Err = UnknownStage;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		ManufacturerStage::ALL
			.into_iter()
			.find(|stage| stage.id() == s)
			.ok_or_else(|| UnknownStage(s.to_string()))
	}
}

/// A stage id that names no stage of the requested role.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown stage: {0}")]
pub struct UnknownStage(pub String);

/// A stage in either role's view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "role", content = "stage", rename_all = "snake_case")]
pub enum Stage {
	Designer(DesignerStage),
	Manufacturer(ManufacturerStage),
}

impl Stage {
	/// The first stage of a role's list.
	pub fn first(role: Role) -> Stage {
		match role {
			Role::Designer => Stage::Designer(DesignerStage::TechPack),
			Role::Manufacturer => Stage::Manufacturer(ManufacturerStage::TechPack),
		}
	}

	/// Number of stages in a role's list.
	pub fn count(role: Role) -> usize {
		match role {
			Role::Designer => DesignerStage::ALL.len(),
			Role::Manufacturer => ManufacturerStage::ALL.len(),
		}
	}

	/// The stage at `index` in a role's list.
	pub fn at(role: Role, index: usize) -> Option<Stage> {
		match role {
			Role::Designer => DesignerStage::ALL.get(index).copied().map(Stage::Designer),
			Role::Manufacturer => ManufacturerStage::ALL
				.get(index)
				.copied()
				.map(Stage::Manufacturer),
		}
	}

	/// Parses a stage id within a role's list.
	pub fn parse(role: Role, id: &str) -> Result<Stage, UnknownStage> {
		match role {
			Role::Designer => id.parse().map(Stage::Designer),
			Role::Manufacturer => id.parse().map(Stage::Manufacturer),
		}
	}

	pub fn role(&self) -> Role {
		match self {
			Stage::Designer(_) => Role::Designer,
			Stage::Manufacturer(_) => Role::Manufacturer,
		}
	}

	pub fn id(&self) -> &'static str {
		match self {
			Stage::Designer(s) => s.id(),
			Stage::Manufacturer(s) => s.id(),
		}
	}

	pub fn label(&self) -> &'static str {
		match self {
			Stage::Designer(s) => s.label(),
			Stage::Manufacturer(s) => s.label(),
		}
	}

	pub fn index(&self) -> usize {
		match self {
			Stage::Designer(s) => s.index(),
			Stage::Manufacturer(s) => s.index(),
		}
	}

	pub fn is_last(&self) -> bool {
		self.index() + 1 == Stage::count(self.role())
	}

	pub fn next(&self) -> Option<Stage> {
		Stage::at(self.role(), self.index() + 1)
	}

	pub fn previous(&self) -> Option<Stage> {
		self.index()
			.checked_sub(1)
			.and_then(|i| Stage::at(self.role(), i))
	}
}

impl fmt::Display for Stage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.role(), self.id())
	}
}

/// Whose perspective a resolution is computed from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "role", content = "id", rename_all = "snake_case")]
pub enum RoleView {
	Designer,
	Manufacturer(String),
}

impl RoleView {
	pub fn role(&self) -> Role {
		match self {
			RoleView::Designer => Role::Designer,
			RoleView::Manufacturer(_) => Role::Manufacturer,
		}
	}
}

impl From<&Actor> for RoleView {
	fn from(actor: &Actor) -> Self {
		match actor.role {
			Role::Designer => RoleView::Designer,
			Role::Manufacturer => RoleView::Manufacturer(actor.id.clone()),
		}
	}
}

/// What the resolved stage asks of the viewing role right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageState {
	/// The viewing role can act.
	Actionable,
	/// Blocked until the other role writes something.
	AwaitingCounterparty,
	/// The counterparty rejected the viewer's submission; resubmit.
	Rejected,
	/// Every stage is complete.
	Complete,
}

/// An action the viewing role may perform at the resolved stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowAction {
	// designer
	AttachTechPack,
	SendMatchRequests,
	SelectManufacturer,
	ReviewTimeline,
	ConfirmPayment,
	ApproveProductionParams,
	RejectProductionParams,
	ApproveSample,
	RejectSample,
	ApproveQc,
	RejectQc,
	ConfirmDelivery,
	// manufacturer
	AcceptMatch,
	RejectMatch,
	SubmitProductionParams,
	SubmitSample,
	SubmitQc,
	RecordShipment,
}

/// Output of the stage resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
	pub stage: Stage,
	pub state: StageState,
	pub actions: Vec<WorkflowAction>,
}

impl Resolution {
	pub fn allows(&self, action: WorkflowAction) -> bool {
		self.actions.contains(&action)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_stage_ids_round_trip() {
		for stage in DesignerStage::ALL {
			assert_eq!(stage.id().parse::<DesignerStage>().unwrap(), stage);
		}
		for stage in ManufacturerStage::ALL {
			assert_eq!(stage.id().parse::<ManufacturerStage>().unwrap(), stage);
		}
		assert!("sample-development".parse::<ManufacturerStage>().is_err());
	}

	#[test]
	fn test_manufacturer_ids_keep_historical_names() {
		assert_eq!(ManufacturerStage::ProductionApproval.id(), "sample");
		assert_eq!(ManufacturerStage::SampleDevelopment.id(), "production");
		assert_eq!(
			serde_json::to_string(&ManufacturerStage::SampleDevelopment).unwrap(),
			"\"production\""
		);
	}

	#[test]
	fn test_stage_navigation() {
		let first = Stage::first(Role::Designer);
		assert_eq!(first.previous(), None);
		assert_eq!(first.next(), Some(Stage::Designer(DesignerStage::FactoryMatch)));

		let last = Stage::Manufacturer(ManufacturerStage::Shipping);
		assert!(last.is_last());
		assert_eq!(last.next(), None);
		assert_eq!(Stage::count(Role::Manufacturer), 5);
	}

	#[test]
	fn test_stage_serializes_with_role_tag() {
		let stage = Stage::Designer(DesignerStage::ReviewTimeline);
		let value = serde_json::to_value(stage).unwrap();
		assert_eq!(value["role"], "designer");
		assert_eq!(value["stage"], "review-timeline");
	}

	#[test]
	fn test_designer_stage_order_matches_index() {
		assert!(DesignerStage::Waiting < DesignerStage::ReviewTimeline);
		assert_eq!(DesignerStage::Shipping.index(), 10);
	}
}
