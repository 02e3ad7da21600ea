//! The shared order record and role-scoped partial updates.
//!
//! An order is read and written by both actors. Every field has exactly one
//! writer role; the patch types below make that ownership structural, since a
//! [`DesignerPatch`] cannot name a manufacturer-owned field and vice versa.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::{Approval, QcChecklist, Role, SampleChecklist, Verdict};

/// Coarse status mirrored on the order for display and filtering.
///
/// Never authoritative: stage resolution reads the individual fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
	#[default]
	Draft,
	TechPackPending,
	SentToManufacturer,
	ManufacturerReview,
	ProductionApproval,
	SampleDevelopment,
	QualityCheck,
	Shipping,
	Delivered,
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			OrderStatus::Draft => "draft",
			OrderStatus::TechPackPending => "tech_pack_pending",
			OrderStatus::SentToManufacturer => "sent_to_manufacturer",
			OrderStatus::ManufacturerReview => "manufacturer_review",
			OrderStatus::ProductionApproval => "production_approval",
			OrderStatus::SampleDevelopment => "sample_development",
			OrderStatus::QualityCheck => "quality_check",
			OrderStatus::Shipping => "shipping",
			OrderStatus::Delivered => "delivered",
		};
		f.write_str(s)
	}
}

/// Outcome the manufacturer reports for a quality-control run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QcResult {
	Passed,
	Failed,
	NeedsRework,
}

/// The shared order record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
	/// Unique identifier for this order.
	pub id: String,
	pub design_id: String,
	pub designer_id: String,
	/// Bound manufacturer; set only by an explicit designer selection.
	pub manufacturer_id: Option<String>,
	pub quantity: Option<u32>,
	/// Display mirror of the designer-side stage.
	#[serde(default)]
	pub status: OrderStatus,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,

	// Designer acknowledgements
	pub timeline_reviewed_at: Option<DateTime<Utc>>,
	pub payment_confirmed_at: Option<DateTime<Utc>>,
	pub delivery_confirmed_at: Option<DateTime<Utc>>,

	// Production parameters (manufacturer), approval (designer)
	pub fabric_type: Option<String>,
	pub gsm: Option<u32>,
	pub shrinkage: Option<String>,
	pub color_fastness: Option<String>,
	#[serde(default)]
	pub lab_dip_refs: Vec<String>,
	pub production_start_date: Option<NaiveDate>,
	pub production_completion_date: Option<NaiveDate>,
	pub production_params_submitted_at: Option<DateTime<Utc>>,
	#[serde(default)]
	pub production_params_approved: Approval,

	// Sample (manufacturer), feedback and approval (designer)
	#[serde(default)]
	pub sample_photo_refs: Vec<String>,
	pub sample_notes: Option<String>,
	pub sample_submitted_at: Option<DateTime<Utc>>,
	pub sample_feedback: Option<String>,
	#[serde(default)]
	pub sample_approved: Approval,

	// Quality control (manufacturer), approval (designer)
	/// Photo references keyed by garment size.
	#[serde(default)]
	pub qc_photo_refs: BTreeMap<String, Vec<String>>,
	pub qc_notes: Option<String>,
	pub qc_result: Option<QcResult>,
	pub qc_submitted_at: Option<DateTime<Utc>>,
	#[serde(default)]
	pub qc_approved: Approval,

	// Shipping (manufacturer)
	pub tracking_number: Option<String>,
	pub carrier: Option<String>,
	pub shipped_at: Option<DateTime<Utc>>,
}

impl Order {
	/// Creates a fresh order for a design with every gate unset.
	pub fn new(
		id: impl Into<String>,
		design_id: impl Into<String>,
		designer_id: impl Into<String>,
		now: DateTime<Utc>,
	) -> Self {
		Self {
			id: id.into(),
			design_id: design_id.into(),
			designer_id: designer_id.into(),
			manufacturer_id: None,
			quantity: None,
			status: OrderStatus::Draft,
			created_at: now,
			updated_at: now,
			timeline_reviewed_at: None,
			payment_confirmed_at: None,
			delivery_confirmed_at: None,
			fabric_type: None,
			gsm: None,
			shrinkage: None,
			color_fastness: None,
			lab_dip_refs: Vec::new(),
			production_start_date: None,
			production_completion_date: None,
			production_params_submitted_at: None,
			production_params_approved: Approval::Unset,
			sample_photo_refs: Vec::new(),
			sample_notes: None,
			sample_submitted_at: None,
			sample_feedback: None,
			sample_approved: Approval::Unset,
			qc_photo_refs: BTreeMap::new(),
			qc_notes: None,
			qc_result: None,
			qc_submitted_at: None,
			qc_approved: Approval::Unset,
			tracking_number: None,
			carrier: None,
			shipped_at: None,
		}
	}
}

/// Production parameters submitted by the manufacturer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductionParams {
	pub fabric_type: String,
	pub gsm: u32,
	pub shrinkage: Option<String>,
	pub color_fastness: Option<String>,
	#[serde(default)]
	pub lab_dip_refs: Vec<String>,
	pub start_date: Option<NaiveDate>,
	pub completion_date: Option<NaiveDate>,
}

/// Sample artifacts submitted by the manufacturer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SampleSubmission {
	pub photo_refs: Vec<String>,
	pub notes: Option<String>,
}

/// Quality-control report submitted by the manufacturer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QcSubmission {
	/// Photo references keyed by garment size.
	pub photo_refs: BTreeMap<String, Vec<String>>,
	pub notes: Option<String>,
	pub result: QcResult,
}

/// Shipment details recorded by the manufacturer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShipmentDetails {
	pub tracking_number: String,
	pub carrier: Option<String>,
}

/// Explicit designer choice of which accepted manufacturer to bind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManufacturerSelection {
	pub manufacturer_id: String,
	/// Must be set to replace an already bound manufacturer.
	#[serde(default)]
	pub rebind: bool,
}

/// Designer review of a submitted sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SampleReview {
	pub verdict: Verdict,
	#[serde(default)]
	pub checklist: SampleChecklist,
	pub feedback: Option<String>,
}

/// Designer review of a quality-control report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QcReview {
	pub verdict: Verdict,
	#[serde(default)]
	pub checklist: QcChecklist,
}

/// Fields only the designer may write.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DesignerPatch {
	pub select_manufacturer: Option<ManufacturerSelection>,
	pub quantity: Option<u32>,
	pub timeline_reviewed: bool,
	pub payment_confirmed: bool,
	pub production_params_review: Option<Verdict>,
	pub sample_review: Option<SampleReview>,
	pub qc_review: Option<QcReview>,
	pub delivery_confirmed: bool,
}

impl DesignerPatch {
	pub fn is_empty(&self) -> bool {
		self == &DesignerPatch::default()
	}
}

/// Fields only the manufacturer may write.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ManufacturerPatch {
	pub production_params: Option<ProductionParams>,
	pub sample: Option<SampleSubmission>,
	pub qc: Option<QcSubmission>,
	pub shipment: Option<ShipmentDetails>,
}

impl ManufacturerPatch {
	pub fn is_empty(&self) -> bool {
		self == &ManufacturerPatch::default()
	}
}

/// A partial order update scoped to the role that owns its fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", content = "fields", rename_all = "snake_case")]
pub enum OrderPatch {
	Designer(DesignerPatch),
	Manufacturer(ManufacturerPatch),
}

impl OrderPatch {
	/// The role that owns every field in this patch.
	pub fn role(&self) -> Role {
		match self {
			OrderPatch::Designer(_) => Role::Designer,
			OrderPatch::Manufacturer(_) => Role::Manufacturer,
		}
	}

	pub fn is_empty(&self) -> bool {
		match self {
			OrderPatch::Designer(p) => p.is_empty(),
			OrderPatch::Manufacturer(p) => p.is_empty(),
		}
	}

	/// Parses the fields of a patch for the given role.
	///
	/// Unknown fields, including fields owned by the other role, are rejected.
	pub fn from_fields(role: Role, fields: serde_json::Value) -> Result<Self, serde_json::Error> {
		Ok(match role {
			Role::Designer => OrderPatch::Designer(serde_json::from_value(fields)?),
			Role::Manufacturer => OrderPatch::Manufacturer(serde_json::from_value(fields)?),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_new_order_has_unset_gates() {
		let order = Order::new("o1", "d1", "u1", Utc::now());
		assert!(order.production_params_approved.is_unset());
		assert!(order.sample_approved.is_unset());
		assert!(order.qc_approved.is_unset());
		assert_eq!(order.status, OrderStatus::Draft);
	}

	#[test]
	fn test_status_names_are_reachable_stages_only() {
		let status: OrderStatus = serde_json::from_value(json!("quality_check")).unwrap();
		assert_eq!(status, OrderStatus::QualityCheck);
		assert_eq!(status.to_string(), "quality_check");
		assert!(serde_json::from_value::<OrderStatus>(json!("cancelled")).is_err());
	}

	#[test]
	fn test_order_gates_serialize_as_nullable_bools() {
		let mut order = Order::new("o1", "d1", "u1", Utc::now());
		order.production_params_approved = Approval::Rejected;
		let value = serde_json::to_value(&order).unwrap();
		assert_eq!(value["production_params_approved"], json!(false));
		assert_eq!(value["sample_approved"], serde_json::Value::Null);
	}

	#[test]
	fn test_designer_fields_cannot_carry_manufacturer_fields() {
		let err = OrderPatch::from_fields(
			Role::Designer,
			json!({ "payment_confirmed": true, "production_params": { "fabric_type": "jersey", "gsm": 180 } }),
		);
		assert!(err.is_err());

		let ok = OrderPatch::from_fields(Role::Designer, json!({ "payment_confirmed": true })).unwrap();
		assert_eq!(ok.role(), Role::Designer);
		assert!(!ok.is_empty());
	}

	#[test]
	fn test_manufacturer_fields_cannot_carry_approvals() {
		let err = OrderPatch::from_fields(
			Role::Manufacturer,
			json!({ "production_params_review": "approve" }),
		);
		assert!(err.is_err());
	}

	#[test]
	fn test_empty_patch_detection() {
		assert!(OrderPatch::Designer(DesignerPatch::default()).is_empty());
		assert!(OrderPatch::Manufacturer(ManufacturerPatch::default()).is_empty());
	}
}
