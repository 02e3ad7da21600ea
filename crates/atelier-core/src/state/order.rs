//! Order record state management.
//!
//! Applies role-scoped patches to an order, enforcing field and value
//! ownership and the stage ordering, and persists the result under a per-order
//! lock. Patches are applied to a copy and only stored when every field in the
//! patch was accepted, so a rejected write leaves nothing behind.

use crate::utils::KeyedLocks;
use crate::workflow::{check_open, resolver, GateDenied, WorkflowSnapshot};
use atelier_storage::{StorageError, StorageService};
use atelier_types::{
	Actor, Approval, ApprovalTransitionError, DesignerPatch, DesignerStage, ManufacturerPatch,
	ManufacturerStage, Order, OrderPatch, OrderStatus, Role, RoleView, Stage, StageState,
	StorageKey, Verdict,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// A write that is malformed or out of order; nothing is stored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
	#[error("patch names no fields")]
	EmptyPatch,
	#[error("select at least one manufacturer")]
	NoManufacturersSelected,
	#[error("at most {max} match requests may be sent at once")]
	TooManyRequests { max: usize },
	#[error("a tech pack must be attached first")]
	MissingTechPack,
	#[error("manufacturer {manufacturer_id} has not accepted the match request")]
	MatchNotAccepted { manufacturer_id: String },
	#[error("order is already bound to {manufacturer_id}; request a re-selection to change it")]
	AlreadyBound { manufacturer_id: String },
	#[error("manufacturer can no longer be changed once production parameters are submitted")]
	RebindLocked,
	#[error("quantity must be greater than zero")]
	InvalidQuantity,
	#[error("no {0} has been submitted for review")]
	NothingToReview(&'static str),
	#[error("the {0} was rejected and is awaiting resubmission")]
	AwaitingResubmission(&'static str),
	#[error("checklist incomplete, unchecked: {}", .missing.join(", "))]
	ChecklistIncomplete { missing: Vec<&'static str> },
	#[error("{0} must not be empty")]
	MissingField(&'static str),
	#[error("production completion date is before the start date")]
	InvalidDates,
	#[error("invalid patch: {0}")]
	Malformed(String),
}

/// A write by an actor that does not own the field or value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OwnershipError {
	#[error("{actual} cannot write {expected} fields")]
	WrongRole { expected: Role, actual: Role },
	#[error("only the owning designer may change this order")]
	NotDesignOwner,
	#[error("no manufacturer has been selected for this order")]
	NotBound,
	#[error("this order is assigned to another manufacturer")]
	AssignedElsewhere,
	#[error("the {0} approval is final")]
	ApprovalFinal(&'static str),
	#[error("only the matched manufacturer may respond to this request")]
	NotMatchParty,
	#[error("only the designer or the selected manufacturer may post here")]
	NotOrderParty,
	#[error("only the owning designer or a requested manufacturer may view this design's matches")]
	NotDesignParty,
}

/// Why a patch was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
	#[error(transparent)]
	Validation(#[from] ValidationError),
	#[error(transparent)]
	Ownership(#[from] OwnershipError),
	#[error(transparent)]
	Gate(#[from] GateDenied),
}

/// Errors from order persistence.
#[derive(Debug, Error)]
pub enum OrderStateError {
	#[error("Storage error: {0}")]
	Storage(String),
	#[error("Order not found: {0}")]
	OrderNotFound(String),
	#[error(transparent)]
	Patch(#[from] PatchError),
}

/// Applies `patch` on behalf of `actor` and returns the updated order.
///
/// The snapshot is the authoritative state the patch is checked against. The
/// returned order has `updated_at` and the status mirror refreshed.
pub fn apply_patch(
	snapshot: &WorkflowSnapshot,
	actor: &Actor,
	patch: &OrderPatch,
	now: DateTime<Utc>,
) -> Result<Order, PatchError> {
	if patch.is_empty() {
		return Err(ValidationError::EmptyPatch.into());
	}
	if patch.role() != actor.role {
		return Err(OwnershipError::WrongRole {
			expected: patch.role(),
			actual: actor.role,
		}
		.into());
	}

	let mut work = snapshot.clone();
	match patch {
		OrderPatch::Designer(p) => {
			if work.order.designer_id != actor.id {
				return Err(OwnershipError::NotDesignOwner.into());
			}
			apply_designer(&mut work, p, now)?;
		},
		OrderPatch::Manufacturer(p) => {
			match work.order.manufacturer_id.as_deref() {
				None => return Err(OwnershipError::NotBound.into()),
				Some(bound) if bound != actor.id => {
					return Err(OwnershipError::AssignedElsewhere.into())
				},
				Some(_) => {},
			}
			apply_manufacturer(&mut work, &actor.id, p, now)?;
		},
	}

	work.order.updated_at = now;
	work.order.status = mirror_status(&work);
	Ok(work.order)
}

fn apply_designer(
	work: &mut WorkflowSnapshot,
	patch: &DesignerPatch,
	now: DateTime<Utc>,
) -> Result<(), PatchError> {
	let view = RoleView::Designer;

	if let Some(quantity) = patch.quantity {
		if quantity == 0 {
			return Err(ValidationError::InvalidQuantity.into());
		}
		work.order.quantity = Some(quantity);
	}

	if let Some(selection) = &patch.select_manufacturer {
		let accepted = work
			.match_for(&selection.manufacturer_id)
			.is_some_and(|m| m.is_accepted());
		if !accepted {
			return Err(ValidationError::MatchNotAccepted {
				manufacturer_id: selection.manufacturer_id.clone(),
			}
			.into());
		}
		match work.order.manufacturer_id.as_deref() {
			Some(bound) if bound == selection.manufacturer_id => {},
			Some(bound) if !selection.rebind => {
				return Err(ValidationError::AlreadyBound {
					manufacturer_id: bound.to_string(),
				}
				.into());
			},
			Some(_) if work.order.production_params_submitted_at.is_some() => {
				return Err(ValidationError::RebindLocked.into());
			},
			_ => work.order.manufacturer_id = Some(selection.manufacturer_id.clone()),
		}
	}

	if patch.timeline_reviewed && work.order.timeline_reviewed_at.is_none() {
		check_open(&view, Stage::Designer(DesignerStage::ReviewTimeline), work)?;
		work.order.timeline_reviewed_at = Some(now);
	}

	if patch.payment_confirmed && work.order.payment_confirmed_at.is_none() {
		check_open(&view, Stage::Designer(DesignerStage::Payment), work)?;
		work.order.payment_confirmed_at = Some(now);
	}

	if let Some(verdict) = patch.production_params_review {
		const WHAT: &str = "production parameters";
		if work.order.production_params_submitted_at.is_none() {
			return Err(ValidationError::NothingToReview(WHAT).into());
		}
		check_open(&view, Stage::Designer(DesignerStage::Production), work)?;
		work.order.production_params_approved =
			review(work.order.production_params_approved, verdict, WHAT)?;
	}

	if let Some(sample) = &patch.sample_review {
		const WHAT: &str = "sample";
		if work.order.sample_submitted_at.is_none() {
			return Err(ValidationError::NothingToReview(WHAT).into());
		}
		check_open(&view, Stage::Designer(DesignerStage::Sample), work)?;
		if sample.verdict == Verdict::Approve && !sample.checklist.is_complete() {
			return Err(ValidationError::ChecklistIncomplete {
				missing: sample.checklist.missing(),
			}
			.into());
		}
		work.order.sample_approved = review(work.order.sample_approved, sample.verdict, WHAT)?;
		if sample.feedback.is_some() {
			work.order.sample_feedback = sample.feedback.clone();
		}
	}

	if let Some(qc) = &patch.qc_review {
		const WHAT: &str = "quality check";
		if work.order.qc_submitted_at.is_none() {
			return Err(ValidationError::NothingToReview(WHAT).into());
		}
		check_open(&view, Stage::Designer(DesignerStage::Quality), work)?;
		if qc.verdict == Verdict::Approve && !qc.checklist.is_complete() {
			return Err(ValidationError::ChecklistIncomplete {
				missing: qc.checklist.missing(),
			}
			.into());
		}
		work.order.qc_approved = review(work.order.qc_approved, qc.verdict, WHAT)?;
	}

	if patch.delivery_confirmed && work.order.delivery_confirmed_at.is_none() {
		check_open(&view, Stage::Designer(DesignerStage::Shipping), work)?;
		work.order.delivery_confirmed_at = Some(now);
	}

	Ok(())
}

fn apply_manufacturer(
	work: &mut WorkflowSnapshot,
	manufacturer_id: &str,
	patch: &ManufacturerPatch,
	now: DateTime<Utc>,
) -> Result<(), PatchError> {
	let view = RoleView::Manufacturer(manufacturer_id.to_string());

	if let Some(params) = &patch.production_params {
		const WHAT: &str = "production parameters";
		check_open(
			&view,
			Stage::Manufacturer(ManufacturerStage::ProductionApproval),
			work,
		)?;
		if params.fabric_type.trim().is_empty() {
			return Err(ValidationError::MissingField("fabric_type").into());
		}
		if params.gsm == 0 {
			return Err(ValidationError::MissingField("gsm").into());
		}
		if let (Some(start), Some(end)) = (params.start_date, params.completion_date) {
			if end < start {
				return Err(ValidationError::InvalidDates.into());
			}
		}
		let order = &mut work.order;
		order.production_params_approved = resubmit(order.production_params_approved, WHAT)?;
		order.fabric_type = Some(params.fabric_type.clone());
		order.gsm = Some(params.gsm);
		order.shrinkage = params.shrinkage.clone();
		order.color_fastness = params.color_fastness.clone();
		order.lab_dip_refs = params.lab_dip_refs.clone();
		order.production_start_date = params.start_date;
		order.production_completion_date = params.completion_date;
		order.production_params_submitted_at = Some(now);
	}

	if let Some(sample) = &patch.sample {
		const WHAT: &str = "sample";
		check_open(
			&view,
			Stage::Manufacturer(ManufacturerStage::SampleDevelopment),
			work,
		)?;
		if sample.photo_refs.is_empty() {
			return Err(ValidationError::MissingField("photo_refs").into());
		}
		let order = &mut work.order;
		order.sample_approved = resubmit(order.sample_approved, WHAT)?;
		order.sample_photo_refs = sample.photo_refs.clone();
		order.sample_notes = sample.notes.clone();
		order.sample_submitted_at = Some(now);
	}

	if let Some(qc) = &patch.qc {
		const WHAT: &str = "quality check";
		check_open(&view, Stage::Manufacturer(ManufacturerStage::Quality), work)?;
		if qc.photo_refs.values().all(|refs| refs.is_empty()) {
			return Err(ValidationError::MissingField("photo_refs").into());
		}
		let order = &mut work.order;
		order.qc_approved = resubmit(order.qc_approved, WHAT)?;
		order.qc_photo_refs = qc.photo_refs.clone();
		order.qc_notes = qc.notes.clone();
		order.qc_result = Some(qc.result);
		order.qc_submitted_at = Some(now);
	}

	if let Some(shipment) = &patch.shipment {
		check_open(&view, Stage::Manufacturer(ManufacturerStage::Shipping), work)?;
		if shipment.tracking_number.trim().is_empty() {
			return Err(ValidationError::MissingField("tracking_number").into());
		}
		let order = &mut work.order;
		order.tracking_number = Some(shipment.tracking_number.clone());
		order.carrier = shipment.carrier.clone();
		order.shipped_at.get_or_insert(now);
	}

	Ok(())
}

fn review(current: Approval, verdict: Verdict, what: &'static str) -> Result<Approval, PatchError> {
	current.review(verdict).map_err(|e| match e {
		ApprovalTransitionError::AlreadyApproved => OwnershipError::ApprovalFinal(what).into(),
		ApprovalTransitionError::AwaitingResubmission => {
			ValidationError::AwaitingResubmission(what).into()
		},
	})
}

fn resubmit(current: Approval, what: &'static str) -> Result<Approval, PatchError> {
	current
		.resubmit()
		.map_err(|_| OwnershipError::ApprovalFinal(what).into())
}

/// Names of the top-level order fields that differ, ignoring `updated_at`.
pub fn changed_fields(before: &Order, after: &Order) -> Vec<String> {
	let (Ok(serde_json::Value::Object(old)), Ok(serde_json::Value::Object(new))) =
		(serde_json::to_value(before), serde_json::to_value(after))
	else {
		return Vec::new();
	};
	new.iter()
		.filter(|(key, value)| key.as_str() != "updated_at" && old.get(key.as_str()) != Some(value))
		.map(|(key, _)| key.clone())
		.chain(
			old.keys()
				.filter(|key| !new.contains_key(key.as_str()))
				.cloned(),
		)
		.collect()
}

/// Coarse display status derived from the designer's resolved stage.
pub fn mirror_status(snapshot: &WorkflowSnapshot) -> OrderStatus {
	let Ok(resolution) = resolver::resolve(&RoleView::Designer, snapshot) else {
		return snapshot.order.status;
	};
	if resolution.state == StageState::Complete {
		return OrderStatus::Delivered;
	}
	match resolution.stage {
		Stage::Designer(stage) => match stage {
			DesignerStage::TechPack => OrderStatus::Draft,
			DesignerStage::FactoryMatch | DesignerStage::Sending => OrderStatus::TechPackPending,
			DesignerStage::Waiting => OrderStatus::SentToManufacturer,
			DesignerStage::ReviewTimeline | DesignerStage::Payment => {
				OrderStatus::ManufacturerReview
			},
			DesignerStage::Production => OrderStatus::ProductionApproval,
			DesignerStage::WaitingSample | DesignerStage::Sample => OrderStatus::SampleDevelopment,
			DesignerStage::Quality => OrderStatus::QualityCheck,
			DesignerStage::Shipping => OrderStatus::Shipping,
		},
		Stage::Manufacturer(_) => snapshot.order.status,
	}
}

/// Persists orders and serializes read-modify-write cycles per order.
pub struct OrderStateMachine {
	storage: Arc<StorageService>,
	locks: KeyedLocks,
}

impl OrderStateMachine {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self {
			storage,
			locks: KeyedLocks::new(),
		}
	}

	/// Gets an order by ID
	pub async fn get_order(&self, order_id: &str) -> Result<Order, OrderStateError> {
		self.storage
			.retrieve(StorageKey::Orders.as_str(), order_id)
			.await
			.map_err(|e| match e {
				StorageError::NotFound => OrderStateError::OrderNotFound(order_id.to_string()),
				other => OrderStateError::Storage(other.to_string()),
			})
	}

	/// Stores a new order
	pub async fn store_order(&self, order: &Order) -> Result<(), OrderStateError> {
		self.storage
			.store(StorageKey::Orders.as_str(), &order.id, order)
			.await
			.map_err(|e| OrderStateError::Storage(e.to_string()))
	}

	/// Reads the current order under its lock, lets `updater` derive the new
	/// record and persists it. Returns the previous and the stored record.
	pub async fn update_order_with<F>(
		&self,
		order_id: &str,
		updater: F,
	) -> Result<(Order, Order), OrderStateError>
	where
		F: FnOnce(&Order) -> Result<Order, PatchError>,
	{
		let _guard = self.locks.lock(order_id).await;
		let before = self.get_order(order_id).await?;
		let after = updater(&before)?;

		self.storage
			.update(StorageKey::Orders.as_str(), order_id, &after)
			.await
			.map_err(|e| OrderStateError::Storage(e.to_string()))?;

		Ok((before, after))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::workflow::fixtures::*;
	use crate::workflow::{ApprovalGate, DenialCause};
	use atelier_storage::implementations::memory::MemoryStorage;
	use atelier_types::{
		ManufacturerSelection, MatchStatus, ProductionParams, QcChecklist, QcResult, QcReview,
		QcSubmission, SampleChecklist, SampleReview, SampleSubmission, ShipmentDetails,
	};
	use std::collections::BTreeMap;

	fn designer() -> Actor {
		Actor::designer("designer-1")
	}

	fn mfr() -> Actor {
		Actor::manufacturer("mfr-a")
	}

	fn designer_patch(patch: DesignerPatch) -> OrderPatch {
		OrderPatch::Designer(patch)
	}

	fn mfr_patch(patch: ManufacturerPatch) -> OrderPatch {
		OrderPatch::Manufacturer(patch)
	}

	fn params() -> ProductionParams {
		ProductionParams {
			fabric_type: "cotton jersey".into(),
			gsm: 180,
			shrinkage: Some("3%".into()),
			color_fastness: Some("grade 4".into()),
			lab_dip_refs: vec!["labdip/1.jpg".into()],
			start_date: None,
			completion_date: None,
		}
	}

	fn submit_params(snap: &WorkflowSnapshot) -> Order {
		apply_patch(
			snap,
			&mfr(),
			&mfr_patch(ManufacturerPatch {
				production_params: Some(params()),
				..Default::default()
			}),
			ts(),
		)
		.unwrap()
	}

	#[test]
	fn test_empty_patch_is_rejected() {
		let err = apply_patch(&bound(), &designer(), &designer_patch(DesignerPatch::default()), ts())
			.unwrap_err();
		assert_eq!(err, PatchError::Validation(ValidationError::EmptyPatch));
	}

	#[test]
	fn test_role_must_own_patch() {
		let patch = designer_patch(DesignerPatch {
			timeline_reviewed: true,
			..Default::default()
		});
		let err = apply_patch(&bound(), &mfr(), &patch, ts()).unwrap_err();
		assert!(matches!(err, PatchError::Ownership(OwnershipError::WrongRole { .. })));

		let err = apply_patch(&bound(), &Actor::designer("someone-else"), &patch, ts()).unwrap_err();
		assert_eq!(err, PatchError::Ownership(OwnershipError::NotDesignOwner));
	}

	#[test]
	fn test_selection_requires_accepted_match() {
		let mut snap = with_match(snapshot(), "mfr-a", MatchStatus::Pending);
		snap.design.tech_pack_ref = Some("tp.pdf".into());
		let select = designer_patch(DesignerPatch {
			select_manufacturer: Some(ManufacturerSelection {
				manufacturer_id: "mfr-a".into(),
				rebind: false,
			}),
			..Default::default()
		});

		let err = apply_patch(&snap, &designer(), &select, ts()).unwrap_err();
		assert!(matches!(
			err,
			PatchError::Validation(ValidationError::MatchNotAccepted { .. })
		));

		snap.matches[0].status = MatchStatus::Accepted;
		let order = apply_patch(&snap, &designer(), &select, ts()).unwrap();
		assert_eq!(order.manufacturer_id.as_deref(), Some("mfr-a"));
		assert_eq!(order.status, OrderStatus::ManufacturerReview);
	}

	#[test]
	fn test_rebind_must_be_explicit() {
		let mut snap = with_match(bound(), "mfr-b", MatchStatus::Accepted);
		let mut selection = ManufacturerSelection {
			manufacturer_id: "mfr-b".into(),
			rebind: false,
		};
		let err = apply_patch(
			&snap,
			&designer(),
			&designer_patch(DesignerPatch {
				select_manufacturer: Some(selection.clone()),
				..Default::default()
			}),
			ts(),
		)
		.unwrap_err();
		assert!(matches!(
			err,
			PatchError::Validation(ValidationError::AlreadyBound { .. })
		));

		selection.rebind = true;
		let patch = designer_patch(DesignerPatch {
			select_manufacturer: Some(selection),
			..Default::default()
		});
		let order = apply_patch(&snap, &designer(), &patch, ts()).unwrap();
		assert_eq!(order.manufacturer_id.as_deref(), Some("mfr-b"));

		snap.order.production_params_submitted_at = Some(ts());
		let err = apply_patch(&snap, &designer(), &patch, ts()).unwrap_err();
		assert_eq!(err, PatchError::Validation(ValidationError::RebindLocked));
	}

	#[test]
	fn test_payment_requires_reviewed_timeline() {
		let snap = bound();
		let err = apply_patch(
			&snap,
			&designer(),
			&designer_patch(DesignerPatch {
				payment_confirmed: true,
				..Default::default()
			}),
			ts(),
		)
		.unwrap_err();
		let PatchError::Gate(denied) = err else {
			panic!("expected gate denial, got {:?}", err);
		};
		assert_eq!(denied.cause, DenialCause::TimelineNotReviewed);

		let order = apply_patch(
			&snap,
			&designer(),
			&designer_patch(DesignerPatch {
				timeline_reviewed: true,
				payment_confirmed: true,
				..Default::default()
			}),
			ts(),
		)
		.unwrap();
		assert!(order.payment_confirmed_at.is_some());
	}

	#[test]
	fn test_manufacturer_must_be_bound() {
		let snap = with_match(snapshot(), "mfr-a", MatchStatus::Accepted);
		let patch = mfr_patch(ManufacturerPatch {
			production_params: Some(params()),
			..Default::default()
		});
		let err = apply_patch(&snap, &mfr(), &patch, ts()).unwrap_err();
		assert_eq!(err, PatchError::Ownership(OwnershipError::NotBound));

		let err = apply_patch(&bound(), &Actor::manufacturer("mfr-b"), &patch, ts()).unwrap_err();
		assert_eq!(err, PatchError::Ownership(OwnershipError::AssignedElsewhere));
	}

	#[test]
	fn test_rejection_loop_leaves_other_gates_alone() {
		let mut snap = paid();
		snap.order = submit_params(&snap);

		let reject = designer_patch(DesignerPatch {
			production_params_review: Some(Verdict::Reject),
			..Default::default()
		});
		snap.order = apply_patch(&snap, &designer(), &reject, ts()).unwrap();
		assert_eq!(snap.order.production_params_approved, Approval::Rejected);
		assert!(snap.order.payment_confirmed_at.is_some());
		assert!(snap.order.timeline_reviewed_at.is_some());

		// Rejecting twice is accepted as a no-op, approving a rejection is not
		let again = apply_patch(&snap, &designer(), &reject, ts()).unwrap();
		assert_eq!(again.production_params_approved, Approval::Rejected);
		let approve = designer_patch(DesignerPatch {
			production_params_review: Some(Verdict::Approve),
			..Default::default()
		});
		let err = apply_patch(&snap, &designer(), &approve, ts()).unwrap_err();
		assert_eq!(
			err,
			PatchError::Validation(ValidationError::AwaitingResubmission("production parameters"))
		);

		snap.order = submit_params(&snap);
		assert_eq!(snap.order.production_params_approved, Approval::Unset);
		assert_eq!(snap.order.sample_approved, Approval::Unset);
		assert_eq!(snap.order.qc_approved, Approval::Unset);

		snap.order = apply_patch(&snap, &designer(), &approve, ts()).unwrap();
		assert_eq!(snap.order.production_params_approved, Approval::Approved);

		// Approved is final for both roles
		let err = apply_patch(&snap, &designer(), &reject, ts()).unwrap_err();
		assert_eq!(
			err,
			PatchError::Ownership(OwnershipError::ApprovalFinal("production parameters"))
		);
		let err = apply_patch(
			&snap,
			&mfr(),
			&mfr_patch(ManufacturerPatch {
				production_params: Some(params()),
				..Default::default()
			}),
			ts(),
		)
		.unwrap_err();
		assert_eq!(
			err,
			PatchError::Ownership(OwnershipError::ApprovalFinal("production parameters"))
		);
	}

	#[test]
	fn test_sample_requires_approved_params() {
		let mut snap = paid();
		snap.order = submit_params(&snap);
		let sample = mfr_patch(ManufacturerPatch {
			sample: Some(SampleSubmission {
				photo_refs: vec!["sample/front.jpg".into()],
				notes: None,
			}),
			..Default::default()
		});

		let err = apply_patch(&snap, &mfr(), &sample, ts()).unwrap_err();
		let PatchError::Gate(denied) = err else {
			panic!("expected gate denial");
		};
		assert_eq!(denied.cause, DenialCause::Pending(ApprovalGate::ProductionParams));
		assert_eq!(
			denied.stage,
			Stage::Manufacturer(ManufacturerStage::ProductionApproval)
		);
	}

	#[test]
	fn test_partial_checklist_cannot_approve_sample() {
		let mut snap = paid();
		snap.order.production_params_submitted_at = Some(ts());
		snap.order.production_params_approved = Approval::Approved;
		snap.order.sample_submitted_at = Some(ts());

		let mut checklist = SampleChecklist::all_checked();
		checklist.trims_and_labels = false;
		let err = apply_patch(
			&snap,
			&designer(),
			&designer_patch(DesignerPatch {
				sample_review: Some(SampleReview {
					verdict: Verdict::Approve,
					checklist,
					feedback: None,
				}),
				..Default::default()
			}),
			ts(),
		)
		.unwrap_err();
		assert_eq!(
			err,
			PatchError::Validation(ValidationError::ChecklistIncomplete {
				missing: vec!["trims and labels"]
			})
		);

		let order = apply_patch(
			&snap,
			&designer(),
			&designer_patch(DesignerPatch {
				sample_review: Some(SampleReview {
					verdict: Verdict::Reject,
					checklist,
					feedback: Some("labels are crooked".into()),
				}),
				..Default::default()
			}),
			ts(),
		)
		.unwrap();
		assert_eq!(order.sample_approved, Approval::Rejected);
		assert_eq!(order.sample_feedback.as_deref(), Some("labels are crooked"));
	}

	#[test]
	fn test_qc_through_delivery() {
		let mut snap = paid();
		snap.order.production_params_submitted_at = Some(ts());
		snap.order.production_params_approved = Approval::Approved;
		snap.order.sample_submitted_at = Some(ts());
		snap.order.sample_approved = Approval::Approved;

		let mut photos = BTreeMap::new();
		photos.insert("M".to_string(), vec!["qc/m-front.jpg".to_string()]);
		snap.order = apply_patch(
			&snap,
			&mfr(),
			&mfr_patch(ManufacturerPatch {
				qc: Some(QcSubmission {
					photo_refs: photos,
					notes: None,
					result: QcResult::Passed,
				}),
				..Default::default()
			}),
			ts(),
		)
		.unwrap();
		assert_eq!(snap.order.status, OrderStatus::QualityCheck);

		let ship = mfr_patch(ManufacturerPatch {
			shipment: Some(ShipmentDetails {
				tracking_number: "1Z999".into(),
				carrier: Some("UPS".into()),
			}),
			..Default::default()
		});
		assert!(matches!(
			apply_patch(&snap, &mfr(), &ship, ts()),
			Err(PatchError::Gate(_))
		));

		snap.order = apply_patch(
			&snap,
			&designer(),
			&designer_patch(DesignerPatch {
				qc_review: Some(QcReview {
					verdict: Verdict::Approve,
					checklist: QcChecklist::all_checked(),
				}),
				..Default::default()
			}),
			ts(),
		)
		.unwrap();
		assert_eq!(snap.order.status, OrderStatus::Shipping);

		snap.order = apply_patch(&snap, &mfr(), &ship, ts()).unwrap();
		snap.order = apply_patch(
			&snap,
			&designer(),
			&designer_patch(DesignerPatch {
				delivery_confirmed: true,
				..Default::default()
			}),
			ts(),
		)
		.unwrap();
		assert_eq!(snap.order.status, OrderStatus::Delivered);
	}

	#[test]
	fn test_changed_fields_ignores_updated_at() {
		let before = bound().order;
		let mut after = before.clone();
		after.updated_at = ts() + chrono::Duration::seconds(5);
		after.timeline_reviewed_at = Some(ts());
		after.gsm = Some(200);
		let mut changed = changed_fields(&before, &after);
		changed.sort();
		assert_eq!(changed, vec!["gsm", "timeline_reviewed_at"]);
	}

	#[tokio::test]
	async fn test_update_with_rejected_patch_stores_nothing() {
		let storage = Arc::new(StorageService::new(Box::new(MemoryStorage::new())));
		let machine = OrderStateMachine::new(storage);
		let order = bound().order;
		machine.store_order(&order).await.unwrap();

		let result = machine
			.update_order_with(&order.id, |_| Err(ValidationError::EmptyPatch.into()))
			.await;
		assert!(matches!(result, Err(OrderStateError::Patch(_))));
		assert_eq!(machine.get_order(&order.id).await.unwrap(), order);

		assert!(matches!(
			machine.get_order("missing").await,
			Err(OrderStateError::OrderNotFound(_))
		));
	}
}
