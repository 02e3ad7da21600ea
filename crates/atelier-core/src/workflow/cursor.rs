//! Per-session stage cursor.
//!
//! Tracks which stage a session is displaying and the furthest stage the
//! resolver has unlocked. The displayed stage never leaves the unlocked range.

use super::gate::{check_advance, GateDenied};
use super::WorkflowSnapshot;
use atelier_types::{RoleView, Stage};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CursorError {
	#[error("already at the first stage")]
	AtFirstStage,
	#[error("already at the last stage")]
	AtLastStage,
	#[error("{0} is not unlocked yet")]
	Locked(Stage),
	#[error("{0} belongs to the other role")]
	ForeignStage(Stage),
	#[error(transparent)]
	Gate(#[from] GateDenied),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowCursor {
	view: RoleView,
	displayed: Stage,
	furthest: Stage,
}

impl WorkflowCursor {
	/// A cursor showing the resolved stage.
	pub fn new(view: RoleView, resolved: Stage) -> Self {
		Self {
			view,
			displayed: resolved,
			furthest: resolved,
		}
	}

	pub fn displayed(&self) -> Stage {
		self.displayed
	}

	pub fn furthest(&self) -> Stage {
		self.furthest
	}

	pub fn view(&self) -> &RoleView {
		&self.view
	}

	/// Takes in a freshly resolved stage.
	///
	/// The furthest mark only moves forward. A cursor sitting on the old
	/// frontier follows it; one browsing an earlier stage stays put.
	pub fn observe(&mut self, resolved: Stage) {
		if resolved.role() != self.view.role() || resolved.index() <= self.furthest.index() {
			return;
		}
		if self.displayed == self.furthest {
			self.displayed = resolved;
		}
		self.furthest = resolved;
	}

	/// Moves one stage back.
	pub fn back(&mut self) -> Result<Stage, CursorError> {
		let previous = self.displayed.previous().ok_or(CursorError::AtFirstStage)?;
		self.displayed = previous;
		Ok(previous)
	}

	/// Moves one stage forward within the unlocked range.
	pub fn forward(&mut self) -> Result<Stage, CursorError> {
		match self.displayed.next() {
			None => Err(CursorError::AtLastStage),
			Some(next) if next.index() > self.furthest.index() => Err(CursorError::Locked(next)),
			Some(next) => {
				self.displayed = next;
				Ok(next)
			},
		}
	}

	/// Jumps to any unlocked stage.
	pub fn select(&mut self, stage: Stage) -> Result<Stage, CursorError> {
		if stage.role() != self.view.role() {
			return Err(CursorError::ForeignStage(stage));
		}
		if stage.index() > self.furthest.index() {
			return Err(CursorError::Locked(stage));
		}
		self.displayed = stage;
		Ok(stage)
	}

	/// "Continue": leaves the displayed stage if the gate allows it.
	///
	/// On the last stage a passing gate leaves the cursor where it is.
	pub fn advance(&mut self, snapshot: &WorkflowSnapshot) -> Result<Stage, CursorError> {
		check_advance(&self.view, self.displayed, snapshot)?;
		if let Some(next) = self.displayed.next() {
			self.displayed = next;
			if next.index() > self.furthest.index() {
				self.furthest = next;
			}
		}
		Ok(self.displayed)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::workflow::fixtures::*;
	use crate::workflow::resolve;
	use atelier_types::{DesignerStage, ManufacturerStage};

	fn d(stage: DesignerStage) -> Stage {
		Stage::Designer(stage)
	}

	#[test]
	fn test_observe_nudges_cursor_on_frontier() {
		let mut cursor = WorkflowCursor::new(RoleView::Designer, d(DesignerStage::Payment));
		cursor.observe(d(DesignerStage::Production));
		assert_eq!(cursor.displayed(), d(DesignerStage::Production));

		cursor.back().unwrap();
		cursor.observe(d(DesignerStage::WaitingSample));
		assert_eq!(cursor.displayed(), d(DesignerStage::Payment));
		assert_eq!(cursor.furthest(), d(DesignerStage::WaitingSample));
	}

	#[test]
	fn test_observe_never_moves_back() {
		let mut cursor = WorkflowCursor::new(RoleView::Designer, d(DesignerStage::Quality));
		cursor.observe(d(DesignerStage::Sample));
		assert_eq!(cursor.furthest(), d(DesignerStage::Quality));
		cursor.observe(Stage::Manufacturer(ManufacturerStage::Shipping));
		assert_eq!(cursor.furthest(), d(DesignerStage::Quality));
	}

	#[test]
	fn test_navigation_stays_within_unlocked_range() {
		let mut cursor = WorkflowCursor::new(RoleView::Designer, d(DesignerStage::Sending));
		assert_eq!(cursor.forward(), Err(CursorError::Locked(d(DesignerStage::Waiting))));
		cursor.back().unwrap();
		cursor.back().unwrap();
		assert_eq!(cursor.back(), Err(CursorError::AtFirstStage));
		assert_eq!(cursor.forward().unwrap(), d(DesignerStage::FactoryMatch));
		assert_eq!(
			cursor.select(d(DesignerStage::Payment)),
			Err(CursorError::Locked(d(DesignerStage::Payment)))
		);
		assert_eq!(cursor.select(d(DesignerStage::TechPack)).unwrap(), d(DesignerStage::TechPack));
	}

	#[test]
	fn test_advance_consults_gate() {
		let snap = bound();
		let resolved = resolve(&RoleView::Designer, &snap).unwrap().stage;
		assert_eq!(resolved, d(DesignerStage::ReviewTimeline));

		let mut cursor = WorkflowCursor::new(RoleView::Designer, resolved);
		let err = cursor.advance(&snap).unwrap_err();
		assert!(matches!(err, CursorError::Gate(_)));
		assert_eq!(cursor.displayed(), resolved);

		cursor.select(d(DesignerStage::Waiting)).unwrap();
		assert_eq!(cursor.advance(&snap).unwrap(), d(DesignerStage::ReviewTimeline));
	}

	#[test]
	fn test_advance_on_last_stage_stays() {
		let mut snap = qc_approved();
		snap.order.delivery_confirmed_at = Some(ts());
		let mut cursor = WorkflowCursor::new(RoleView::Designer, d(DesignerStage::Shipping));
		assert_eq!(cursor.advance(&snap).unwrap(), d(DesignerStage::Shipping));
	}
}
