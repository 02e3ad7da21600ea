//! Approval checklists.
//!
//! A designer approval is all-or-nothing: every criterion on the fixed list
//! must be individually checked before the approval can be recorded.

use serde::{Deserialize, Serialize};

/// Five-item checklist gating sample approval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SampleChecklist {
	pub fit_and_measurements: bool,
	pub fabric_and_color: bool,
	pub stitching_and_construction: bool,
	pub trims_and_labels: bool,
	pub overall_finish: bool,
}

impl SampleChecklist {
	/// A checklist with every criterion checked.
	pub fn all_checked() -> Self {
		Self {
			fit_and_measurements: true,
			fabric_and_color: true,
			stitching_and_construction: true,
			trims_and_labels: true,
			overall_finish: true,
		}
	}

	fn items(&self) -> [(&'static str, bool); 5] {
		[
			("fit and measurements", self.fit_and_measurements),
			("fabric and color", self.fabric_and_color),
			("stitching and construction", self.stitching_and_construction),
			("trims and labels", self.trims_and_labels),
			("overall finish", self.overall_finish),
		]
	}

	/// Names of the criteria still unchecked, in checklist order.
	pub fn missing(&self) -> Vec<&'static str> {
		self.items()
			.into_iter()
			.filter(|(_, checked)| !checked)
			.map(|(name, _)| name)
			.collect()
	}

	pub fn is_complete(&self) -> bool {
		self.missing().is_empty()
	}
}

/// Four-item checklist gating quality-control approval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QcChecklist {
	pub measurement_accuracy: bool,
	pub stitch_quality: bool,
	pub fabric_defects: bool,
	pub color_consistency: bool,
}

impl QcChecklist {
	pub fn all_checked() -> Self {
		Self {
			measurement_accuracy: true,
			stitch_quality: true,
			fabric_defects: true,
			color_consistency: true,
		}
	}

	pub fn missing(&self) -> Vec<&'static str> {
		[
			("measurement accuracy", self.measurement_accuracy),
			("stitch quality", self.stitch_quality),
			("fabric defects", self.fabric_defects),
			("color consistency", self.color_consistency),
		]
		.into_iter()
		.filter(|(_, checked)| !checked)
		.map(|(name, _)| name)
		.collect()
	}

	pub fn is_complete(&self) -> bool {
		self.missing().is_empty()
	}
}
