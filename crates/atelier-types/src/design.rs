//! Designs, manufacturer profiles and matching requirements.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A garment concept owned by a designer.
///
/// Designs are never deleted; a new design supersedes an old one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Design {
	/// Unique identifier for this design.
	pub id: String,
	/// Identifier of the owning designer.
	pub designer_id: String,
	/// Display name.
	pub name: String,
	/// Garment category (e.g. "t-shirts").
	pub category: String,
	/// Free-text mirror of the furthest stage reached, for display only.
	#[serde(default)]
	pub status: String,
	/// Reference to the attached tech-pack document, if any.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub tech_pack_ref: Option<String>,
	/// Timestamp when this design was created.
	pub created_at: DateTime<Utc>,
}

/// Manufacturer profile used for match scoring.
///
/// Opaque to the workflow itself; only the scorer reads these attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManufacturerProfile {
	pub id: String,
	pub name: String,
	#[serde(default)]
	pub location: String,
	#[serde(default)]
	pub categories: Vec<String>,
	/// Minimum order quantity.
	#[serde(default)]
	pub moq: u32,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub max_capacity: Option<u32>,
	/// Typical lead time in days.
	#[serde(default)]
	pub lead_time_days: u32,
	/// Price range text such as `"$15-$30 per unit"`.
	#[serde(default)]
	pub price_range: String,
	/// Rating out of 5.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub rating: Option<f64>,
	#[serde(default)]
	pub certifications: Vec<String>,
}

/// What a designer asks for when requesting manufacturers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignRequirements {
	pub quantity: u32,
	/// Lead-time bucket in weeks: "1-3", "4-6", "7-10" or "10+".
	pub lead_time: String,
	/// Country, city, region name, or "any".
	pub location: String,
	/// Price tier text compared verbatim when no explicit bounds are given.
	pub price_range: String,
	pub categories: Vec<String>,
	pub min_price: Option<u32>,
	pub max_price: Option<u32>,
	/// When set, non-matching candidates are pushed to the bottom.
	pub strict: bool,
}
