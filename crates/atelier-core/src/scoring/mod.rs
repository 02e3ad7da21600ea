//! Manufacturer match scoring.
//!
//! A score in `[0, 100]` computed once when a match request is created. The
//! workflow never reads it; it only orders the candidates shown to the
//! designer.

mod regions;

use atelier_types::{DesignRequirements, ManufacturerProfile};

const CATEGORY_WEIGHT: f64 = 0.40;
const QUANTITY_WEIGHT: f64 = 0.20;
const LOCATION_WEIGHT: f64 = 0.20;
const PRICE_WEIGHT: f64 = 0.10;
const LEAD_TIME_WEIGHT: f64 = 0.05;
const RATING_WEIGHT: f64 = 0.05;

/// Deterministic scoring of a manufacturer against a design's requirements.
pub trait ManufacturerScorer: Send + Sync {
	/// Returns a score in `[0, 100]`.
	fn score(&self, requirements: &DesignRequirements, profile: &ManufacturerProfile) -> f64;
}

/// Weighted blend of category, quantity, location, price, lead time and rating.
///
/// With `strict` set, a candidate failing the quantity, location or price
/// filter is scored down hard instead of mildly.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedScorer {
	pub strict: bool,
}

impl WeightedScorer {
	pub fn new(strict: bool) -> Self {
		Self { strict }
	}
}

impl ManufacturerScorer for WeightedScorer {
	fn score(&self, requirements: &DesignRequirements, profile: &ManufacturerProfile) -> f64 {
		let strict = self.strict || requirements.strict;

		let category = category_score(&requirements.categories, &profile.categories);
		let quantity = quantity_score(requirements.quantity, profile, strict);
		let location = if location_matches(&requirements.location, &profile.location) {
			100.0
		} else if strict {
			5.0
		} else {
			40.0
		};
		let price = price_score(requirements, &profile.price_range, strict);
		let lead_time = lead_time_score(&requirements.lead_time, profile.lead_time_days);
		let rating = match profile.rating {
			Some(r) if r > 0.0 => (r / 5.0 * 100.0).min(100.0),
			_ => 50.0,
		};

		let total = CATEGORY_WEIGHT * category
			+ QUANTITY_WEIGHT * quantity
			+ LOCATION_WEIGHT * location
			+ PRICE_WEIGHT * price
			+ LEAD_TIME_WEIGHT * lead_time
			+ RATING_WEIGHT * rating;

		tracing::debug!(
			manufacturer_id = %profile.id,
			category,
			quantity,
			location,
			price,
			lead_time,
			rating,
			total,
			"Scored manufacturer"
		);

		total.round().clamp(0.0, 100.0)
	}
}

fn category_score(wanted: &[String], offered: &[String]) -> f64 {
	if wanted.is_empty() || offered.is_empty() {
		return 0.0;
	}
	let matched = wanted
		.iter()
		.filter(|w| offered.iter().any(|o| o.eq_ignore_ascii_case(w)))
		.count();
	matched as f64 / wanted.len() as f64 * 100.0
}

fn quantity_score(quantity: u32, profile: &ManufacturerProfile, strict: bool) -> f64 {
	let penalize = |raw: f64| if strict { raw.min(10.0) } else { raw };
	if quantity == 0 {
		return 50.0;
	}
	if quantity < profile.moq {
		return penalize(f64::from(quantity) / f64::from(profile.moq) * 100.0);
	}
	match profile.max_capacity {
		Some(cap) if cap > 0 && quantity > cap => {
			penalize(f64::from(cap) / f64::from(quantity) * 100.0)
		},
		_ => 100.0,
	}
}

/// Matches a wanted location against a manufacturer's.
///
/// An empty or `any` location matches everything. A region name matches any
/// country or city inside it; otherwise either string containing the other
/// counts.
pub fn location_matches(wanted: &str, actual: &str) -> bool {
	let wanted = wanted.trim().to_lowercase();
	let actual = actual.trim().to_lowercase();

	if wanted.is_empty() || wanted == "any" || wanted == actual {
		return true;
	}
	if let Some(places) = regions::places(&wanted) {
		return places
			.iter()
			.any(|place| actual.contains(place) || place.contains(actual.as_str()));
	}
	actual.contains(wanted.as_str()) || wanted.contains(actual.as_str())
}

fn price_score(requirements: &DesignRequirements, price_range: &str, strict: bool) -> f64 {
	if requirements.min_price.is_none() && requirements.max_price.is_none() {
		return if !price_range.is_empty() && price_range == requirements.price_range {
			100.0
		} else {
			50.0
		};
	}
	let Some((low, high)) = parse_price_range(price_range) else {
		return 50.0;
	};
	let user_min = requirements.min_price.map(f64::from).unwrap_or(0.0);
	let user_max = requirements.max_price.map(f64::from).unwrap_or(f64::INFINITY);

	if low >= user_min && high <= user_max {
		100.0
	} else if low <= user_max && high >= user_min {
		let overlap = high.min(user_max) - low.max(user_min);
		// An open-ended budget makes any partial overlap negligible
		let span = user_max - user_min;
		let span = if span == 0.0 { 1.0 } else { span };
		(overlap / span * 100.0).clamp(0.0, 100.0)
	} else if strict {
		10.0
	} else {
		30.0
	}
}

/// Extracts the first `$low-$high` pair from text like `"$15-$30 per unit"`.
pub fn parse_price_range(text: &str) -> Option<(f64, f64)> {
	let mut rest = text;
	while let Some(start) = rest.find('$') {
		rest = &rest[start + 1..];
		let (low, after_low) = leading_digits(rest);
		if let Some(tail) = after_low.strip_prefix("-$") {
			let (high, _) = leading_digits(tail);
			if let (Some(low), Some(high)) = (low, high) {
				return Some((low, high));
			}
		}
	}
	None
}

fn leading_digits(text: &str) -> (Option<f64>, &str) {
	let end = text
		.find(|c: char| !c.is_ascii_digit())
		.unwrap_or(text.len());
	let value = text[..end].parse::<u64>().ok().map(|v| v as f64);
	(value, &text[end..])
}

fn lead_time_score(bucket: &str, days: u32) -> f64 {
	let (min, max) = match bucket {
		"1-3" => (7, 21),
		"4-6" => (28, 42),
		"7-10" => (49, 70),
		"10+" => (70, 365),
		_ => (0, 365),
	};
	if (min..=max).contains(&days) {
		100.0
	} else if days > max {
		f64::from(max) / f64::from(days) * 100.0
	} else {
		0.0
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn profile() -> ManufacturerProfile {
		ManufacturerProfile {
			id: "mfr-a".into(),
			name: "Dhaka Knits".into(),
			location: "Dhaka, Bangladesh".into(),
			categories: vec!["T-Shirts".into(), "Hoodies".into()],
			moq: 100,
			max_capacity: Some(5000),
			lead_time_days: 35,
			price_range: "$15-$30 per unit".into(),
			rating: Some(4.0),
			certifications: vec![],
		}
	}

	fn requirements() -> DesignRequirements {
		DesignRequirements {
			quantity: 500,
			lead_time: "4-6".into(),
			location: "asia".into(),
			price_range: String::new(),
			categories: vec!["t-shirts".into()],
			min_price: Some(10),
			max_price: Some(40),
			strict: false,
		}
	}

	#[test]
	fn test_perfect_candidate() {
		// 40 + 20 + 20 + 10 + 5 + 4
		let score = WeightedScorer::default().score(&requirements(), &profile());
		assert_eq!(score, 99.0);
	}

	#[test]
	fn test_score_is_deterministic_and_bounded() {
		let scorer = WeightedScorer::new(true);
		let mut reqs = requirements();
		reqs.quantity = 10;
		reqs.location = "europe".into();
		let a = scorer.score(&reqs, &profile());
		let b = scorer.score(&reqs, &profile());
		assert_eq!(a, b);
		assert!((0.0..=100.0).contains(&a));
	}

	#[test]
	fn test_strict_mode_penalizes_harder() {
		let mut reqs = requirements();
		reqs.quantity = 50;
		reqs.location = "south america".into();
		let lenient = WeightedScorer::new(false).score(&reqs, &profile());
		let strict = WeightedScorer::new(true).score(&reqs, &profile());
		assert!(strict < lenient);

		reqs.strict = true;
		assert_eq!(WeightedScorer::new(false).score(&reqs, &profile()), strict);
	}

	#[test]
	fn test_location_matching() {
		assert!(location_matches("any", "Lagos"));
		assert!(location_matches("", "Lagos"));
		assert!(location_matches("africa", "Lagos, Nigeria"));
		assert!(location_matches("Europe", "Porto, Portugal"));
		assert!(!location_matches("europe", "Dhaka, Bangladesh"));
		assert!(location_matches("portugal", "Porto, Portugal"));
		assert!(!location_matches("portugal", "Dhaka"));
	}

	#[test]
	fn test_price_range_parsing() {
		assert_eq!(parse_price_range("$15-$30 per unit"), Some((15.0, 30.0)));
		assert_eq!(parse_price_range("from $8-$12"), Some((8.0, 12.0)));
		assert_eq!(parse_price_range("$15 - $30"), None);
		assert_eq!(parse_price_range("budget"), None);
	}

	#[test]
	fn test_partial_price_overlap() {
		let mut reqs = requirements();
		reqs.min_price = Some(20);
		reqs.max_price = Some(40);
		// overlap 20..30 of a 20..40 budget
		assert_eq!(price_score(&reqs, "$15-$30", false), 50.0);

		reqs.min_price = Some(50);
		reqs.max_price = None;
		assert_eq!(price_score(&reqs, "$15-$30", false), 30.0);
		assert_eq!(price_score(&reqs, "$15-$30", true), 10.0);
	}

	#[test]
	fn test_lead_time_buckets() {
		assert_eq!(lead_time_score("4-6", 35), 100.0);
		assert_eq!(lead_time_score("1-3", 42), 50.0);
		assert_eq!(lead_time_score("7-10", 20), 0.0);
		assert_eq!(lead_time_score("unknown", 100), 100.0);
	}

	#[test]
	fn test_categories_require_both_sides() {
		assert_eq!(category_score(&[], &["tees".into()]), 0.0);
		assert_eq!(
			category_score(&["tees".into(), "denim".into()], &["TEES".into()]),
			50.0
		);
	}
}
