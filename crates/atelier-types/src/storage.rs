//! Storage-related types for the workflow system.

use std::str::FromStr;

/// Storage keys for different data collections.
///
/// This enum provides type safety for storage operations by replacing
/// string literals with strongly typed variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
	/// Key for storing design data
	Designs,
	/// Index of designs by owning designer
	DesignsByDesigner,
	/// Key for storing order data
	Orders,
	/// Key for mapping design ids to their order id
	OrderByDesign,
	/// Key for storing manufacturer profiles
	Manufacturers,
	/// Key for storing match records
	Matches,
	/// Key for mapping (design, manufacturer) pairs to match ids
	MatchByPair,
	/// Index of match ids by manufacturer
	MatchesByManufacturer,
	/// Key for storing order messages
	Messages,
}

impl StorageKey {
	/// Returns the string representation of the storage key.
	pub fn as_str(&self) -> &'static str {
		match self {
			StorageKey::Designs => "designs",
			StorageKey::DesignsByDesigner => "designs_by_designer",
			StorageKey::Orders => "orders",
			StorageKey::OrderByDesign => "order_by_design",
			StorageKey::Manufacturers => "manufacturers",
			StorageKey::Matches => "matches",
			StorageKey::MatchByPair => "match_by_pair",
			StorageKey::MatchesByManufacturer => "matches_by_manufacturer",
			StorageKey::Messages => "messages",
		}
	}

	/// Returns an iterator over all StorageKey variants.
	pub fn all() -> impl Iterator<Item = Self> {
		[
			Self::Designs,
			Self::DesignsByDesigner,
			Self::Orders,
			Self::OrderByDesign,
			Self::Manufacturers,
			Self::Matches,
			Self::MatchByPair,
			Self::MatchesByManufacturer,
			Self::Messages,
		]
		.into_iter()
	}
}

impl FromStr for StorageKey {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::all().find(|key| key.as_str() == s).ok_or(())
	}
}

impl From<StorageKey> for &'static str {
	fn from(key: StorageKey) -> Self {
		key.as_str()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_storage_key_round_trip() {
		for key in StorageKey::all() {
			assert_eq!(key.as_str().parse::<StorageKey>(), Ok(key));
		}
		assert!("quotes".parse::<StorageKey>().is_err());
	}
}
