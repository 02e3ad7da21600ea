//! String formatting utilities.
//!
//! Provides helpers that keep identifiers short in log lines.

/// Truncates an identifier for display purposes.
///
/// Shows only the first 8 characters followed by ".." for longer strings.
pub fn truncate_id(id: &str) -> String {
	match id.char_indices().nth(8) {
		Some((idx, _)) => format!("{}..", &id[..idx]),
		None => id.to_string(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_short_ids_are_untouched() {
		assert_eq!(truncate_id("ord-1"), "ord-1");
		assert_eq!(truncate_id("12345678"), "12345678");
	}

	#[test]
	fn test_long_ids_are_truncated() {
		assert_eq!(
			truncate_id("0192f1a4-7d4e-7a51-9c1b-2f0f6e1d9a10"),
			"0192f1a4.."
		);
	}
}
