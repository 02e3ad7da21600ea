//! Actor roles.
//!
//! Two independent parties act on every order: the designer who owns the
//! design and the manufacturer producing it. Each order field has exactly one
//! writer role, so the role is carried on every write.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The two actor roles in the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
	/// Owns the design, approves manufacturer submissions.
	Designer,
	/// Accepts match requests, submits production artifacts.
	Manufacturer,
}

impl Role {
	/// Returns the string representation of the role.
	pub fn as_str(&self) -> &'static str {
		match self {
			Role::Designer => "designer",
			Role::Manufacturer => "manufacturer",
		}
	}

	/// Returns the opposite role.
	pub fn counterparty(&self) -> Role {
		match self {
			Role::Designer => Role::Manufacturer,
			Role::Manufacturer => Role::Designer,
		}
	}
}

impl fmt::Display for Role {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Role {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"designer" => Ok(Role::Designer),
			"manufacturer" => Ok(Role::Manufacturer),
			other => Err(format!("unknown role '{}'", other)),
		}
	}
}

/// An authenticated actor: a role plus the identifier of the acting party.
///
/// For designers the id is the designer's user id; for manufacturers it is
/// the manufacturer profile id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
	pub role: Role,
	pub id: String,
}

impl Actor {
	pub fn designer(id: impl Into<String>) -> Self {
		Self {
			role: Role::Designer,
			id: id.into(),
		}
	}

	pub fn manufacturer(id: impl Into<String>) -> Self {
		Self {
			role: Role::Manufacturer,
			id: id.into(),
		}
	}
}
