//! Handlers for the Atelier HTTP API.
//!
//! Every handler names its caller through the `x-actor-role` and `x-actor-id`
//! headers and maps store failures onto [`APIError`].

pub mod designs;
pub mod events;
pub mod matches;
pub mod messages;
pub mod orders;

use atelier_core::StoreError;
use atelier_types::{APIError, Actor, Role};
use axum::{extract::FromRequestParts, http::request::Parts};

pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";
pub const ACTOR_ID_HEADER: &str = "x-actor-id";

/// The calling actor, read from the request headers.
#[derive(Debug, Clone)]
pub struct RequestActor(pub Actor);

impl<S> FromRequestParts<S> for RequestActor
where
	S: Send + Sync,
{
	type Rejection = APIError;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		let role = header(parts, ACTOR_ROLE_HEADER)
			.ok_or_else(|| missing_actor(ACTOR_ROLE_HEADER))?
			.parse::<Role>()
			.map_err(|e| APIError::BadRequest {
				error_type: "INVALID_ACTOR".into(),
				message: e,
				details: None,
			})?;
		let id = header(parts, ACTOR_ID_HEADER).ok_or_else(|| missing_actor(ACTOR_ID_HEADER))?;

		Ok(RequestActor(Actor {
			role,
			id: id.to_string(),
		}))
	}
}

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
	parts
		.headers
		.get(name)
		.and_then(|value| value.to_str().ok())
		.map(str::trim)
		.filter(|value| !value.is_empty())
}

fn missing_actor(header: &str) -> APIError {
	APIError::BadRequest {
		error_type: "MISSING_ACTOR".into(),
		message: format!("missing {} header", header),
		details: None,
	}
}

/// Rejects callers acting in the wrong role for an endpoint.
pub fn require_role(actor: &Actor, role: Role) -> Result<(), APIError> {
	if actor.role == role {
		Ok(())
	} else {
		Err(APIError::Forbidden {
			error_type: "WRONG_ROLE".into(),
			message: format!("only a {} may do this", role),
		})
	}
}

pub fn bad_request(message: impl Into<String>) -> APIError {
	APIError::BadRequest {
		error_type: "VALIDATION_ERROR".into(),
		message: message.into(),
		details: None,
	}
}

/// Maps a store failure onto its HTTP error.
pub fn store_error(err: StoreError) -> APIError {
	let message = err.to_string();
	match err {
		StoreError::Validation(_) => bad_request(message),
		StoreError::Gate(denied) => APIError::Conflict {
			error_type: "GATE_DENIED".into(),
			message,
			details: Some(serde_json::json!({ "stage": denied.stage })),
		},
		StoreError::InvalidTransition(_) => APIError::Conflict {
			error_type: "INVALID_TRANSITION".into(),
			message,
			details: None,
		},
		StoreError::Ownership(_) => APIError::Forbidden {
			error_type: "FORBIDDEN".into(),
			message,
		},
		StoreError::Resolve(_) => APIError::Forbidden {
			error_type: "NOT_ELIGIBLE".into(),
			message,
		},
		StoreError::NotFound(_) => APIError::NotFound {
			error_type: "NOT_FOUND".into(),
			message,
		},
		StoreError::Storage(_) => {
			tracing::warn!(error = %message, "Storage failure");
			APIError::ServiceUnavailable {
				error_type: "STORAGE_UNAVAILABLE".into(),
				message,
			}
		},
	}
}
