//! API types for the Atelier HTTP API.
//!
//! This module defines the request and response bodies of the workflow
//! endpoints and the structured error type every handler returns.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Design, DesignRequirements, ManufacturerMatch, MatchStatus, Order, Resolution, Stage};

/// Request for creating a design.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDesignRequest {
	pub name: String,
	pub category: String,
	/// Tech-pack reference, if the design was uploaded with one
	#[serde(default)]
	pub tech_pack_ref: Option<String>,
}

/// Request for attaching a tech pack to a design.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachTechPackRequest {
	pub tech_pack_ref: String,
}

/// Request for sending match requests to manufacturers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMatchRequestsRequest {
	/// Manufacturers the designer selected
	pub manufacturer_ids: Vec<String>,
	/// Requirements used to score each candidate
	#[serde(default)]
	pub requirements: DesignRequirements,
}

/// Matches for a design, ranked by score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchListResponse {
	pub matches: Vec<ManufacturerMatch>,
}

/// A designer's designs, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignListResponse {
	pub designs: Vec<Design>,
}

/// Orders the caller takes part in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderListResponse {
	pub orders: Vec<Order>,
}

/// Request for accepting or rejecting a match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateMatchStatusRequest {
	pub status: MatchStatus,
}

/// Request for creating the order of a design.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
	pub design_id: String,
	#[serde(default)]
	pub quantity: Option<u32>,
}

/// Request for checking whether the cursor may leave a stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvanceRequest {
	/// Stage id in the calling role's list
	pub stage: String,
}

/// Result of a successful gate check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvanceResponse {
	pub from: Stage,
	/// The stage the cursor may move to; `None` on the last stage
	pub to: Option<Stage>,
}

/// Stage resolution for the calling actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageResponse {
	pub order_id: String,
	#[serde(flatten)]
	pub resolution: Resolution,
}

/// Request for appending a message to an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppendMessageRequest {
	pub content: String,
	#[serde(default)]
	pub attachments: Vec<String>,
}

/// API error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
	/// Error type/code
	pub error: String,
	/// Human-readable description
	pub message: String,
	/// Additional error context
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<serde_json::Value>,
}

/// Structured API error type with appropriate HTTP status mapping.
#[derive(Debug)]
pub enum APIError {
	/// Bad request with validation errors (400)
	BadRequest {
		error_type: String,
		message: String,
		details: Option<serde_json::Value>,
	},
	/// Acting role does not own the field or value (403)
	Forbidden { error_type: String, message: String },
	/// Unknown design, order, match or manufacturer (404)
	NotFound { error_type: String, message: String },
	/// Transition gate denied the move (409)
	Conflict {
		error_type: String,
		message: String,
		details: Option<serde_json::Value>,
	},
	/// Retryable persistence failure (503)
	ServiceUnavailable { error_type: String, message: String },
	/// Internal server error (500)
	InternalServerError { error_type: String, message: String },
}

impl APIError {
	/// Get the HTTP status code for this error.
	pub fn status_code(&self) -> u16 {
		match self {
			APIError::BadRequest { .. } => 400,
			APIError::Forbidden { .. } => 403,
			APIError::NotFound { .. } => 404,
			APIError::Conflict { .. } => 409,
			APIError::ServiceUnavailable { .. } => 503,
			APIError::InternalServerError { .. } => 500,
		}
	}

	/// Convert to ErrorResponse for JSON serialization.
	pub fn to_error_response(&self) -> ErrorResponse {
		match self {
			APIError::BadRequest { error_type, message, details }
			| APIError::Conflict { error_type, message, details } => ErrorResponse {
				error: error_type.clone(),
				message: message.clone(),
				details: details.clone(),
			},
			APIError::Forbidden { error_type, message }
			| APIError::NotFound { error_type, message }
			| APIError::ServiceUnavailable { error_type, message }
			| APIError::InternalServerError { error_type, message } => ErrorResponse {
				error: error_type.clone(),
				message: message.clone(),
				details: None,
			},
		}
	}
}

impl fmt::Display for APIError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			APIError::BadRequest { message, .. } => write!(f, "Bad Request: {}", message),
			APIError::Forbidden { message, .. } => write!(f, "Forbidden: {}", message),
			APIError::NotFound { message, .. } => write!(f, "Not Found: {}", message),
			APIError::Conflict { message, .. } => write!(f, "Conflict: {}", message),
			APIError::ServiceUnavailable { message, .. } => {
				write!(f, "Service Unavailable: {}", message)
			},
			APIError::InternalServerError { message, .. } => {
				write!(f, "Internal Server Error: {}", message)
			},
		}
	}
}

impl std::error::Error for APIError {}

impl axum::response::IntoResponse for APIError {
	fn into_response(self) -> axum::response::Response {
		use axum::{http::StatusCode, response::Json};

		let status = StatusCode::from_u16(self.status_code())
			.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
		let error_response = self.to_error_response();
		(status, Json(error_response)).into_response()
	}
}
