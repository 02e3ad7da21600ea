//! Match request endpoints.

use super::{store_error, RequestActor};
use crate::server::AppState;
use atelier_types::{
	APIError, ManufacturerMatch, MatchListResponse, SendMatchRequestsRequest,
	UpdateMatchStatusRequest,
};
use axum::{
	extract::{Path, State},
	response::Json,
};
use tracing::info;

/// Handles POST /api/designs/{id}/matches.
///
/// Scores the selected manufacturers and records a pending match for each.
pub async fn send_requests(
	State(state): State<AppState>,
	RequestActor(actor): RequestActor,
	Path(design_id): Path<String>,
	Json(request): Json<SendMatchRequestsRequest>,
) -> Result<Json<MatchListResponse>, APIError> {
	let matches = state
		.store()
		.send_requests(
			&actor,
			&design_id,
			&request.manufacturer_ids,
			&request.requirements,
		)
		.await
		.map_err(store_error)?;
	info!(design_id = %design_id, count = matches.len(), "Match requests accepted");
	Ok(Json(MatchListResponse { matches }))
}

/// Handles GET /api/designs/{id}/matches, best score first.
///
/// The owning designer sees every match; a requested manufacturer sees its own.
pub async fn list_matches(
	State(state): State<AppState>,
	RequestActor(actor): RequestActor,
	Path(design_id): Path<String>,
) -> Result<Json<MatchListResponse>, APIError> {
	let matches = state
		.store()
		.list_matches_for(&actor, &design_id)
		.await
		.map_err(store_error)?;
	Ok(Json(MatchListResponse { matches }))
}

/// Handles GET /api/matches, the calling manufacturer's requests across designs.
pub async fn list_incoming(
	State(state): State<AppState>,
	RequestActor(actor): RequestActor,
) -> Result<Json<MatchListResponse>, APIError> {
	let matches = state
		.store()
		.list_matches_for_manufacturer(&actor)
		.await
		.map_err(store_error)?;
	Ok(Json(MatchListResponse { matches }))
}

/// Handles POST /api/matches/{id}/status.
pub async fn update_status(
	State(state): State<AppState>,
	RequestActor(actor): RequestActor,
	Path(match_id): Path<String>,
	Json(request): Json<UpdateMatchStatusRequest>,
) -> Result<Json<ManufacturerMatch>, APIError> {
	let record = state
		.store()
		.update_match_status(&actor, &match_id, request.status)
		.await
		.map_err(store_error)?;
	Ok(Json(record))
}
