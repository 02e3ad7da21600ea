//! Design and manufacturer endpoints.

use super::{require_role, store_error, RequestActor};
use crate::server::AppState;
use atelier_types::{
	APIError, AttachTechPackRequest, CreateDesignRequest, Design, DesignListResponse,
	ManufacturerProfile, Role,
};
use axum::{
	extract::{Path, State},
	http::StatusCode,
	response::Json,
};

/// Handles POST /api/designs.
pub async fn create_design(
	State(state): State<AppState>,
	RequestActor(actor): RequestActor,
	Json(request): Json<CreateDesignRequest>,
) -> Result<(StatusCode, Json<Design>), APIError> {
	require_role(&actor, Role::Designer)?;
	let design = state
		.store()
		.create_design(&actor.id, request)
		.await
		.map_err(store_error)?;
	Ok((StatusCode::CREATED, Json(design)))
}

/// Handles GET /api/designs, the caller's own designs.
pub async fn list_designs(
	State(state): State<AppState>,
	RequestActor(actor): RequestActor,
) -> Result<Json<DesignListResponse>, APIError> {
	let designs = state
		.store()
		.list_designs_for_designer(&actor)
		.await
		.map_err(store_error)?;
	Ok(Json(DesignListResponse { designs }))
}

/// Handles GET /api/designs/{id}.
pub async fn get_design(
	State(state): State<AppState>,
	RequestActor(_actor): RequestActor,
	Path(id): Path<String>,
) -> Result<Json<Design>, APIError> {
	let design = state.store().read_design(&id).await.map_err(store_error)?;
	Ok(Json(design))
}

/// Handles PUT /api/designs/{id}/tech-pack.
pub async fn attach_tech_pack(
	State(state): State<AppState>,
	RequestActor(actor): RequestActor,
	Path(id): Path<String>,
	Json(request): Json<AttachTechPackRequest>,
) -> Result<Json<Design>, APIError> {
	let design = state
		.store()
		.attach_tech_pack(&actor, &id, &request.tech_pack_ref)
		.await
		.map_err(store_error)?;
	Ok(Json(design))
}

/// Handles POST /api/manufacturers.
///
/// A manufacturer registers or replaces its own profile.
pub async fn register_manufacturer(
	State(state): State<AppState>,
	RequestActor(actor): RequestActor,
	Json(profile): Json<ManufacturerProfile>,
) -> Result<(StatusCode, Json<ManufacturerProfile>), APIError> {
	require_role(&actor, Role::Manufacturer)?;
	if profile.id != actor.id {
		return Err(APIError::Forbidden {
			error_type: "FORBIDDEN".into(),
			message: "a manufacturer may only register its own profile".into(),
		});
	}
	let profile = state
		.store()
		.register_manufacturer(profile)
		.await
		.map_err(store_error)?;
	Ok((StatusCode::CREATED, Json(profile)))
}
