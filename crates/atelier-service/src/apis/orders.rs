//! Order endpoints.
//!
//! The order record is shared by both actors. A PATCH body carries only the
//! fields of the caller's role; a field owned by the other role is a
//! validation error, never silently dropped.

use super::{bad_request, store_error, RequestActor};
use crate::server::AppState;
use atelier_types::{
	APIError, AdvanceRequest, AdvanceResponse, CreateOrderRequest, Order, OrderListResponse,
	OrderPatch, Role, StageResponse,
};
use axum::{
	extract::{Path, State},
	http::StatusCode,
	response::Json,
};
use serde_json::Value;
use tracing::warn;

/// Handles POST /api/orders.
///
/// Returns the existing order when the design already has one.
pub async fn create_order(
	State(state): State<AppState>,
	RequestActor(actor): RequestActor,
	Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), APIError> {
	let order = state
		.store()
		.create_order(&actor, &request.design_id, request.quantity)
		.await
		.map_err(store_error)?;
	Ok((StatusCode::CREATED, Json(order)))
}

/// Handles GET /api/orders.
///
/// A designer gets the orders of its designs; a manufacturer gets the orders
/// it is bound to.
pub async fn list_orders(
	State(state): State<AppState>,
	RequestActor(actor): RequestActor,
) -> Result<Json<OrderListResponse>, APIError> {
	let store = state.store();
	let orders = match actor.role {
		Role::Designer => store.list_orders_for_designer(&actor).await,
		Role::Manufacturer => store.list_orders_for_manufacturer(&actor).await,
	}
	.map_err(store_error)?;
	Ok(Json(OrderListResponse { orders }))
}

/// Handles GET /api/orders/{id}.
pub async fn get_order(
	State(state): State<AppState>,
	RequestActor(actor): RequestActor,
	Path(id): Path<String>,
) -> Result<Json<Order>, APIError> {
	let store = state.store();
	// Resolving doubles as the visibility check for both roles
	store.resolve(&actor, &id).await.map_err(store_error)?;
	let order = store.read_order(&id).await.map_err(store_error)?;
	Ok(Json(order))
}

/// Handles PATCH /api/orders/{id}.
pub async fn patch_order(
	State(state): State<AppState>,
	RequestActor(actor): RequestActor,
	Path(id): Path<String>,
	Json(fields): Json<Value>,
) -> Result<Json<Order>, APIError> {
	let patch = OrderPatch::from_fields(actor.role, fields).map_err(|e| {
		warn!(order_id = %id, role = %actor.role, error = %e, "Malformed order patch");
		bad_request(format!("invalid {} fields: {}", actor.role, e))
	})?;
	let order = state
		.store()
		.write_order_fields(&actor, &id, patch)
		.await
		.map_err(store_error)?;
	Ok(Json(order))
}

/// Handles GET /api/orders/{id}/stage.
pub async fn get_stage(
	State(state): State<AppState>,
	RequestActor(actor): RequestActor,
	Path(id): Path<String>,
) -> Result<Json<StageResponse>, APIError> {
	let resolution = state
		.store()
		.resolve(&actor, &id)
		.await
		.map_err(store_error)?;
	Ok(Json(StageResponse {
		order_id: id,
		resolution,
	}))
}

/// Handles POST /api/orders/{id}/advance.
///
/// Checks whether the caller may leave the named stage. Nothing is written.
pub async fn advance(
	State(state): State<AppState>,
	RequestActor(actor): RequestActor,
	Path(id): Path<String>,
	Json(request): Json<AdvanceRequest>,
) -> Result<Json<AdvanceResponse>, APIError> {
	let (from, to) = state
		.store()
		.check_advance(&actor, &id, &request.stage)
		.await
		.map_err(store_error)?;
	Ok(Json(AdvanceResponse { from, to }))
}
