//! Order message endpoints.

use super::{store_error, RequestActor};
use crate::server::AppState;
use atelier_types::{APIError, AppendMessageRequest, Message};
use axum::{
	extract::{Path, State},
	http::StatusCode,
	response::Json,
};

/// Handles GET /api/orders/{id}/messages.
pub async fn list_messages(
	State(state): State<AppState>,
	RequestActor(actor): RequestActor,
	Path(id): Path<String>,
) -> Result<Json<Vec<Message>>, APIError> {
	let store = state.store();
	store.resolve(&actor, &id).await.map_err(store_error)?;
	let messages = store.list_messages(&id).await.map_err(store_error)?;
	Ok(Json(messages))
}

/// Handles POST /api/orders/{id}/messages.
pub async fn append_message(
	State(state): State<AppState>,
	RequestActor(actor): RequestActor,
	Path(id): Path<String>,
	Json(request): Json<AppendMessageRequest>,
) -> Result<(StatusCode, Json<Message>), APIError> {
	let message = state
		.store()
		.append_message(&id, &actor, &request.content, request.attachments)
		.await
		.map_err(store_error)?;
	Ok((StatusCode::CREATED, Json(message)))
}
