//! HTTP server for the Atelier API.
//!
//! Routes every workflow operation under `/api` and applies the CORS, timeout
//! and body-size limits from the `[api]` configuration section.

use crate::apis::{designs, events, matches, messages, orders};
use atelier_config::ApiConfig;
use atelier_core::{AtelierEngine, OrderStore};
use axum::{
	extract::{DefaultBodyLimit, State},
	http::HeaderValue,
	response::Json,
	routing::{get, post, put},
	Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
	cors::{AllowOrigin, Any, CorsLayer},
	timeout::TimeoutLayer,
	trace::TraceLayer,
};

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	pub engine: Arc<AtelierEngine>,
}

impl AppState {
	pub fn store(&self) -> &OrderStore {
		self.engine.store()
	}
}

/// Starts the HTTP server and serves until the listener fails.
pub async fn start_server(
	api_config: ApiConfig,
	engine: Arc<AtelierEngine>,
) -> Result<(), Box<dyn std::error::Error>> {
	let app = router(&api_config, AppState { engine });

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Atelier API server starting on {}", bind_address);

	axum::serve(listener, app).await?;

	Ok(())
}

/// Builds the API router with its middleware stack.
pub fn router(api_config: &ApiConfig, state: AppState) -> Router {
	let api = Router::new()
		.route(
			"/designs",
			post(designs::create_design).get(designs::list_designs),
		)
		.route("/designs/{id}", get(designs::get_design))
		.route("/designs/{id}/tech-pack", put(designs::attach_tech_pack))
		.route(
			"/designs/{id}/matches",
			post(matches::send_requests).get(matches::list_matches),
		)
		.route("/manufacturers", post(designs::register_manufacturer))
		.route("/matches", get(matches::list_incoming))
		.route("/matches/{id}/status", post(matches::update_status))
		.route(
			"/orders",
			post(orders::create_order).get(orders::list_orders),
		)
		.route(
			"/orders/{id}",
			get(orders::get_order).patch(orders::patch_order),
		)
		.route("/orders/{id}/stage", get(orders::get_stage))
		.route("/orders/{id}/advance", post(orders::advance))
		.route(
			"/orders/{id}/messages",
			get(messages::list_messages).post(messages::append_message),
		)
		.route("/orders/{id}/events", get(events::order_events));

	Router::new()
		.route("/health", get(health))
		.nest("/api", api)
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(cors_layer(api_config))
				.layer(TimeoutLayer::new(Duration::from_secs(
					api_config.timeout_seconds,
				))),
		)
		.layer(DefaultBodyLimit::max(api_config.max_request_size))
		.with_state(state)
}

fn cors_layer(api_config: &ApiConfig) -> CorsLayer {
	match &api_config.cors {
		Some(cors) => {
			let origins: Vec<HeaderValue> = cors
				.allowed_origins
				.iter()
				.filter_map(|origin| match origin.parse() {
					Ok(value) => Some(value),
					Err(_) => {
						tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
						None
					},
				})
				.collect();
			CorsLayer::new()
				.allow_origin(AllowOrigin::list(origins))
				.allow_methods(Any)
				.allow_headers(Any)
		},
		None => CorsLayer::permissive(),
	}
}

/// Handles GET /health.
async fn health(State(state): State<AppState>) -> Json<Value> {
	Json(json!({
		"status": "ok",
		"service": state.engine.config().service.id,
	}))
}
