use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{TraceLayer, DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, DefaultOnFailure},
};
use tracing::{error, Level};
use axum::http::StatusCode;
use axum::middleware;
use utoipa::OpenApi;

use common::types::{Health, Message};

use crate::errors::ApiError;
use crate::openapi::ApiDoc;
use crate::state::AppState;

pub mod contacts;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "Process is up", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Liveness of the process and its database.
#[utoipa::path(
    get, path = "/api/healthchecker", tag = "health",
    responses(
        (status = 200, description = "Database reachable", body = crate::openapi::MessageDoc),
        (status = 500, description = "Database unreachable", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn healthchecker(State(state): State<AppState>) -> Result<Json<Message>, ApiError> {
    state.contacts.health().await.map_err(|e| {
        error!(error = %e, "healthcheck failed");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Error connecting to the database")
    })?;
    Ok(Json(Message::new("Contact book API is up and the database is reachable")))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// `/contacts` CRUD plus the database health check; nested under `/api`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/contacts", get(contacts::list).post(contacts::create))
        .route(
            "/contacts/:id",
            get(contacts::get).put(contacts::update).delete(contacts::delete),
        )
        .route("/healthchecker", get(healthchecker))
}

/// Build the full application router
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api-docs/openapi.json", get(openapi_json))
        .nest("/api", api_routes())
        .with_state(state)
        .layer(middleware::from_fn(crate::middleware::process_time))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // one INFO span per request with method and path
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(
                    DefaultOnRequest::new()
                        .level(Level::INFO),
                )
                // status and latency
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                // 5xx and friends
                .on_failure(
                    DefaultOnFailure::new()
                        .level(Level::ERROR),
                )
        )
}
