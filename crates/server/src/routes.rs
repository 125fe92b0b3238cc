use axum::{
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;

use common::types::Health;

use crate::openapi::ApiDoc;
use crate::state::ServerState;

pub mod contacts;
pub mod cpc;

#[utoipa::path(get, path = "/health", tag = "system", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn metrics() -> (StatusCode, String) {
    common::metrics::encode_metrics()
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the full application router
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    let system = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/api-docs/openapi.json", get(openapi_json));

    let contact_routes = Router::new()
        .route("/contacts", get(contacts::list).post(contacts::upsert))
        .route(
            "/contacts/:id",
            get(contacts::get_by_id).patch(contacts::update_by_id).delete(contacts::remove_by_id),
        )
        .route(
            "/contacts/phone/:phone",
            get(contacts::get_by_phone).patch(contacts::update_by_phone),
        );

    let cpc_routes = Router::new()
        .route("/cpc/validate-contract", post(cpc::validate_contract))
        .route("/cpc/check-acionamento", post(cpc::check_acionamento))
        .route("/cpc/register-acionamento", post(cpc::register_acionamento))
        .route("/cpc/can-contact", post(cpc::can_contact));

    system
        .merge(contact_routes)
        .merge(cpc_routes)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                .on_response(DefaultOnResponse::new().level(Level::INFO))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
