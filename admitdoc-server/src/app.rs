use std::sync::Arc;

use axum::{
    extract::Extension,
    response::IntoResponse,
    routing::{get, post},
    Router,
};

use crate::state::AppState;

/// Build the primary axum router with the provided shared application state.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/records", post(crate::handlers::records::create::create))
        .route(
            "/records/{id}",
            get(crate::handlers::records::get::get_record)
                .put(crate::handlers::records::update::update),
        )
        .route(
            "/records/{id}/document",
            get(crate::handlers::documents::download::download),
        )
        .route(
            "/records/{id}/document/status",
            get(crate::handlers::documents::status::status),
        )
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .layer(Extension(state))
}

async fn health_handler() -> impl IntoResponse {
    // Liveness: always return 200 OK when process is alive.
    (axum::http::StatusCode::OK, "OK")
}

async fn ready_handler(
    Extension(_state): Extension<Arc<AppState>>,
) -> impl IntoResponse {
    // Readiness: the router is only built once the pipeline and the record
    // store are wired, so reaching this handler means we can serve.
    (axum::http::StatusCode::OK, "OK")
}
