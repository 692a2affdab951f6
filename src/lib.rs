//! School registry REST backend: cities, departments, students, teachers, subjects and
//! their enrollments, with filtered, ordered and paginated listings.

pub mod config;
pub mod error;
pub mod handlers;
pub mod openapi;
pub mod query;
pub mod resources;
pub mod response;
pub mod routes;
pub mod schema;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use config::{AppConfig, StoreKind};
pub use error::{AppError, ConfigError};
pub use routes::{common_routes, resource_routes};
pub use schema::{ensure_database_exists, ensure_tables};
pub use service::{ReportService, ResourceService};
pub use state::AppState;
pub use store::{MemoryStore, PgStore, Store};

use axum::{
    http::{header::CONTENT_TYPE, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    Router,
};
use tower_http::limit::RequestBodyLimitLayer;

/// Request bodies above this size are rejected with 413.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// The body limit layer answers oversized requests in plain text; re-wrap them in `ErrorBody`.
async fn json_body_limit(response: Response) -> Response {
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .is_some_and(|v| v.as_bytes().starts_with(b"application/json"));
    if response.status() == StatusCode::PAYLOAD_TOO_LARGE && !is_json {
        return AppError::Rejected {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            message: format!("Request body exceeds {} bytes.", MAX_BODY_BYTES),
        }
        .into_response();
    }
    response
}

/// Full application router over `state`.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(common_routes(state.clone()))
        .merge(resource_routes(state))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(middleware::map_response(json_body_limit))
}
