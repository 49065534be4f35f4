//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (administrator store reachable)
//!
//! GET  /                       - Redirect to /dashboard or /login
//!
//! # Auth
//! GET  /login                  - Login page (?reason=stale shows a notice)
//! POST /login                  - Phone + password login
//! GET  /register               - Registration page (first administrator only)
//! POST /register               - Create the administrator and sign in
//! GET  /logout, POST /logout   - Logout
//!
//! # Protected
//! GET  /dashboard              - Landing page
//! GET  /api/session            - Current session snapshot (JSON)
//! ```

pub mod auth;
pub mod dashboard;

use askama::Template;
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};

use crate::middleware::{LOGIN_PATH, OptionalAdminAuth};
use crate::state::AppState;

/// Landing page for signed-in administrators.
pub const DASHBOARD_PATH: &str = "/dashboard";

/// Error page template.
#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate {
    status: u16,
    message: &'static str,
}

/// Build the admin router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .route("/", get(index))
        .merge(auth::router())
        .merge(dashboard::router())
        .fallback(not_found)
}

/// GET /
async fn index(OptionalAdminAuth(admin): OptionalAdminAuth) -> Redirect {
    if admin.is_some() {
        Redirect::to(DASHBOARD_PATH)
    } else {
        Redirect::to(LOGIN_PATH)
    }
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the administrator store is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().count().await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

async fn not_found() -> Response {
    let template = ErrorTemplate {
        status: 404,
        message: "Page not found",
    };

    let body = template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {}", e);
        "Page not found".to_string()
    });

    (StatusCode::NOT_FOUND, Html(body)).into_response()
}
