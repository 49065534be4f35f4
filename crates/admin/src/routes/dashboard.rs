//! Dashboard route handlers.

use askama::Template;
use axum::{Json, Router, response::Html, routing::get};

use crate::{middleware::auth::RequireAdminAuth, models::CurrentAdmin, state::AppState};

/// Signed-in administrator as shown in the page header.
#[derive(Debug, Clone)]
pub struct AdminView {
    pub phone: String,
    pub email: Option<String>,
}

impl From<&CurrentAdmin> for AdminView {
    fn from(admin: &CurrentAdmin) -> Self {
        Self {
            phone: admin.phone.to_string(),
            email: admin.email.clone().filter(|e| !e.is_empty()),
        }
    }
}

/// Dashboard page template.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub admin: AdminView,
}

/// Build the dashboard router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/api/session", get(session_info))
}

/// Dashboard page handler.
///
/// GET /dashboard
async fn dashboard(RequireAdminAuth(admin): RequireAdminAuth) -> Html<String> {
    let template = DashboardTemplate {
        admin: AdminView::from(&admin),
    };

    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {}", e);
        "Internal Server Error".to_string()
    }))
}

/// Session snapshot as JSON.
///
/// GET /api/session
async fn session_info(RequireAdminAuth(admin): RequireAdminAuth) -> Json<CurrentAdmin> {
    Json(admin)
}
