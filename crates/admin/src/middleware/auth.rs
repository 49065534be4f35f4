//! Authentication middleware and extractors for admin.
//!
//! The session holds a [`CurrentAdmin`] snapshot taken at login. Every guarded
//! request re-checks that the snapshot's id still exists in the store; a
//! snapshot pointing at a deleted administrator is revoked on the spot.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;
use tower_sessions::{
    Expiry, Session,
    cookie::time::{Duration, OffsetDateTime},
};

use crate::db::AdministratorStore;
use crate::models::{Administrator, CurrentAdmin, session_keys};
use crate::services::AuthError;
use crate::state::AppState;

/// Login page.
pub const LOGIN_PATH: &str = "/login";

/// Login page with the "session no longer valid" notice.
pub const STALE_LOGIN_PATH: &str = "/login?reason=stale";

// =============================================================================
// Session lifecycle
// =============================================================================

/// Resolve the session to the administrator it was issued for.
///
/// Costs one store lookup when a snapshot is present. The returned value is
/// the session snapshot, not a fresh read of the record.
///
/// # Errors
///
/// - `Unauthenticated` if the session carries no snapshot
/// - `StaleSession` if the administrator was deleted; the session has been
///   flushed by the time this is returned
/// - `Repository` / `Session` if the store or session backend failed
pub async fn guard(
    session: &Session,
    store: &dyn AdministratorStore,
) -> Result<CurrentAdmin, AuthError> {
    let Some(admin) = session
        .get::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await?
    else {
        return Err(AuthError::Unauthenticated);
    };

    if store.get_by_id(admin.id).await?.is_none() {
        tracing::warn!(admin_id = %admin.id, "Revoking session of deleted administrator");
        session.flush().await?;
        return Err(AuthError::StaleSession);
    }

    Ok(admin)
}

/// Start an authenticated session for `admin`.
///
/// Issues a fresh session id, stores the snapshot and fixes the expiry at
/// `now + ttl` (activity does not extend it). A `ttl` too large to add to the
/// current time falls back to a browser-session cookie.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn establish_session(
    session: &Session,
    admin: &Administrator,
    ttl: Duration,
) -> Result<CurrentAdmin, tower_sessions::session::Error> {
    session.cycle_id().await?;

    let current = CurrentAdmin::from(admin);
    session
        .insert(session_keys::CURRENT_ADMIN, &current)
        .await?;

    let expiry = OffsetDateTime::now_utc().checked_add(ttl).map_or_else(
        || {
            tracing::warn!(ttl = %ttl, "Session TTL out of range, using browser-session expiry");
            Expiry::OnSessionEnd
        },
        Expiry::AtDateTime,
    );
    session.set_expiry(Some(expiry));

    Ok(current)
}

/// End the session (logout). A no-op for sessions that were never established.
///
/// # Errors
///
/// Returns an error if the session store cannot delete the record.
pub async fn destroy_session(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

// =============================================================================
// Extractors
// =============================================================================

/// Extractor that requires admin authentication.
///
/// HTML routes redirect to the login page; `/api/*` routes get a 401 JSON body.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdminAuth(admin): RequireAdminAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", admin.phone)
/// }
/// ```
pub struct RequireAdminAuth(pub CurrentAdmin);

/// Error returned when admin authentication is required but not satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for API requests).
    Unauthorized,
    /// Redirect to login page with the stale-session notice.
    StaleRedirect,
    /// Unauthorized response naming the stale session (for API requests).
    StaleUnauthorized,
    /// The store or session backend is down.
    Unavailable,
}

impl AdminAuthRejection {
    fn from_auth_error(err: &AuthError, is_api: bool) -> Self {
        match (err, is_api) {
            (AuthError::Unauthenticated, false) => Self::RedirectToLogin,
            (AuthError::Unauthenticated, true) => Self::Unauthorized,
            (AuthError::StaleSession, false) => Self::StaleRedirect,
            (AuthError::StaleSession, true) => Self::StaleUnauthorized,
            _ => Self::Unavailable,
        }
    }
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "unauthenticated" })),
            )
                .into_response(),
            Self::StaleRedirect => Redirect::to(STALE_LOGIN_PATH).into_response(),
            Self::StaleUnauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "stale_session" })),
            )
                .into_response(),
            Self::Unavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Service temporarily unavailable",
            )
                .into_response(),
        }
    }
}

impl FromRequestParts<AppState> for RequireAdminAuth {
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let is_api = parts.uri.path().starts_with("/api/");

        // Get the session from extensions (set by SessionManagerLayer)
        let Some(session) = parts.extensions.get::<Session>().cloned() else {
            tracing::error!("Session layer missing from admin router");
            return Err(AdminAuthRejection::Unavailable);
        };

        match guard(&session, state.store()).await {
            Ok(admin) => Ok(Self(admin)),
            Err(err) => {
                if err.is_internal() {
                    tracing::error!(error = %err, "Session check failed");
                }
                Err(AdminAuthRejection::from_auth_error(&err, is_api))
            }
        }
    }
}

/// Extractor that optionally gets the current admin.
///
/// Unlike `RequireAdminAuth`, this never rejects. Stale sessions are still
/// revoked; backend failures read as "not signed in".
pub struct OptionalAdminAuth(pub Option<CurrentAdmin>);

impl FromRequestParts<AppState> for OptionalAdminAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(session) = parts.extensions.get::<Session>().cloned() else {
            return Ok(Self(None));
        };

        let admin = match guard(&session, state.store()).await {
            Ok(admin) => Some(admin),
            Err(err) => {
                if err.is_internal() {
                    tracing::error!(error = %err, "Session check failed");
                }
                None
            }
        };

        Ok(Self(admin))
    }
}
