//! Authentication route handlers for admin.
//!
//! Login, one-time registration and logout. Signed-in visitors are sent
//! straight to the dashboard from the login and registration pages.

use askama::Template;
use axum::{
    Form, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::error::{AppError, clear_sentry_user, report, set_sentry_user};
use crate::middleware::{OptionalAdminAuth, destroy_session, establish_session};
use crate::models::Administrator;
use crate::services::{AuthError, Registration};
use crate::state::AppState;

use super::DASHBOARD_PATH;

const LOGIN_FAILED: &str = "Login failed. Please try again.";
const REGISTRATION_FAILED: &str = "Registration failed. Please try again.";
const STALE_NOTICE: &str = "Your session is no longer valid. Please sign in again.";

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template)]
#[template(path = "auth/login.html")]
struct LoginTemplate {
    error: Option<String>,
    notice: Option<&'static str>,
    phone: String,
}

/// Registration page template.
#[derive(Template)]
#[template(path = "auth/register.html")]
struct RegisterTemplate {
    error: Option<String>,
    phone: String,
    email: String,
}

// =============================================================================
// Forms
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    reason: Option<String>,
}

/// Missing fields deserialize as empty strings and fail validation.
#[derive(Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    phone: String,
    password: String,
}

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    phone: String,
    password: String,
    #[serde(alias = "confirmPassword")]
    confirm_password: String,
    email: Option<String>,
}

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_page).post(login))
        .route("/register", get(register_page).post(register))
        .route("/logout", get(logout).post(logout))
}

// =============================================================================
// Login
// =============================================================================

/// Render the login page.
///
/// GET /login
async fn login_page(
    OptionalAdminAuth(admin): OptionalAdminAuth,
    Query(query): Query<LoginQuery>,
) -> Response {
    if admin.is_some() {
        return Redirect::to(DASHBOARD_PATH).into_response();
    }

    let notice = (query.reason.as_deref() == Some("stale")).then_some(STALE_NOTICE);

    render(
        StatusCode::OK,
        &LoginTemplate {
            error: None,
            notice,
            phone: String::new(),
        },
    )
}

/// Verify credentials and start a session.
///
/// POST /login
async fn login(
    State(state): State<AppState>,
    OptionalAdminAuth(admin): OptionalAdminAuth,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    if admin.is_some() {
        return Redirect::to(DASHBOARD_PATH).into_response();
    }

    let result = state.auth().authenticate(&form.phone, &form.password).await;

    let login_error = |status: StatusCode, message: String| {
        render(
            status,
            &LoginTemplate {
                error: Some(message),
                notice: None,
                phone: form.phone.trim().to_owned(),
            },
        )
    };

    match result {
        Ok(admin) => match start_session(&state, &session, &admin).await {
            Ok(()) => Redirect::to(DASHBOARD_PATH).into_response(),
            Err(e) => login_error(e.status_code(), LOGIN_FAILED.to_owned()),
        },
        Err(e) => {
            let (status, message) = form_error(&e, LOGIN_FAILED);
            login_error(status, message)
        }
    }
}

// =============================================================================
// Registration
// =============================================================================

/// Render the registration page.
///
/// GET /register
async fn register_page(
    State(state): State<AppState>,
    OptionalAdminAuth(admin): OptionalAdminAuth,
) -> Response {
    if admin.is_some() {
        return Redirect::to(DASHBOARD_PATH).into_response();
    }

    let error = match state.auth().registration_open().await {
        Ok(true) => None,
        Ok(false) => AuthError::RegistrationDisabled.user_message(),
        Err(e) => {
            report(&e);
            None
        }
    };

    render(
        StatusCode::OK,
        &RegisterTemplate {
            error,
            phone: String::new(),
            email: String::new(),
        },
    )
}

/// Create the administrator and sign them in.
///
/// POST /register
async fn register(
    State(state): State<AppState>,
    OptionalAdminAuth(admin): OptionalAdminAuth,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Response {
    if admin.is_some() {
        return Redirect::to(DASHBOARD_PATH).into_response();
    }

    let result = state
        .auth()
        .register(&Registration {
            phone: &form.phone,
            password: &form.password,
            confirm_password: &form.confirm_password,
            email: form.email.as_deref(),
        })
        .await;

    let register_error = |status: StatusCode, message: String| {
        render(
            status,
            &RegisterTemplate {
                error: Some(message),
                phone: form.phone.trim().to_owned(),
                email: form.email.as_deref().unwrap_or_default().trim().to_owned(),
            },
        )
    };

    match result {
        Ok(admin) => match start_session(&state, &session, &admin).await {
            Ok(()) => Redirect::to(DASHBOARD_PATH).into_response(),
            Err(e) => register_error(e.status_code(), REGISTRATION_FAILED.to_owned()),
        },
        Err(e) => {
            let (status, message) = form_error(&e, REGISTRATION_FAILED);
            register_error(status, message)
        }
    }
}

// =============================================================================
// Logout
// =============================================================================

/// End the session.
///
/// GET /logout, POST /logout
async fn logout(session: Session) -> Result<Redirect, AppError> {
    destroy_session(&session).await?;
    clear_sentry_user();

    tracing::info!("Administrator logged out");

    Ok(Redirect::to(crate::middleware::LOGIN_PATH))
}

// =============================================================================
// Helpers
// =============================================================================

async fn start_session(
    state: &AppState,
    session: &Session,
    admin: &Administrator,
) -> Result<(), AuthError> {
    let current = establish_session(session, admin, state.config().session_ttl())
        .await
        .map_err(|e| {
            let err = AuthError::from(e);
            report(&err);
            err
        })?;

    set_sentry_user(
        current.id.as_i32(),
        current.phone.as_str(),
        current.email.as_deref(),
    );

    Ok(())
}

/// Status and message for a failed form submission.
fn form_error(err: &AuthError, fallback: &str) -> (StatusCode, String) {
    if err.is_internal() {
        report(err);
    }

    let message = err.user_message().unwrap_or_else(|| fallback.to_owned());
    (err.status_code(), message)
}

fn render<T: Template>(status: StatusCode, template: &T) -> Response {
    let body = template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {}", e);
        String::from("Error rendering template")
    });

    (status, Html(body)).into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_form_accepts_both_confirmation_spellings() {
        let camel: RegisterForm =
            parse_form("phone=555&password=abcdefgh&confirmPassword=abcdefgh").await;
        let snake: RegisterForm =
            parse_form("phone=555&password=abcdefgh&confirm_password=abcdefgh").await;

        assert_eq!(camel.confirm_password, "abcdefgh");
        assert_eq!(snake.confirm_password, "abcdefgh");
        assert!(camel.email.is_none());
    }

    #[tokio::test]
    async fn test_login_form_missing_fields_are_empty() {
        let form: LoginForm = parse_form("phone=5551234567").await;
        assert_eq!(form.phone, "5551234567");
        assert!(form.password.is_empty());
    }

    #[test]
    fn test_form_error_hides_infrastructure_details() {
        let (status, message) = form_error(
            &AuthError::PasswordHash("argon2id hashing failed".to_owned()),
            LOGIN_FAILED,
        );
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, LOGIN_FAILED);

        let (status, message) = form_error(&AuthError::PasswordMismatch, REGISTRATION_FAILED);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message, "Passwords do not match");
    }

    #[test]
    fn test_login_template_escapes_phone() {
        let html = LoginTemplate {
            error: Some("Invalid phone number or password".to_owned()),
            notice: Some(STALE_NOTICE),
            phone: "<script>".to_owned(),
        }
        .render()
        .unwrap();

        assert!(html.contains("Invalid phone number or password"));
        assert!(html.contains(STALE_NOTICE));
        assert!(!html.contains("<script>"));
    }

    async fn parse_form<T: serde::de::DeserializeOwned>(body: &str) -> T {
        use axum::extract::FromRequest;

        let request = axum::http::Request::builder()
            .method("POST")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(axum::body::Body::from(body.to_owned()))
            .unwrap();

        let Form(form) = Form::<T>::from_request(request, &())
            .await
            .unwrap_or_else(|e| panic!("form rejected: {e}"));
        form
    }
}
