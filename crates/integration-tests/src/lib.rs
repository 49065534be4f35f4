//! Integration tests for Monitor Panel.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process router tests (no external services)
//! cargo test -p monitor-panel-integration-tests
//!
//! # PostgreSQL store tests (needs ADMIN_DATABASE_URL and `mp-cli migrate`)
//! cargo test -p monitor-panel-integration-tests -- --ignored
//! ```
//!
//! [`TestApp`] drives the real admin router with an in-memory administrator
//! store and an in-memory session store, carrying the session cookie between
//! requests like a browser would.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use secrecy::SecretString;
use tower::ServiceExt;
use tower_sessions::MemoryStore;

use monitor_panel_admin::config::{AdminConfig, HashingConfig};
use monitor_panel_admin::db::MemoryAdministratorStore;
use monitor_panel_admin::middleware::SESSION_COOKIE_NAME;
use monitor_panel_admin::state::AppState;

/// Phone number used by the default test administrator.
pub const PHONE: &str = "5551234567";

/// Password used by the default test administrator.
pub const PASSWORD: &str = "correcthorse";

/// Minimum-cost hashing parameters so tests stay fast.
#[must_use]
pub const fn fast_hashing() -> HashingConfig {
    HashingConfig {
        bcrypt_cost: 4,
        argon2_memory_kib: 8,
        argon2_iterations: 1,
        argon2_parallelism: 1,
    }
}

/// Configuration for in-process tests.
#[must_use]
pub fn test_config() -> AdminConfig {
    AdminConfig {
        database_url: SecretString::from("postgres://localhost/unused"),
        host: [127, 0, 0, 1].into(),
        port: 3000,
        base_url: "http://localhost:3000".to_string(),
        session_ttl_hours: 24,
        hashing: fast_hashing(),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
        tls: None,
    }
}

/// A response, reduced to what the tests look at.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub set_cookie: Option<String>,
    pub body: String,
}

impl TestResponse {
    /// Parse the body as JSON.
    ///
    /// # Panics
    ///
    /// Panics if the body is not valid JSON.
    #[must_use]
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body)
            .unwrap_or_else(|e| panic!("invalid JSON body {:?}: {e}", self.body))
    }
}

/// The admin router plus a single browser-like cookie jar.
pub struct TestApp {
    router: Router,
    /// The administrator store behind the router, for out-of-band changes.
    pub store: Arc<MemoryAdministratorStore>,
    cookie: Option<String>,
}

impl TestApp {
    /// Build a fresh app with an empty store.
    ///
    /// # Panics
    ///
    /// Panics if the test hashing parameters are rejected.
    #[must_use]
    pub fn new() -> Self {
        let store = Arc::new(MemoryAdministratorStore::new());
        let state = AppState::new(test_config(), store.clone())
            .unwrap_or_else(|e| panic!("invalid test hashing config: {e}"));

        Self {
            router: monitor_panel_admin::app(state, MemoryStore::default()),
            store,
            cookie: None,
        }
    }

    /// A second client (empty cookie jar) against the same app and store.
    #[must_use]
    pub fn new_client(&self) -> Self {
        Self {
            router: self.router.clone(),
            store: Arc::clone(&self.store),
            cookie: None,
        }
    }

    /// Whether the client currently holds a session cookie.
    #[must_use]
    pub const fn has_session_cookie(&self) -> bool {
        self.cookie.is_some()
    }

    /// Current session cookie (`name=value`), if any.
    #[must_use]
    pub fn session_cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }

    pub async fn get(&mut self, path: &str) -> TestResponse {
        let request = self.request("GET", path).body(Body::empty());
        self.send(request).await
    }

    pub async fn post(&mut self, path: &str) -> TestResponse {
        let request = self.request("POST", path).body(Body::empty());
        self.send(request).await
    }

    pub async fn post_form(&mut self, path: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = fields
            .iter()
            .map(|(key, value)| format!("{}={}", encode(key), encode(value)))
            .collect::<Vec<_>>()
            .join("&");

        let request = self
            .request("POST", path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body));
        self.send(request).await
    }

    /// Register the default administrator through the web form.
    pub async fn register_default(&mut self) -> TestResponse {
        self.post_form(
            "/register",
            &[
                ("phone", PHONE),
                ("password", PASSWORD),
                ("confirmPassword", PASSWORD),
                ("email", "ops@example.com"),
            ],
        )
        .await
    }

    /// Log in with the given credentials through the web form.
    pub async fn login(&mut self, phone: &str, password: &str) -> TestResponse {
        self.post_form("/login", &[("phone", phone), ("password", password)])
            .await
    }

    fn request(&self, method: &str, path: &str) -> axum::http::request::Builder {
        let builder = Request::builder().method(method).uri(path);
        match &self.cookie {
            Some(cookie) => builder.header(header::COOKIE, cookie),
            None => builder,
        }
    }

    async fn send(&mut self, request: Result<Request<Body>, axum::http::Error>) -> TestResponse {
        let request = request.unwrap_or_else(|e| panic!("invalid request: {e}"));

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .unwrap_or_else(|e| match e {});

        let status = response.status();
        let location = header_string(response.headers(), header::LOCATION);
        let set_cookie = header_string(response.headers(), header::SET_COOKIE);

        if let Some(set_cookie) = &set_cookie {
            self.store_cookie(set_cookie);
        }

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap_or_else(|e| panic!("failed to read body: {e}"));

        TestResponse {
            status,
            location,
            set_cookie,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    fn store_cookie(&mut self, set_cookie: &str) {
        let Some(pair) = set_cookie.split(';').next().map(str::trim) else {
            return;
        };
        if !pair.starts_with(&format!("{SESSION_COOKIE_NAME}=")) {
            return;
        }

        let removed = set_cookie
            .split(';')
            .map(str::trim)
            .any(|attr| attr.eq_ignore_ascii_case("max-age=0"));

        self.cookie = if removed {
            None
        } else {
            Some(pair.to_owned())
        };
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

fn header_string(headers: &axum::http::HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

/// Minimal `application/x-www-form-urlencoded` encoding.
fn encode(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'*' => {
                char::from(b).to_string()
            }
            b' ' => "+".to_string(),
            other => format!("%{other:02X}"),
        })
        .collect()
}
