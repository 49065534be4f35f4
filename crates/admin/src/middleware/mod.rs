//! HTTP middleware stack for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (tower-sessions, `PostgreSQL` store in production)
//! 4. Auth extractors on individual handlers ([`RequireAdminAuth`], [`OptionalAdminAuth`])

pub mod auth;
pub mod session;

pub use auth::{
    AdminAuthRejection, LOGIN_PATH, OptionalAdminAuth, RequireAdminAuth, STALE_LOGIN_PATH,
    destroy_session, establish_session, guard,
};
pub use session::{SESSION_COOKIE_NAME, create_postgres_store, create_session_layer};
