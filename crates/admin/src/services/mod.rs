//! Business logic services for admin.
//!
//! # Services
//!
//! - `auth` - Dual-hash password authentication for the single administrator

pub mod auth;

pub use auth::{AdminAuthService, AuthError, DualHasher, Registration};
