//! Core types for Monitor Panel.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod phone;

pub use id::AdminId;
pub use phone::{Phone, PhoneError};
