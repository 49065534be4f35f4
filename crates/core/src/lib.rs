//! Monitor Panel Core - Shared types library.
//!
//! This crate provides the types shared by the admin server and the CLI:
//! - `admin` - Administration panel (login, registration, dashboard)
//! - `cli` - Command-line tools for migrations and administrator maintenance
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for administrator ids and phone numbers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
