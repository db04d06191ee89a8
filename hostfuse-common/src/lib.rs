//! # hostfuse common library
//!
//! Shared code for the hostfuse binaries:
//! - Canonical host model
//! - Error types
//! - Configuration loading
//! - Timestamp parsing
//! - SQLite schema and host row access

pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod host;
pub mod time;

pub use error::{Error, Result};
pub use host::{CanonicalHost, Field, Scalar, ScalarField, SourceKind};
