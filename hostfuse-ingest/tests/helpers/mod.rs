//! Test Helper Utilities
//!
//! Shared utilities for hostfuse-ingest integration tests

#![allow(dead_code)]

pub mod db_utils;
pub mod hosts;

pub use db_utils::{create_test_db, fixture_path};
pub use hosts::{at, host, host_with_tags};
