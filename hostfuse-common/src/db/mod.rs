//! Database schema and host row access
//!
//! The `hosts` table is written by hostfuse-ingest and read by hostfuse-report.

pub mod hosts;
pub mod init;

pub use hosts::{count_hosts, load_host, load_hosts, upsert_hosts, UpsertSummary};
pub use init::init_database;
