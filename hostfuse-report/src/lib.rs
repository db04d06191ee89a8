//! hostfuse-report library - read-only inventory reporting
//!
//! Aggregates the fused `hosts` table written by hostfuse-ingest.

pub mod db;
pub mod render;
pub mod summary;

pub use render::render_text;
pub use summary::{
    age_cutoff, build_report, host_age, open_port_distribution, os_distribution, Bucket, HostAge,
    InventoryReport, DEFAULT_CUTOFF_DAYS, MAX_CUTOFF_DAYS,
};
