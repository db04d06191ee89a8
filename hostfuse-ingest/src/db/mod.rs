//! Database access for hostfuse-ingest
//!
//! Host rows live in hostfuse-common (the report binary reads them too); only run
//! bookkeeping is specific to ingest.

pub mod runs;

pub use runs::{load_run, save_run, IngestRun, RunStatus};
