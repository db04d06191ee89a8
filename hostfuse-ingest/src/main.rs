//! hostfuse-ingest - pull host inventories and fuse them into one record per host
//!
//! Sources are the Qualys and CrowdStrike inventory APIs (enabled through
//! configuration) or JSON exports passed on the command line. Fused hosts are
//! upserted into `<data_folder>/hostfuse.db`.

use anyhow::{bail, Context, Result};
use clap::Parser;
use hostfuse_common::config::{
    self, database_path, load_toml_config, resolve_data_folder, resolve_source,
    DEFAULT_MAX_PAGES, DEFAULT_PAGE_SIZE,
};
use hostfuse_common::db::init_database;
use hostfuse_common::SourceKind;
use hostfuse_ingest::db::{save_run, IngestRun};
use hostfuse_ingest::{
    run_ingest, ErrorPolicy, FileHostSource, HostSink, MemoryHostSink, RunSummary, SourcePlan,
    SqliteHostSink,
};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hostfuse-ingest")]
#[command(about = "Fuse Qualys and CrowdStrike host inventories into one host table")]
#[command(version)]
struct Args {
    /// TOML config file (default: HOSTFUSE_CONFIG, then <config_dir>/hostfuse/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Folder holding hostfuse.db
    #[arg(short, long)]
    data_folder: Option<PathBuf>,

    /// Read Qualys records from a JSON export instead of the API
    #[arg(long)]
    qualys_file: Option<PathBuf>,

    /// Read CrowdStrike records from a JSON export instead of the API
    #[arg(long)]
    crowdstrike_file: Option<PathBuf>,

    /// Records per page (overrides configuration)
    #[arg(long)]
    page_size: Option<usize>,

    /// Maximum pages per source (overrides configuration)
    #[arg(long)]
    max_pages: Option<usize>,

    /// Abort the run on the first record that cannot be normalized
    #[arg(long)]
    fail_on_invalid: bool,

    /// Print fused hosts as JSON instead of writing the database
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    let toml_config = load_toml_config(args.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&toml_config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(
        "Starting hostfuse-ingest v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let policy = if args.fail_on_invalid {
        ErrorPolicy::FailBatch
    } else {
        ErrorPolicy::SkipInvalid
    };

    let plans = build_plans(&args, &toml_config).await?;
    if plans.is_empty() {
        let (qualys_api, _) = config::source_env_vars(SourceKind::Qualys);
        let (crowdstrike_api, _) = config::source_env_vars(SourceKind::CrowdStrike);
        bail!(
            "No sources enabled: configure {} / {} with a token, or pass --qualys-file / --crowdstrike-file",
            qualys_api,
            crowdstrike_api
        );
    }

    if args.dry_run {
        let sink = MemoryHostSink::new();
        let summary = run_ingest(&plans, &sink, policy).await?;
        log_summary(&summary);
        serde_json::to_writer_pretty(std::io::stdout().lock(), &sink.hosts()?)
            .context("Failed to write hosts to stdout")?;
        println!();
        return Ok(());
    }

    let data_folder = resolve_data_folder(args.data_folder.as_deref(), &toml_config);
    let db_path = database_path(&data_folder);
    info!("Database: {}", db_path.display());

    let pool = init_database(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    let mut run = IngestRun::start();
    save_run(&pool, &run).await?;
    info!("Ingest run {}", run.run_id);

    let sink = SqliteHostSink::new(pool.clone());
    let result = run_ingest(&plans, &sink as &dyn HostSink, policy).await;

    match &result {
        Ok(summary) => {
            run.received = summary.received;
            run.normalized = summary.normalized;
            run.rejected = summary.rejected.len();
            run.persisted = summary.persisted.written();
            run.complete();
        }
        Err(e) => run.fail(e),
    }
    save_run(&pool, &run).await?;

    let summary = result.with_context(|| format!("Ingest run {} failed", run.run_id))?;
    log_summary(&summary);

    Ok(())
}

/// One plan per source: an export file when given, otherwise the configured API
async fn build_plans(
    args: &Args,
    toml_config: &config::TomlConfig,
) -> Result<Vec<SourcePlan>> {
    let mut plans = Vec::new();

    for kind in SourceKind::ALL {
        let file = match kind {
            SourceKind::Qualys => args.qualys_file.as_ref(),
            SourceKind::CrowdStrike => args.crowdstrike_file.as_ref(),
        };

        let plan = if let Some(path) = file {
            let source = FileHostSource::open(kind, path)
                .await
                .with_context(|| format!("Failed to load {} export {}", kind, path.display()))?;
            SourcePlan::new(
                Box::new(source),
                args.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
                args.max_pages.unwrap_or(DEFAULT_MAX_PAGES),
            )
        } else if let Some(settings) = resolve_source(kind, toml_config) {
            let mut plan = SourcePlan::from_settings(&settings)
                .with_context(|| format!("Failed to create {} client", kind))?;
            if let Some(page_size) = args.page_size {
                plan.page_size = page_size;
            }
            if let Some(max_pages) = args.max_pages {
                plan.max_pages = max_pages;
            }
            plan
        } else {
            continue;
        };

        info!("Source {} enabled", kind);
        plans.push(plan);
    }

    Ok(plans)
}

fn log_summary(summary: &RunSummary) {
    info!(
        "{} records received, {} normalized, {} rejected, {} unique hosts",
        summary.received,
        summary.normalized,
        summary.rejected.len(),
        summary.hosts
    );
    info!(
        "{} inserted, {} updated, {} unchanged",
        summary.persisted.inserted, summary.persisted.updated, summary.persisted.unchanged
    );
    for failure in &summary.failed_sources {
        warn!("Source {} was skipped: {}", failure.source, failure.error);
    }
}
