//! hostfuse-report - summarize the fused host inventory
//!
//! Opens `<data_folder>/hostfuse.db` read-only and prints OS, host age and open port
//! distributions as text bar charts or JSON.

use anyhow::{Context, Result};
use clap::Parser;
use hostfuse_common::config::{database_path, load_toml_config, resolve_data_folder};
use hostfuse_report::db::{connect_readonly, read_hosts};
use hostfuse_report::{build_report, render_text, DEFAULT_CUTOFF_DAYS, MAX_CUTOFF_DAYS};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hostfuse-report")]
#[command(about = "Report on the fused host inventory")]
#[command(version)]
struct Args {
    /// TOML config file (default: HOSTFUSE_CONFIG, then <config_dir>/hostfuse/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Folder holding hostfuse.db
    #[arg(short, long)]
    data_folder: Option<PathBuf>,

    /// Hosts not seen for this many days count as old
    #[arg(
        long,
        default_value_t = DEFAULT_CUTOFF_DAYS,
        env = "HOSTFUSE_CUTOFF_DAYS",
        value_parser = clap::value_parser!(i64).range(0..=MAX_CUTOFF_DAYS)
    )]
    cutoff_days: i64,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
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
        "Starting hostfuse-report v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let data_folder = resolve_data_folder(args.data_folder.as_deref(), &toml_config);
    let db_path = database_path(&data_folder);
    info!("Database path: {}", db_path.display());

    let pool = connect_readonly(&db_path).await?;
    let hosts = read_hosts(&pool).await?;
    info!("Loaded {} hosts", hosts.len());

    let report = build_report(&hosts, hostfuse_common::time::now(), args.cutoff_days)?;

    if args.json {
        serde_json::to_writer_pretty(std::io::stdout().lock(), &report)
            .context("Failed to write report")?;
        println!();
    } else {
        print!("{}", render_text(&report));
    }

    Ok(())
}
