use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use version_meta::cache::Cache;
use version_meta::config::MetaConfig;
use version_meta::logging::init_logging;
use version_meta::refresh::Refresher;
use version_meta::release::semver::normalize;
use version_meta::snapshot::PublishedDatabase;

#[derive(Parser)]
#[command(name = "version-meta")]
#[command(version, about = "Reconciles release manifests and artifact feeds into a version snapshot")]
struct Cli {
    /// JSON config file; defaults apply when it does not exist
    #[arg(long, global = true, default_value = "config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Refresh the snapshot forever (default)
    Run,
    /// Run one refresh cycle and print the snapshot as JSON
    Dump {
        #[arg(long)]
        pretty: bool,
    },
    /// Print the semver form of a release id
    Normalize { series: String, name: String },
}

fn build_refresher(config: &MetaConfig) -> anyhow::Result<Refresher> {
    let data_dir = config.resolved_data_dir();
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("failed to create data directory {:?}", data_dir))?;

    let cache = Arc::new(Cache::new(&config.db_path())?);
    let published = Arc::new(PublishedDatabase::new());
    Ok(Refresher::from_config(config, cache, published)?)
}

async fn run(config: MetaConfig) -> anyhow::Result<()> {
    let refresher = build_refresher(&config)?;
    info!("Starting refresh service");
    refresher.run().await?;
    Ok(())
}

async fn dump(config: MetaConfig, pretty: bool) -> anyhow::Result<()> {
    let refresher = build_refresher(&config)?;
    refresher.refresh_once().await?;

    let database = refresher
        .published()
        .load()
        .context("refresh finished without publishing a snapshot")?;
    let json = if pretty {
        serde_json::to_string_pretty(&*database)?
    } else {
        serde_json::to_string(&*database)?
    };
    println!("{json}");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(Command::Normalize { series, name }) = &cli.command {
        println!("{}", normalize(series, name));
        return Ok(());
    }

    let config = MetaConfig::load(&cli.config)?;
    let _guard = init_logging(Some(&config.log_path()))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    match cli.command {
        None | Some(Command::Run) => runtime.block_on(run(config)),
        Some(Command::Dump { pretty }) => runtime.block_on(dump(config, pretty)),
        Some(Command::Normalize { .. }) => Ok(()),
    }
}
