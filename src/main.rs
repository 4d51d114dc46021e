use std::path::PathBuf;
use clap::Parser;
use anyhow::Result;
use chrono::{DateTime, Utc};
use log::{error, info, LevelFilter};

mod classify;
mod config;
mod feed;
mod logger;
mod models;
mod parser;
mod pipeline;
mod render;
mod store;

use config::Config;
use feed::HttpFetcher;
use models::ReportStyle;
use pipeline::{Pipeline, RunOutcome};
use store::FsStore;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Report family to produce
    #[arg(short, long, value_enum, default_value_t = ReportStyle::Digest)]
    style: ReportStyle,

    /// YAML file overriding the built-in communities and keyword tables
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory that receives data/, daily/ and index.html
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    #[arg(long, default_value = "info", value_parser = logger::parse_level)]
    log_level: LevelFilter,

    /// Also write a dated log file for this run into the directory
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let now = Utc::now();

    let log_file = logger::init(
        &logger::LogConfig {
            level: args.log_level,
            log_dir: args.log_dir.clone(),
        },
        now.date_naive(),
    )?;
    if let Some(path) = log_file {
        info!("Logging to {}", path.display());
    }

    if let Err(e) = run(args, now).await {
        error!("Run failed: {:#}", e);
        return Err(e);
    }
    Ok(())
}

async fn run(args: Args, now: DateTime<Utc>) -> Result<()> {
    let config = Config::load(args.config.as_deref())?;
    info!("Starting Reddit AI digest for {} ({:?})", now.format("%Y-%m-%d"), args.style);

    let fetcher = HttpFetcher::new(&config)?;
    let store = FsStore::new(args.output_dir);
    let mut pipeline = Pipeline::new(&config, fetcher, store, args.style);

    match pipeline.run(now).await? {
        RunOutcome::Empty => info!("Finished without writing any report"),
        RunOutcome::Written { posts, artifacts } => {
            info!("Done: {} posts, {} files written", posts, artifacts.len());
        }
    }

    Ok(())
}
