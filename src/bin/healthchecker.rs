use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use healthchecker::{
    HttpProber, Pipeline, StdoutSink, group_into_domains, read_config_file,
    shutdown::wait_for_signal,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, level_filters::LevelFilter, trace, warn};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
#[command(about = "Probe HTTP endpoints and report per-domain availability")]
struct Args {
    /// Config file (YAML for .yaml/.yml, TOML for .toml, JSON otherwise)
    config: PathBuf,

    /// Log per-probe timing diagnostics to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn init(verbose: bool) {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let filter = filter::Targets::new().with_targets(vec![("healthchecker", level)]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init(args.verbose);
    trace!("started with args: {args:?}");

    let config = read_config_file(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    let grouped = group_into_domains(&config.checks).context("invalid check definition")?;
    let settings = config.settings;

    info!(
        "monitoring {} checks across {} domains every {:?}",
        grouped.checks.len(),
        grouped.stats.len(),
        settings.interval()
    );

    let token = CancellationToken::new();
    let pipeline = Pipeline::spawn(
        grouped,
        &settings,
        Arc::new(HttpProber::new(settings.timeout())),
        Arc::new(StdoutSink),
        token.clone(),
    );

    wait_for_signal(&token).await;

    // In-flight probes finish within the probe timeout
    let grace = settings.timeout() + Duration::from_secs(1);
    match tokio::time::timeout(grace, pipeline.join()).await {
        Ok(stats) => {
            for (domain, stats) in stats?.iter() {
                debug!("{domain} final up: {} total: {}", stats.up(), stats.total());
            }
        }
        Err(_) => warn!("pipeline did not stop within {grace:?}"),
    }

    Ok(())
}
