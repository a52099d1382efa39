//! Filter command - tail a raw log into category files

use std::path::PathBuf;

use acomms_config::{Config, FilterConfig, ProfileKind, StartAt, TruncatePolicy};
use acomms_pipeline::{FilterLoop, StatsReporter};
use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Framing profile selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProfileArg {
    Vehicle,
    Positioning,
    Delimited,
}

impl From<ProfileArg> for ProfileKind {
    fn from(arg: ProfileArg) -> Self {
        match arg {
            ProfileArg::Vehicle => ProfileKind::Vehicle,
            ProfileArg::Positioning => ProfileKind::Positioning,
            ProfileArg::Delimited => ProfileKind::Delimited,
        }
    }
}

/// Filter command arguments
///
/// Each flag overrides the matching `[filter]` setting.
#[derive(Args, Debug)]
pub struct FilterArgs {
    /// Raw log to tail
    #[arg(short = 't', long)]
    pub target: Option<PathBuf>,

    /// Directory receiving the category files
    #[arg(short = 'f', long = "output-dir")]
    pub output_dir: Option<PathBuf>,

    /// Output file prefix ({name}_{category}.txt)
    #[arg(short = 'n', long)]
    pub name: Option<String>,

    /// Framing profile
    #[arg(long, value_enum)]
    pub profile: Option<ProfileArg>,

    /// Start after the existing content when no cursor exists
    #[arg(long)]
    pub from_end: bool,

    /// Cursor file (default: {output_dir}/.{name}_{profile}.cursor.json)
    #[arg(long)]
    pub cursor: Option<PathBuf>,

    /// Sync category files after every record
    #[arg(long)]
    pub durable: bool,

    /// Start over from the beginning when the raw log is truncated
    #[arg(long)]
    pub rewind_on_truncate: bool,
}

impl FilterArgs {
    /// Apply command line overrides to `[filter]`
    pub fn apply(&self, filter: &mut FilterConfig) {
        if let Some(target) = &self.target {
            filter.target = Some(target.clone());
        }
        if let Some(output_dir) = &self.output_dir {
            filter.output_dir = Some(output_dir.clone());
        }
        if let Some(name) = &self.name {
            filter.name = name.clone();
        }
        if let Some(profile) = self.profile {
            filter.profile = profile.into();
        }
        if self.from_end {
            filter.start_at = StartAt::End;
        }
        if let Some(cursor) = &self.cursor {
            filter.cursor_path = Some(cursor.clone());
        }
        if self.durable {
            filter.durable = true;
        }
        if self.rewind_on_truncate {
            filter.on_truncate = TruncatePolicy::Rewind;
        }
    }
}

/// Run the filter command
pub async fn run(args: FilterArgs, mut config: Config) -> Result<()> {
    args.apply(&mut config.filter);
    config
        .validate()
        .context("invalid configuration after command line overrides")?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        profile = config.filter.profile.as_str(),
        categories = config.categories.len(),
        "acomms filter starting"
    );

    let filter = FilterLoop::from_config(&config).context("failed to set up filter")?;
    let cancel = CancellationToken::new();

    let reporter = StatsReporter::new(filter.metrics_handle(), &config.metrics);
    let reporter_task = tokio::spawn(reporter.run(cancel.clone()));

    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        wait_for_shutdown().await;
        info!("shutdown signal received, stopping filter");
        signal_cancel.cancel();
    });

    let result = filter.run(cancel.clone()).await;

    // Filter may have stopped on its own; stop the reporter either way
    cancel.cancel();
    if let Err(e) = reporter_task.await {
        warn!(error = %e, "stats reporter task failed");
    }

    let summary = result.context("filter stopped with an error")?;
    info!(
        lines = summary.lines_processed,
        routed = summary.routed_total(),
        skipped = summary.skipped_total(),
        "acomms shutdown complete"
    );
    Ok(())
}

/// Wait for SIGINT or SIGTERM
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
