//! gazeattn — eye-gaze attention tracker.
//!
//! `capture` resolves each fixation from a tracker event stream to the X11
//! window under the user's gaze and appends it to a fixation log.
//! `summarize` aggregates a log into per-window dwell time and
//! interruption statistics.

mod capture;
mod config;
mod display;
mod record;
mod resolver;
mod session;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::capture::event::EventSource;
use crate::capture::{CaptureContext, CaptureError};
use crate::config::{Config, HeuristicsConfig, ResolverConfig};
use crate::display::X11Display;
use crate::record::RecordError;
use crate::record::log::{FixationLog, read_records};
use crate::resolver::ResolverError;
use crate::session::report::{self, ExportError};

#[derive(Debug, Parser)]
#[command(name = "gazeattn", version, about = "Eye-gaze window attention tracker")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Record fixations from a tracker event stream.
    Capture(CaptureArgs),
    /// Aggregate a fixation log and print per-window statistics.
    Summarize(SummarizeArgs),
}

#[derive(Debug, Args)]
struct CaptureArgs {
    /// Event stream to read, `-` for stdin.
    #[arg(long, default_value = "-")]
    events: String,

    /// Directory for a new timestamped fixation log.
    #[arg(long, conflicts_with = "log")]
    out_dir: Option<PathBuf>,

    /// Append to this fixation log instead.
    #[arg(long)]
    log: Option<PathBuf>,

    #[command(flatten)]
    resolver: ResolverArgs,

    #[command(flatten)]
    heuristics: HeuristicsArgs,
}

#[derive(Debug, Args)]
struct SummarizeArgs {
    /// Fixation log to read.
    log: PathBuf,

    /// Also write the summary as MessagePack to this path.
    #[arg(long)]
    export: Option<PathBuf>,

    #[command(flatten)]
    heuristics: HeuristicsArgs,
}

#[derive(Debug, Args)]
struct ResolverArgs {
    /// Percent of the rear window the front window must cover to take
    /// sole credit for a fixation.
    #[arg(long, env = "GAZEATTN_OVERLAP_THRESHOLD")]
    overlap_threshold: Option<f64>,
}

impl ResolverArgs {
    fn apply(&self, config: &mut ResolverConfig) {
        if let Some(threshold) = self.overlap_threshold {
            config.overlap_threshold = threshold;
        }
    }
}

#[derive(Debug, Args)]
struct HeuristicsArgs {
    /// Shortest time away that counts as a distraction.
    #[arg(long, env = "GAZEATTN_DISTRACTION_MIN_AWAY")]
    distraction_min_away: Option<f64>,

    /// Time away, as a fraction of dwell time, above which an interruption
    /// is no longer a distraction.
    #[arg(long, env = "GAZEATTN_DISTRACTION_MAX_FRACTION")]
    distraction_max_fraction: Option<f64>,

    /// Summed time away, as a fraction of dwell time, below which a window
    /// counts as focused.
    #[arg(long, env = "GAZEATTN_FOCUS_MAX_AWAY_FRACTION")]
    focus_max_away_fraction: Option<f64>,
}

impl HeuristicsArgs {
    fn apply(&self, config: &mut HeuristicsConfig) {
        if let Some(v) = self.distraction_min_away {
            config.distraction_min_away = v;
        }
        if let Some(v) = self.distraction_max_fraction {
            config.distraction_max_fraction = v;
        }
        if let Some(v) = self.focus_max_away_fraction {
            config.focus_max_away_fraction = v;
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Display(#[from] ResolverError),
    #[error(transparent)]
    Log(#[from] RecordError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("{path}: {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },
    #[error("write summary: {0}")]
    Output(std::io::Error),
}

/// How long shutdown waits for leftover tasks. A blocking stdin read in
/// tokio's blocking pool cannot be interrupted, so after Ctrl-C the runtime
/// must not wait on it indefinitely.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(250);

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!(error = %e, "failed to start async runtime");
            return ExitCode::FAILURE;
        }
    };

    let result = runtime.block_on(async {
        match cli.command {
            Command::Capture(args) => run_capture(args).await,
            Command::Summarize(args) => run_summarize(args).await,
        }
    });
    runtime.shutdown_timeout(SHUTDOWN_GRACE);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "gazeattn failed");
            ExitCode::FAILURE
        }
    }
}

async fn run_capture(args: CaptureArgs) -> Result<(), AppError> {
    let mut config = Config::default();
    args.resolver.apply(&mut config.resolver);
    args.heuristics.apply(&mut config.heuristics);

    let display = X11Display::connect()?;
    let log = match (&args.log, &args.out_dir) {
        (Some(path), _) => FixationLog::open(path).await?,
        (None, dir) => FixationLog::create_in(dir.as_deref().unwrap_or(Path::new("."))).await?,
    };
    let log_path = log.path().to_path_buf();

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("stop requested");
            on_signal.cancel();
        }
    });

    let mut ctx = CaptureContext::new(display, &config.resolver, log);
    tracing::info!(events = %args.events, "eye gaze data is being recorded, Ctrl-C to stop");

    let reason = if args.events == "-" {
        ctx.run(&mut EventSource::new(tokio::io::stdin()), &cancel).await
    } else {
        let file = tokio::fs::File::open(&args.events)
            .await
            .map_err(|source| AppError::Open {
                path: args.events.clone(),
                source,
            })?;
        ctx.run(&mut EventSource::new(file), &cancel).await
    };
    let stats = ctx.close();
    let reason = reason?;

    tracing::info!(
        ?reason,
        records = stats.records,
        discarded = stats.discarded,
        orphaned_ends = stats.orphaned_ends,
        background = stats.background,
        elapsed_secs = stats.elapsed.as_secs_f64(),
        "capture stopped"
    );
    stats
        .render(&mut std::io::stdout().lock())
        .map_err(AppError::Output)?;

    summarize_log(&log_path, &config.heuristics, None).await
}

async fn run_summarize(args: SummarizeArgs) -> Result<(), AppError> {
    let mut heuristics = HeuristicsConfig::default();
    args.heuristics.apply(&mut heuristics);
    summarize_log(&args.log, &heuristics, args.export.as_deref()).await
}

async fn summarize_log(
    path: &Path,
    heuristics: &HeuristicsConfig,
    export: Option<&Path>,
) -> Result<(), AppError> {
    let records = read_records(path).await?;
    let table = session::aggregate(&records);
    if table.is_empty() {
        tracing::warn!(path = %path.display(), "no valid fixations in log");
    } else {
        tracing::debug!(windows = table.len(), "fixation log aggregated");
    }
    let summary = report::summarize(&table, heuristics);

    summary
        .render(&mut std::io::stdout().lock())
        .map_err(AppError::Output)?;

    if let Some(export) = export {
        summary.export(export).await?;
    }
    Ok(())
}
