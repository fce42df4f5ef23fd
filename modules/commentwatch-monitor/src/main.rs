use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use commentwatch_common::{Config, SourceKind};
use commentwatch_monitor::monitor::{Monitor, DEFAULT_DURATION_MINUTES};
use commentwatch_monitor::notify::{
    log::LogReporter, slack::SlackReporter, CommentReporter,
};
use commentwatch_monitor::sources;

#[derive(Parser)]
#[command(name = "commentwatch", about = "Watch a video's comments for fresh, low-engagement replies")]
struct Cli {
    /// Video page URL to watch. Repeat to watch several videos at once.
    #[arg(long = "video", required_unless_present = "check_config")]
    videos: Vec<String>,

    /// How long to watch, in minutes.
    #[arg(long, default_value_t = DEFAULT_DURATION_MINUTES)]
    duration_minutes: f64,

    /// Seconds between checks (at least 10). Defaults to CHECK_INTERVAL_SECS.
    #[arg(long)]
    interval_secs: Option<u64>,

    /// Comment source override: `browserless` or `simulated`.
    #[arg(long)]
    source: Option<SourceKind>,

    /// Validate configuration and exit.
    #[arg(long)]
    check_config: bool,
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("commentwatch=info,commentwatch_monitor=info"))?;

    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;
    let cli = Cli::parse();

    // Load config
    let mut config = Config::from_env()?;
    if let Some(source) = cli.source {
        config.source = source;
        config.ensure_valid()?;
    }
    if let Some(interval) = cli.interval_secs {
        config.check_interval_secs = interval;
        config.ensure_valid()?;
    }
    config.log_redacted();

    if cli.check_config {
        info!("Configuration is valid");
        return Ok(());
    }

    // Build reporter: Slack if configured, otherwise log lines
    let reporter: Arc<dyn CommentReporter> = match config.slack_webhook_url.clone() {
        Some(url) => {
            info!("Slack notifications enabled");
            Arc::new(SlackReporter::new(url))
        }
        None => Arc::new(LogReporter),
    };

    // Ctrl-C stops every monitor after its current check
    let cancelled = Arc::new(AtomicBool::new(false));
    {
        let cancelled = cancelled.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, stopping after the current check");
                cancelled.store(true, Ordering::Relaxed);
            }
        });
    }

    // One isolated monitor (own source, session, dedup store) per video
    let mut runs = JoinSet::new();
    for video in cli.videos {
        let source = sources::from_config(&config)?;
        let monitor = Monitor::from_config(&config, source, reporter.clone(), cancelled.clone());
        let duration_minutes = cli.duration_minutes;
        let interval = config.check_interval_secs;
        runs.spawn(async move {
            let result = monitor.run(&video, duration_minutes, interval).await;
            (video, result)
        });
    }

    let mut failed = false;
    while let Some(joined) = runs.join_next().await {
        match joined {
            Ok((video, Ok(stats))) => {
                info!(video = video.as_str(), accepted = stats.accepted, "Finished watching");
            }
            Ok((video, Err(e))) => {
                error!(video = video.as_str(), error = %e, "Monitor failed to start");
                failed = true;
            }
            Err(e) => {
                error!(error = %e, "Monitor task panicked");
                failed = true;
            }
        }
    }

    if failed {
        anyhow::bail!("one or more monitors failed");
    }
    Ok(())
}
