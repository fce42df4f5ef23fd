//! Poll loop: fetch -> filter -> dedup -> report, once per tick, until the
//! duration budget runs out or the run is cancelled.
//!
//! Two stop signals are sampled at the top of every tick and right before each
//! wait: this monitor's own stop request (`Monitor::stop`) and a cancel flag
//! that may be shared with other monitors. Either takes effect within one
//! check interval and never interrupts a tick halfway.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use commentwatch_common::config::MIN_CHECK_INTERVAL_SECS;
use commentwatch_common::{Comment, CommentWatchError, Config, RawComment};

use crate::filter::{FilterPipeline, Verdict};
use crate::notify::CommentReporter;
use crate::session::MonitorSession;
use crate::sources::CommentSource;
use crate::stats::{MonitorStats, StopReason};

/// Default run length when the caller doesn't give one.
pub const DEFAULT_DURATION_MINUTES: f64 = 5.0;

pub struct Monitor {
    source: Arc<dyn CommentSource>,
    reporter: Arc<dyn CommentReporter>,
    pipeline: FilterPipeline,
    store_capacity: usize,
    fetch_timeout: Duration,
    cancelled: Arc<AtomicBool>,
    stop_requested: AtomicBool,
}

impl Monitor {
    pub fn new(
        source: Arc<dyn CommentSource>,
        reporter: Arc<dyn CommentReporter>,
        pipeline: FilterPipeline,
        store_capacity: usize,
        fetch_timeout: Duration,
        cancelled: Arc<AtomicBool>,
    ) -> Self {
        Self {
            source,
            reporter,
            pipeline,
            store_capacity,
            fetch_timeout,
            cancelled,
            stop_requested: AtomicBool::new(false),
        }
    }

    /// Wire a monitor with thresholds, store capacity and fetch timeout from `config`.
    pub fn from_config(
        config: &Config,
        source: Arc<dyn CommentSource>,
        reporter: Arc<dyn CommentReporter>,
        cancelled: Arc<AtomicBool>,
    ) -> Self {
        Self::new(
            source,
            reporter,
            FilterPipeline::from_config(config),
            config.max_comments_store,
            config.fetch_timeout(),
            cancelled,
        )
    }

    /// Ask this monitor's current (or next) run to stop at its next check.
    /// The request is consumed when that run terminates, so a later `run`
    /// starts fresh. Other monitors sharing the cancel flag are unaffected.
    pub fn stop(&self) {
        self.stop_requested.store(true, Ordering::Relaxed);
    }

    /// The shared cancel flag. Unlike `stop`, raising it is never undone here:
    /// every run on every monitor holding it stops until the owner clears it.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    fn stop_signal(&self) -> Option<StopReason> {
        if self.stop_requested.load(Ordering::Relaxed) {
            Some(StopReason::Stopped)
        } else if self.cancelled.load(Ordering::Relaxed) {
            Some(StopReason::Cancelled)
        } else {
            None
        }
    }

    /// Watch `video_ref` for `duration_minutes`, checking every
    /// `check_interval_secs`. Returns the run's stats once terminated.
    ///
    /// Invalid parameters are rejected before the run starts. Nothing that
    /// happens inside a tick ends the run early.
    pub async fn run(
        &self,
        video_ref: &str,
        duration_minutes: f64,
        check_interval_secs: u64,
    ) -> Result<MonitorStats, CommentWatchError> {
        let budget = run_budget(duration_minutes)?;
        if check_interval_secs < MIN_CHECK_INTERVAL_SECS {
            return Err(CommentWatchError::Config(format!(
                "check interval must be at least {MIN_CHECK_INTERVAL_SECS}s, got {check_interval_secs}s"
            )));
        }
        let interval = Duration::from_secs(check_interval_secs);

        let mut session = MonitorSession::new(video_ref, self.store_capacity);
        session.start(budget);
        info!(
            video = video_ref,
            source = self.source.name(),
            duration_minutes,
            check_interval_secs,
            "Monitoring started"
        );

        loop {
            if let Some(reason) = self.stop_signal() {
                info!(video = video_ref, %reason, "Monitoring stopped");
                session.begin_stopping(reason);
                break;
            }
            if session.remaining().is_zero() {
                session.begin_stopping(StopReason::DeadlineReached);
                break;
            }

            self.tick(&mut session).await;

            let wait = interval.min(session.remaining());
            if wait.is_zero() {
                session.begin_stopping(StopReason::DeadlineReached);
                break;
            }
            if let Some(reason) = self.stop_signal() {
                info!(video = video_ref, %reason, "Monitoring stopped");
                session.begin_stopping(reason);
                break;
            }

            debug!(wait_secs = wait.as_secs_f64(), "Waiting for next check");
            tokio::time::sleep(wait).await;
        }

        Ok(self.finish(&mut session).await)
    }

    /// One tick: fetch, then filter/dedup/report the batch.
    async fn tick(&self, session: &mut MonitorSession) {
        session.stats_mut().ticks += 1;
        let tick = session.tick_count();
        let video_ref = session.video_ref().to_string();

        let batch = match self.fetch(&video_ref).await {
            Ok(batch) => batch,
            Err(e) => {
                warn!(video = video_ref.as_str(), tick, error = %e, "Comment fetch failed, treating as empty");
                session.stats_mut().source_failures += 1;
                Vec::new()
            }
        };

        let fetched = batch.len();
        let accepted = self.process(session, batch).await;
        info!(
            video = video_ref.as_str(),
            tick,
            fetched,
            accepted = accepted.len(),
            stored = session.store().len(),
            "Check complete"
        );
    }

    async fn fetch(&self, video_ref: &str) -> Result<Vec<RawComment>, CommentWatchError> {
        match tokio::time::timeout(self.fetch_timeout, self.source.fetch(video_ref)).await {
            Ok(Ok(batch)) => Ok(batch),
            Ok(Err(e)) => Err(CommentWatchError::SourceUnavailable(format!("{e:#}"))),
            Err(_) => Err(CommentWatchError::Timeout(self.fetch_timeout)),
        }
    }

    /// Run an already-fetched batch through the filters and the dedup store,
    /// report every newly accepted comment, and return them in batch order.
    pub async fn process(
        &self,
        session: &mut MonitorSession,
        batch: Vec<RawComment>,
    ) -> Vec<Comment> {
        let video_ref = session.video_ref().to_string();
        let mut accepted = Vec::new();
        session.stats_mut().comments_fetched += batch.len() as u64;

        for raw in batch {
            match self.pipeline.evaluate(&raw) {
                Verdict::Qualifies => {}
                Verdict::TooOld => {
                    debug!(id = raw.id.as_str(), age = raw.age_text.as_str(), "Rejected: too old");
                    session.stats_mut().rejected_too_old += 1;
                    continue;
                }
                Verdict::TooPopular => {
                    debug!(id = raw.id.as_str(), likes = raw.like_count, "Rejected: too many likes");
                    session.stats_mut().rejected_too_popular += 1;
                    continue;
                }
            }

            // The pipeline already rejected negative like counts.
            let Some(comment) = Comment::from_raw(raw, Utc::now()) else {
                session.stats_mut().rejected_too_popular += 1;
                continue;
            };

            if session.store_mut().admit(comment.clone()) {
                accepted.push(comment);
            } else {
                debug!(id = comment.id.as_str(), "Rejected: already reported");
                session.stats_mut().rejected_duplicate += 1;
            }
        }

        for comment in &accepted {
            match self.report(&video_ref, comment).await {
                Ok(()) => session.stats_mut().reported += 1,
                Err(e) => {
                    warn!(error = %e, id = comment.id.as_str(), "Failed to report comment");
                    session.stats_mut().report_failures += 1;
                }
            }
        }
        session.stats_mut().accepted += accepted.len() as u64;

        accepted
    }

    async fn report(&self, video_ref: &str, comment: &Comment) -> Result<(), CommentWatchError> {
        self.reporter
            .emit(video_ref, comment)
            .await
            .map_err(|e| CommentWatchError::Report(format!("{e:#}")))
    }

    /// Stopping -> Terminated: release the source and emit the summary.
    async fn finish(&self, session: &mut MonitorSession) -> MonitorStats {
        self.stop_requested.store(false, Ordering::Relaxed);

        if let Err(e) = self.source.shutdown().await {
            warn!(error = %e, source = self.source.name(), "Failed to shut down comment source");
        }

        let stats = session.terminate();
        info!(video = session.video_ref(), "Monitoring complete. {stats}");

        if let Err(e) = self
            .reporter
            .summary(session.video_ref(), &stats)
            .await
            .map_err(|e| CommentWatchError::Report(format!("{e:#}")))
        {
            warn!(error = %e, "Failed to send run summary");
        }

        stats
    }
}

fn run_budget(duration_minutes: f64) -> Result<Duration, CommentWatchError> {
    if !(duration_minutes.is_finite() && duration_minutes > 0.0) {
        return Err(CommentWatchError::Config(format!(
            "duration must be a positive number of minutes, got {duration_minutes}"
        )));
    }
    Duration::try_from_secs_f64(duration_minutes * 60.0)
        .map_err(|e| CommentWatchError::Config(format!("duration out of range: {e}")))
}
