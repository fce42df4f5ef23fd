//! Poll loop tests.
//!
//! Drive `Monitor::run` against scripted sources on tokio's paused clock, so
//! multi-minute runs finish instantly and tick counts are deterministic.
//!
//! Run with: cargo test -p commentwatch-monitor --test monitor_loop_test

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use commentwatch_common::{CommentWatchError, Config};
use commentwatch_monitor::filter::FilterPipeline;
use commentwatch_monitor::monitor::Monitor;
use commentwatch_monitor::session::MonitorSession;
use commentwatch_monitor::stats::StopReason;
use commentwatch_monitor::testing::{raw_comment, RecordingReporter, ScriptedSource};

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

fn monitor_with(
    source: Arc<ScriptedSource>,
    reporter: Arc<RecordingReporter>,
    capacity: usize,
) -> Monitor {
    Monitor::new(
        source,
        reporter,
        FilterPipeline::new(2, 5),
        capacity,
        FETCH_TIMEOUT,
        Arc::new(AtomicBool::new(false)),
    )
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn qualifying_comment_is_reported_once_across_ticks() {
    let source = Arc::new(
        ScriptedSource::new()
            .then_batch(vec![
                raw_comment("c1", "just now", 2),
                raw_comment("c2", "5 minutes ago", 1),
                raw_comment("c3", "1 minute ago", 10),
            ])
            .then_batch(vec![raw_comment("c1", "1 minute ago", 2)]),
    );
    let reporter = Arc::new(RecordingReporter::new());
    let monitor = monitor_with(source.clone(), reporter.clone(), 100);

    let stats = monitor.run("https://v.example/1", 1.0, 30).await.unwrap();

    assert_eq!(reporter.emitted_ids(), vec!["c1"]);
    assert_eq!(stats.accepted, 1);
    assert_eq!(stats.reported, 1);
    assert_eq!(stats.rejected_too_old, 1);
    assert_eq!(stats.rejected_too_popular, 1);
    assert_eq!(stats.rejected_duplicate, 1);
    assert_eq!(stats.comments_fetched, 4);
}

#[tokio::test(start_paused = true)]
async fn accepted_comment_is_stamped_at_acceptance() {
    let source = Arc::new(ScriptedSource::new().then_batch(vec![raw_comment("c1", "just now", 0)]));
    let reporter = Arc::new(RecordingReporter::new());
    let monitor = monitor_with(source, reporter.clone(), 100);

    let before = chrono::Utc::now();
    monitor.run("v", 0.5, 10).await.unwrap();

    let emitted = reporter.emitted();
    assert_eq!(emitted.len(), 1);
    assert!(emitted[0].observed_at >= before);
    assert_eq!(emitted[0].like_count, 0);
}

#[tokio::test(start_paused = true)]
async fn many_comments_in_one_tick_are_all_reported_in_order() {
    let batch = (0..5)
        .map(|i| raw_comment(&format!("c{i}"), "just now", i))
        .collect();
    let source = Arc::new(ScriptedSource::new().then_batch(batch));
    let reporter = Arc::new(RecordingReporter::new());
    let monitor = monitor_with(source, reporter.clone(), 100);

    monitor.run("v", 0.5, 10).await.unwrap();

    assert_eq!(reporter.emitted_ids(), vec!["c0", "c1", "c2", "c3", "c4"]);
}

// ---------------------------------------------------------------------------
// Termination
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn two_minutes_at_ten_seconds_runs_twelve_ticks() {
    let source = Arc::new(ScriptedSource::new());
    let reporter = Arc::new(RecordingReporter::new());
    let monitor = monitor_with(source.clone(), reporter.clone(), 100);

    let started = tokio::time::Instant::now();
    let stats = monitor.run("v", 2.0, 10).await.unwrap();

    assert_eq!(stats.ticks, 12);
    assert_eq!(source.fetch_count(), 12);
    assert_eq!(stats.stop_reason, Some(StopReason::DeadlineReached));
    assert!(started.elapsed() <= Duration::from_secs(120));
}

#[tokio::test(start_paused = true)]
async fn interval_longer_than_budget_waits_only_until_deadline() {
    let source = Arc::new(ScriptedSource::new());
    let reporter = Arc::new(RecordingReporter::new());
    let monitor = monitor_with(source, reporter, 100);

    let started = tokio::time::Instant::now();
    let stats = monitor.run("v", 0.5, 600).await.unwrap();

    assert_eq!(stats.ticks, 1);
    assert_eq!(started.elapsed(), Duration::from_secs(30));
    assert_eq!(stats.stop_reason, Some(StopReason::DeadlineReached));
}

#[tokio::test(start_paused = true)]
async fn termination_releases_source_and_sends_summary() {
    let source = Arc::new(ScriptedSource::new().then_batch(vec![raw_comment("c1", "just now", 1)]));
    let reporter = Arc::new(RecordingReporter::new());
    let monitor = monitor_with(source.clone(), reporter.clone(), 100);

    let stats = monitor.run("v", 1.0, 20).await.unwrap();

    assert_eq!(source.shutdown_count(), 1);
    let summaries = reporter.summaries();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].ticks, stats.ticks);
    assert_eq!(summaries[0].accepted, 1);
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn cancelled_before_start_runs_no_ticks() {
    let source = Arc::new(ScriptedSource::new());
    let reporter = Arc::new(RecordingReporter::new());
    let monitor = monitor_with(source.clone(), reporter.clone(), 100);
    monitor.cancel_flag().store(true, Ordering::Relaxed);

    let stats = monitor.run("v", 5.0, 30).await.unwrap();

    assert_eq!(stats.ticks, 0);
    assert_eq!(source.fetch_count(), 0);
    assert_eq!(stats.stop_reason, Some(StopReason::Cancelled));
    assert_eq!(reporter.summaries().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn stop_before_start_is_recorded_as_stopped() {
    let source = Arc::new(ScriptedSource::new());
    let reporter = Arc::new(RecordingReporter::new());
    let monitor = monitor_with(source.clone(), reporter.clone(), 100);
    monitor.stop();

    let stats = monitor.run("v", 5.0, 30).await.unwrap();

    assert_eq!(stats.ticks, 0);
    assert_eq!(stats.stop_reason, Some(StopReason::Stopped));
    assert_eq!(reporter.summaries().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn stop_during_run_is_recorded_as_stopped() {
    let source = Arc::new(ScriptedSource::new());
    let reporter = Arc::new(RecordingReporter::new());
    let monitor = monitor_with(source, reporter, 100);

    let (result, ()) = tokio::join!(monitor.run("v", 5.0, 10), async {
        tokio::time::sleep(Duration::from_secs(35)).await;
        monitor.stop();
    });

    let stats = result.unwrap();
    assert_eq!(stats.ticks, 4);
    assert_eq!(stats.stop_reason, Some(StopReason::Stopped));
}

#[tokio::test(start_paused = true)]
async fn stop_request_does_not_outlive_its_run() {
    let source = Arc::new(ScriptedSource::new());
    let reporter = Arc::new(RecordingReporter::new());
    let monitor = monitor_with(source.clone(), reporter, 100);

    monitor.stop();
    let first = monitor.run("v", 0.5, 10).await.unwrap();
    assert_eq!(first.ticks, 0);

    let second = monitor.run("v", 0.5, 10).await.unwrap();
    assert_eq!(second.ticks, 3);
    assert_eq!(second.stop_reason, Some(StopReason::DeadlineReached));
    assert_eq!(source.fetch_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn cancellation_takes_effect_at_next_check() {
    let source = Arc::new(ScriptedSource::new());
    let reporter = Arc::new(RecordingReporter::new());
    let monitor = monitor_with(source, reporter, 100);
    let flag = monitor.cancel_flag();

    let (result, ()) = tokio::join!(monitor.run("v", 5.0, 10), async move {
        tokio::time::sleep(Duration::from_secs(35)).await;
        flag.store(true, Ordering::Relaxed);
    });

    let stats = result.unwrap();
    // Ticks at t=0, 10, 20, 30; the flag is seen when the wait ends at t=40.
    assert_eq!(stats.ticks, 4);
    assert_eq!(stats.stop_reason, Some(StopReason::Cancelled));
}

// ---------------------------------------------------------------------------
// Fault recovery
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn source_failure_is_an_empty_tick() {
    let source = Arc::new(
        ScriptedSource::new()
            .then_fail("browser crashed")
            .then_batch(vec![raw_comment("c1", "just now", 2)]),
    );
    let reporter = Arc::new(RecordingReporter::new());
    let monitor = monitor_with(source, reporter.clone(), 100);

    let stats = monitor.run("v", 1.0, 30).await.unwrap();

    assert_eq!(stats.source_failures, 1);
    assert_eq!(stats.ticks, 2);
    assert_eq!(reporter.emitted_ids(), vec!["c1"]);
}

#[tokio::test(start_paused = true)]
async fn hung_fetch_is_cut_off_by_timeout() {
    let source = Arc::new(
        ScriptedSource::new()
            .then_hang()
            .then_batch(vec![raw_comment("c1", "just now", 2)]),
    );
    let reporter = Arc::new(RecordingReporter::new());
    let monitor = monitor_with(source, reporter.clone(), 100);

    let started = tokio::time::Instant::now();
    let stats = monitor.run("v", 2.0, 30).await.unwrap();

    assert_eq!(stats.source_failures, 1);
    assert_eq!(reporter.emitted_ids(), vec!["c1"]);
    assert!(started.elapsed() <= Duration::from_secs(120) + FETCH_TIMEOUT);
}

#[tokio::test(start_paused = true)]
async fn reporter_failure_does_not_stop_run() {
    let source = Arc::new(
        ScriptedSource::new()
            .then_batch(vec![raw_comment("c1", "just now", 2)])
            .then_batch(vec![raw_comment("c2", "just now", 2)]),
    );
    let reporter = Arc::new(RecordingReporter::failing());
    let monitor = monitor_with(source, reporter.clone(), 100);

    let stats = monitor.run("v", 1.0, 30).await.unwrap();

    assert_eq!(stats.report_failures, 2);
    assert_eq!(stats.reported, 0);
    assert_eq!(stats.accepted, 2);
    assert_eq!(stats.ticks, 2);
}

#[tokio::test(start_paused = true)]
async fn malformed_comments_are_dropped_quietly() {
    let source = Arc::new(ScriptedSource::new().then_batch(vec![
        raw_comment("bad-likes", "just now", -1),
        raw_comment("bad-age", "", 0),
        raw_comment("ok", "2 minutes ago", 5),
    ]));
    let reporter = Arc::new(RecordingReporter::new());
    let monitor = monitor_with(source, reporter.clone(), 100);

    let stats = monitor.run("v", 0.5, 10).await.unwrap();

    assert_eq!(reporter.emitted_ids(), vec!["ok"]);
    assert_eq!(stats.rejected_too_popular, 1);
    assert_eq!(stats.rejected_too_old, 1);
}

// ---------------------------------------------------------------------------
// Parameters & configuration
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn invalid_parameters_never_start_the_run() {
    let source = Arc::new(ScriptedSource::new());
    let reporter = Arc::new(RecordingReporter::new());
    let monitor = monitor_with(source.clone(), reporter.clone(), 100);

    let short_interval = monitor.run("v", 1.0, 5).await;
    assert!(matches!(short_interval, Err(CommentWatchError::Config(_))));

    let zero_duration = monitor.run("v", 0.0, 30).await;
    assert!(matches!(zero_duration, Err(CommentWatchError::Config(_))));

    assert_eq!(source.fetch_count(), 0);
    assert!(reporter.summaries().is_empty());
}

#[tokio::test(start_paused = true)]
async fn from_config_uses_store_capacity() {
    let config = Config {
        max_comments_store: 2,
        ..Config::default()
    };
    let source = Arc::new(ScriptedSource::new());
    let reporter = Arc::new(RecordingReporter::new());
    let monitor = Monitor::from_config(&config, source, reporter.clone(), Arc::new(AtomicBool::new(false)));

    let mut session = MonitorSession::new("v", config.max_comments_store);
    let accepted = monitor
        .process(
            &mut session,
            vec![
                raw_comment("a", "just now", 0),
                raw_comment("b", "just now", 0),
                raw_comment("c", "just now", 0),
            ],
        )
        .await;

    assert_eq!(accepted.len(), 3);
    assert_eq!(session.store().len(), 2);
    assert!(!session.store().contains("a"));
}

// ---------------------------------------------------------------------------
// Dedup capacity through the loop
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn evicted_comment_is_reported_again() {
    let source = Arc::new(
        ScriptedSource::new()
            .then_batch(vec![raw_comment("a", "just now", 0)])
            .then_batch(vec![raw_comment("b", "just now", 0)])
            .then_batch(vec![raw_comment("a", "just now", 0)]),
    );
    let reporter = Arc::new(RecordingReporter::new());
    let monitor = monitor_with(source, reporter.clone(), 1);

    let stats = monitor.run("v", 0.5, 10).await.unwrap();

    assert_eq!(reporter.emitted_ids(), vec!["a", "b", "a"]);
    assert_eq!(stats.evicted, 2);
}
