use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use commentwatch_common::Comment;

use crate::dedup::DedupStore;
use crate::stats::{MonitorStats, StopReason};

/// Lifecycle of one monitoring run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Running,
    Stopping,
    Terminated,
}

/// Ephemeral state for a single run over one video.
///
/// Owned by the monitor for the duration of `Monitor::run`; the dedup store
/// inside is the run's log of accepted comments.
#[derive(Debug)]
pub struct MonitorSession {
    video_ref: String,
    state: MonitorState,
    started_at: Option<DateTime<Utc>>,
    deadline: Option<Instant>,
    store: DedupStore,
    stats: MonitorStats,
}

impl MonitorSession {
    pub fn new(video_ref: &str, store_capacity: usize) -> Self {
        Self {
            video_ref: video_ref.to_string(),
            state: MonitorState::Idle,
            started_at: None,
            deadline: None,
            store: DedupStore::new(store_capacity),
            stats: MonitorStats::default(),
        }
    }

    /// Idle -> Running. The deadline is measured on tokio's clock.
    pub(crate) fn start(&mut self, budget: Duration) {
        debug_assert_eq!(self.state, MonitorState::Idle);
        self.started_at = Some(Utc::now());
        self.deadline = Some(Instant::now() + budget);
        self.state = MonitorState::Running;
    }

    /// Running -> Stopping. The first reason recorded wins.
    pub(crate) fn begin_stopping(&mut self, reason: StopReason) {
        if self.state == MonitorState::Running {
            self.state = MonitorState::Stopping;
            self.stats.stop_reason = Some(reason);
        }
    }

    /// Stopping -> Terminated. Returns the final stats.
    pub(crate) fn terminate(&mut self) -> MonitorStats {
        self.state = MonitorState::Terminated;
        self.stats.evicted = self.store.evicted();
        self.stats.clone()
    }

    /// Time left before the deadline; zero once it has passed or before start.
    pub fn remaining(&self) -> Duration {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
            .unwrap_or(Duration::ZERO)
    }

    pub fn video_ref(&self) -> &str {
        &self.video_ref
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn tick_count(&self) -> u64 {
        self.stats.ticks
    }

    pub fn stats(&self) -> &MonitorStats {
        &self.stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut MonitorStats {
        &mut self.stats
    }

    pub fn store(&self) -> &DedupStore {
        &self.store
    }

    pub(crate) fn store_mut(&mut self) -> &mut DedupStore {
        &mut self.store
    }

    /// Comments accepted so far and still held by the store, oldest first.
    pub fn accepted_comments(&self) -> impl Iterator<Item = &Comment> {
        self.store.iter()
    }
}
