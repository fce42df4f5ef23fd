// Test doubles for the monitor loop.
//
// - ScriptedSource (CommentSource): plays back a queue of per-tick outcomes
// - RecordingReporter (CommentReporter): keeps everything it is given
//
// Plus `raw_comment` for building source records tersely.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;

use commentwatch_common::{Comment, RawComment};

use crate::notify::CommentReporter;
use crate::sources::CommentSource;
use crate::stats::MonitorStats;

/// Raw comment with throwaway author/content.
pub fn raw_comment(id: &str, age_text: &str, like_count: i64) -> RawComment {
    RawComment::new(id, format!("author-{id}"), format!("content of {id}"), age_text, like_count)
}

// ---------------------------------------------------------------------------
// ScriptedSource
// ---------------------------------------------------------------------------

enum Step {
    Batch(Vec<RawComment>),
    Fail(String),
    Hang,
}

/// Source that answers each fetch with the next scripted step.
/// Once the script runs out every fetch returns an empty batch.
/// Builder pattern: `.then_batch()`, `.then_fail()`, `.then_hang()`.
pub struct ScriptedSource {
    steps: Mutex<VecDeque<Step>>,
    fetches: AtomicUsize,
    shutdowns: AtomicUsize,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self {
            steps: Mutex::new(VecDeque::new()),
            fetches: AtomicUsize::new(0),
            shutdowns: AtomicUsize::new(0),
        }
    }

    pub fn then_batch(self, batch: Vec<RawComment>) -> Self {
        self.push(Step::Batch(batch))
    }

    pub fn then_fail(self, message: &str) -> Self {
        self.push(Step::Fail(message.to_string()))
    }

    /// Next fetch never completes on its own; the monitor's timeout must cut it off.
    pub fn then_hang(self) -> Self {
        self.push(Step::Hang)
    }

    fn push(self, step: Step) -> Self {
        self.steps.lock().unwrap().push_back(step);
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn shutdown_count(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }
}

impl Default for ScriptedSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommentSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch(&self, _video_ref: &str) -> Result<Vec<RawComment>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            None => Ok(Vec::new()),
            Some(Step::Batch(batch)) => Ok(batch),
            Some(Step::Fail(message)) => bail!("ScriptedSource: {message}"),
            Some(Step::Hang) => {
                tokio::time::sleep(Duration::from_secs(24 * 60 * 60)).await;
                Ok(Vec::new())
            }
        }
    }

    async fn shutdown(&self) -> Result<()> {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RecordingReporter
// ---------------------------------------------------------------------------

/// Reporter that records emitted comments and run summaries.
/// `failing()` builds one whose every call returns an error after recording.
#[derive(Default)]
pub struct RecordingReporter {
    emitted: Mutex<Vec<Comment>>,
    summaries: Mutex<Vec<MonitorStats>>,
    fail: bool,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn emitted(&self) -> Vec<Comment> {
        self.emitted.lock().unwrap().clone()
    }

    pub fn emitted_ids(&self) -> Vec<String> {
        self.emitted.lock().unwrap().iter().map(|c| c.id.clone()).collect()
    }

    pub fn summaries(&self) -> Vec<MonitorStats> {
        self.summaries.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommentReporter for RecordingReporter {
    async fn emit(&self, _video_ref: &str, comment: &Comment) -> Result<()> {
        self.emitted.lock().unwrap().push(comment.clone());
        if self.fail {
            bail!("RecordingReporter: emit failure");
        }
        Ok(())
    }

    async fn summary(&self, _video_ref: &str, stats: &MonitorStats) -> Result<()> {
        self.summaries.lock().unwrap().push(stats.clone());
        if self.fail {
            bail!("RecordingReporter: summary failure");
        }
        Ok(())
    }
}
