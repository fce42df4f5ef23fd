use async_trait::async_trait;

use commentwatch_common::Comment;

use crate::stats::MonitorStats;

/// Pluggable sink for qualifying comments.
#[async_trait]
pub trait CommentReporter: Send + Sync {
    /// Report one newly accepted comment. The monitor logs failures and moves on.
    async fn emit(&self, video_ref: &str, comment: &Comment) -> anyhow::Result<()>;

    /// Report the summary of a finished run.
    async fn summary(&self, _video_ref: &str, _stats: &MonitorStats) -> anyhow::Result<()> {
        Ok(())
    }
}
