use async_trait::async_trait;
use tracing::info;

use commentwatch_common::Comment;

use super::backend::CommentReporter;
use crate::stats::MonitorStats;

/// Console reporter: one structured log line per accepted comment.
pub struct LogReporter;

#[async_trait]
impl CommentReporter for LogReporter {
    async fn emit(&self, video_ref: &str, comment: &Comment) -> anyhow::Result<()> {
        info!(
            video = video_ref,
            id = comment.id.as_str(),
            author = comment.author.as_str(),
            age = comment.age_text.as_str(),
            likes = comment.like_count,
            observed_at = %comment.observed_at.format("%H:%M:%S"),
            "New comment: {}",
            comment.content
        );
        Ok(())
    }

    async fn summary(&self, video_ref: &str, stats: &MonitorStats) -> anyhow::Result<()> {
        info!(
            video = video_ref,
            accepted = stats.accepted,
            ticks = stats.ticks,
            "Monitoring finished"
        );
        Ok(())
    }
}
