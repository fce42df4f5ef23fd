use async_trait::async_trait;
use serde_json::json;
use tracing::warn;

use commentwatch_common::Comment;

use super::backend::CommentReporter;
use crate::stats::MonitorStats;

/// Slack incoming webhook reporter.
pub struct SlackReporter {
    webhook_url: String,
    http: reqwest::Client,
}

impl SlackReporter {
    pub fn new(webhook_url: String) -> Self {
        Self {
            webhook_url,
            http: reqwest::Client::new(),
        }
    }

    fn comment_text(video_ref: &str, comment: &Comment) -> String {
        format!(
            ":speech_balloon: *New comment* on <{video_ref}>\n\
             *{}*: {}\n\
             _{} | {} likes | seen {}_",
            comment.author,
            comment.content,
            comment.age_text,
            comment.like_count,
            comment.observed_at.format("%H:%M:%S"),
        )
    }

    async fn post(&self, payload: serde_json::Value) -> anyhow::Result<()> {
        let resp = self
            .http
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Slack webhook returned non-success");
            anyhow::bail!("Slack webhook returned {status}");
        }

        Ok(())
    }
}

#[async_trait]
impl CommentReporter for SlackReporter {
    async fn emit(&self, video_ref: &str, comment: &Comment) -> anyhow::Result<()> {
        let payload = json!({
            "text": Self::comment_text(video_ref, comment),
            "unfurl_links": false,
        });

        self.post(payload).await
    }

    async fn summary(&self, video_ref: &str, stats: &MonitorStats) -> anyhow::Result<()> {
        if stats.accepted == 0 {
            // Nothing to report
            return Ok(());
        }

        let text = format!(
            ":eyes: *Comment watch finished* for <{video_ref}>\n\
             Found {} new comment(s) over {} check(s).",
            stats.accepted, stats.ticks,
        );

        self.post(json!({ "text": text, "unfurl_links": false })).await
    }
}
