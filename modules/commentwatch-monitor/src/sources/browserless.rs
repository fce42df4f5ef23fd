use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use browserless_client::{BrowserlessClient, ContentOptions};
use commentwatch_common::{CommentWatchError, Config, RawComment};

use super::markup::{extract_comments, COMMENT_ITEM_SELECTOR};
use super::CommentSource;

/// Live source: renders the video page in a remote headless Chrome with
/// mobile emulation and scrapes the comment list out of the HTML.
pub struct BrowserlessSource {
    client: BrowserlessClient,
    options: ContentOptions,
}

impl BrowserlessSource {
    pub fn new(client: BrowserlessClient, options: ContentOptions) -> Self {
        Self { client, options }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let timeout = Duration::from_secs(config.browser_timeout_secs);
        let client = BrowserlessClient::new(
            &config.browserless_url,
            config.browserless_token.as_deref(),
            timeout,
        )
        .map_err(|e| CommentWatchError::Config(e.to_string()))?;

        let mut options = ContentOptions::mobile(&config.browser_user_agent);
        options.goto_timeout = Some(timeout);
        options.wait_for_selector = Some(COMMENT_ITEM_SELECTOR.to_string());

        Ok(Self::new(client, options))
    }
}

#[async_trait]
impl CommentSource for BrowserlessSource {
    fn name(&self) -> &str {
        "browserless"
    }

    async fn fetch(&self, video_ref: &str) -> Result<Vec<RawComment>> {
        let html = self
            .client
            .content(video_ref, &self.options)
            .await
            .map_err(|e| CommentWatchError::SourceUnavailable(e.to_string()))?;

        let comments = extract_comments(&html);
        info!(
            video = video_ref,
            html_bytes = html.len(),
            comments = comments.len(),
            "Extracted comments from rendered page"
        );
        Ok(comments)
    }
}
