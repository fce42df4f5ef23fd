//! Comment sources: where raw comments for a video come from.
//!
//! The monitor only sees the [`CommentSource`] trait. Which implementation a
//! run uses is decided once, from configuration, by [`from_config`].

pub mod browserless;
pub mod markup;
pub mod simulated;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use commentwatch_common::{Config, RawComment, SourceKind};

pub use browserless::BrowserlessSource;
pub use simulated::SimulatedSource;

#[async_trait]
pub trait CommentSource: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &str;

    /// Fetch the comments currently visible for `video_ref`.
    async fn fetch(&self, video_ref: &str) -> Result<Vec<RawComment>>;

    /// Release whatever the source holds. Called once when a run terminates.
    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}

/// Build the source selected by `config.source`.
pub fn from_config(config: &Config) -> Result<Arc<dyn CommentSource>> {
    let source: Arc<dyn CommentSource> = match config.source {
        SourceKind::Browserless => Arc::new(BrowserlessSource::from_config(config)?),
        SourceKind::Simulated => Arc::new(SimulatedSource::new()),
    };
    Ok(source)
}
