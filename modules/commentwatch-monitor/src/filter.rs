//! Filter pipeline: recency AND engagement, evaluated per raw comment.
//!
//! Runs before the dedup store so that a comment rejected here never
//! occupies a dedup slot.

use commentwatch_common::{Config, RawComment};

use crate::engagement::is_low_engagement;
use crate::recency::is_recent;

/// Outcome of running one comment through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Qualifies,
    TooOld,
    TooPopular,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterPipeline {
    pub max_minutes_ago: u32,
    pub max_likes: i64,
}

impl FilterPipeline {
    pub fn new(max_minutes_ago: u32, max_likes: i64) -> Self {
        Self {
            max_minutes_ago,
            max_likes,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.max_minutes_ago, config.max_likes)
    }

    /// Recency is checked first, so a comment that is both old and popular
    /// reports `TooOld`.
    pub fn evaluate(&self, comment: &RawComment) -> Verdict {
        if !is_recent(&comment.age_text, self.max_minutes_ago) {
            Verdict::TooOld
        } else if !is_low_engagement(comment.like_count, self.max_likes) {
            Verdict::TooPopular
        } else {
            Verdict::Qualifies
        }
    }

    pub fn qualifies(&self, comment: &RawComment) -> bool {
        self.evaluate(comment) == Verdict::Qualifies
    }
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
