use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// --- Source records ---

/// A comment as handed over by a comment source, before any classification.
///
/// `like_count` is signed so that a misbehaving source can hand us a negative
/// count; the engagement filter rejects those instead of panicking on them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawComment {
    pub id: String,
    pub author: String,
    pub content: String,
    /// Age as rendered by the platform, e.g. "just now", "3 minutes ago", "刚刚".
    pub age_text: String,
    pub like_count: i64,
}

impl RawComment {
    pub fn new(
        id: impl Into<String>,
        author: impl Into<String>,
        content: impl Into<String>,
        age_text: impl Into<String>,
        like_count: i64,
    ) -> Self {
        Self {
            id: id.into(),
            author: author.into(),
            content: content.into(),
            age_text: age_text.into(),
            like_count,
        }
    }
}

// --- Accepted comments ---

/// A comment that passed the filters and was admitted to the dedup store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub author: String,
    pub content: String,
    pub age_text: String,
    pub like_count: u64,
    /// Stamped by the monitor at the moment of acceptance.
    pub observed_at: DateTime<Utc>,
}

impl Comment {
    /// Promote a raw record. Returns `None` for a negative like count.
    pub fn from_raw(raw: RawComment, observed_at: DateTime<Utc>) -> Option<Self> {
        let like_count = u64::try_from(raw.like_count).ok()?;
        Some(Self {
            id: raw.id,
            author: raw.author,
            content: raw.content,
            age_text: raw.age_text,
            like_count,
            observed_at,
        })
    }
}

impl std::fmt::Display for Comment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} ({} | {} likes)",
            self.author, self.content, self.age_text, self.like_count
        )
    }
}
