//! Recency classification of platform-rendered comment ages.
//!
//! Age phrases are looked up in two tables: exact "now" phrasings and
//! minute-count patterns. Supporting a new phrasing means adding a row, not
//! a branch. Anything the tables don't recognize is treated as old.

use regex::Regex;
use std::sync::LazyLock;

/// Phrases meaning "posted a moment ago". Compared after trimming, case-insensitively.
const NOW_PHRASES: &[&str] = &["just now", "now", "刚刚", "刚刚发布"];

/// Patterns whose first capture group is a minute count.
static MINUTE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)^(\d+)\s*(?:minutes?|mins?)\s+ago$",
        r"^(\d+)\s*分钟前?$",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// What an age phrase says about when a comment was posted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentAge {
    JustNow,
    MinutesAgo(u32),
    Unrecognized,
}

/// Classify a rendered age phrase. Never fails; unknown input is `Unrecognized`.
pub fn parse_age(age_text: &str) -> CommentAge {
    let text = age_text.trim();
    if text.is_empty() {
        return CommentAge::Unrecognized;
    }

    if NOW_PHRASES.iter().any(|p| p.eq_ignore_ascii_case(text)) {
        return CommentAge::JustNow;
    }

    MINUTE_PATTERNS
        .iter()
        .find_map(|re| re.captures(text))
        .and_then(|caps| caps[1].parse::<u32>().ok())
        .map(CommentAge::MinutesAgo)
        .unwrap_or(CommentAge::Unrecognized)
}

/// True when the comment is inside the recency window of `max_minutes_ago`.
pub fn is_recent(age_text: &str, max_minutes_ago: u32) -> bool {
    match parse_age(age_text) {
        CommentAge::JustNow => true,
        CommentAge::MinutesAgo(n) => n <= max_minutes_ago,
        CommentAge::Unrecognized => false,
    }
}
