//! Comment extraction from a rendered video page.
//!
//! Each comment is an element tagged `data-e2e="comment-item"` carrying a
//! `data-comment-id` attribute. Author, text, age and like count live in
//! descendant elements tagged `comment-author`, `comment-text`,
//! `comment-time` and `comment-like-count`.

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use commentwatch_common::RawComment;

/// Selector the browser waits for before the page is captured.
pub const COMMENT_ITEM_SELECTOR: &str = r#"[data-e2e="comment-item"]"#;

/// Like count recorded when the rendered count is missing or unreadable.
/// Negative, so the engagement filter rejects the comment.
pub const UNKNOWN_LIKES: i64 = -1;

/// Labels rendered in place of a number on a comment nobody has liked yet.
const NO_LIKES_LABELS: &[&str] = &["", "like", "likes", "赞", "点赞"];

static ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<[^>]*data-e2e="comment-item"[^>]*>"#).unwrap());
static ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"data-comment-id="([^"]+)""#).unwrap());
static AUTHOR_RE: LazyLock<Regex> = LazyLock::new(|| field_re("comment-author"));
static TEXT_RE: LazyLock<Regex> = LazyLock::new(|| field_re("comment-text"));
static TIME_RE: LazyLock<Regex> = LazyLock::new(|| field_re("comment-time"));
static LIKES_RE: LazyLock<Regex> = LazyLock::new(|| field_re("comment-like-count"));
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

fn field_re(marker: &str) -> Regex {
    Regex::new(&format!(r#"<(\w+)[^>]*data-e2e="{marker}"[^>]*>"#)).unwrap()
}

/// Pull every comment record out of rendered page HTML, in page order.
/// Items without an id are skipped.
pub fn extract_comments(html: &str) -> Vec<RawComment> {
    let starts: Vec<usize> = ITEM_RE.find_iter(html).map(|m| m.start()).collect();
    let mut comments = Vec::with_capacity(starts.len());

    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(html.len());
        let block = &html[start..end];

        let Some(id) = ID_RE.captures(block).map(|c| decode_entities(&c[1])) else {
            debug!(offset = start, "Comment item without id, skipping");
            continue;
        };

        let like_count = match field_text(&LIKES_RE, block) {
            Some(label) => parse_like_count(&label).unwrap_or_else(|| {
                debug!(id = id.as_str(), label = label.as_str(), "Unreadable like count");
                UNKNOWN_LIKES
            }),
            None => {
                debug!(id = id.as_str(), "Comment item without like count");
                UNKNOWN_LIKES
            }
        };

        comments.push(RawComment {
            author: field_text(&AUTHOR_RE, block).unwrap_or_default(),
            content: field_text(&TEXT_RE, block).unwrap_or_default(),
            age_text: field_text(&TIME_RE, block).unwrap_or_default(),
            like_count,
            id,
        });
    }

    comments
}

/// Text content of the first element opened by `re`, up to its closing tag.
fn field_text(re: &Regex, block: &str) -> Option<String> {
    let caps = re.captures(block)?;
    let open = caps.get(0)?;
    let rest = &block[open.end()..];
    let close = format!("</{}>", &caps[1]);
    let inner = rest.find(&close).map_or(rest, |end| &rest[..end]);
    let text = TAG_RE.replace_all(inner, "");
    Some(decode_entities(text.trim()))
}

/// Parse a rendered like count: "12", "1,024", "1.2k", "3.4w", "2万", "1.2M", "3亿".
/// The no-number labels of an unliked comment ("Like", "赞") are zero.
/// Anything else unreadable is `None`. A leading minus sign is preserved so
/// bad data stays visible downstream.
pub fn parse_like_count(text: &str) -> Option<i64> {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
    if NO_LIKES_LABELS.contains(&cleaned.to_lowercase().as_str()) {
        return Some(0);
    }

    let last = cleaned.chars().last()?;
    let multiplier = match last {
        'k' | 'K' => 1_000.0,
        'w' | 'W' | '万' => 10_000.0,
        'm' | 'M' => 1_000_000.0,
        '亿' => 100_000_000.0,
        _ => 1.0,
    };
    let number = if multiplier == 1.0 {
        cleaned.as_str()
    } else {
        &cleaned[..cleaned.len() - last.len_utf8()]
    };

    match number.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => Some((n * multiplier).round() as i64),
        _ => None,
    }
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}
