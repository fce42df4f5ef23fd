use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::info;

use crate::error::CommentWatchError;

/// Mobile Safari UA used when rendering video pages.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (iPhone; CPU iPhone OS 15_0 like Mac OS X) AppleWebKit/605.1.15";

/// Shortest allowed pause between two polls.
pub const MIN_CHECK_INTERVAL_SECS: u64 = 10;

/// Which comment source a run is wired to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Render the page through a Browserless instance and scrape comments.
    Browserless,
    /// Generate demo comments locally.
    Simulated,
}

impl FromStr for SourceKind {
    type Err = CommentWatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "browserless" | "live" => Ok(Self::Browserless),
            "simulated" | "sim" => Ok(Self::Simulated),
            other => Err(CommentWatchError::Config(format!(
                "unknown comment source '{other}' (expected 'browserless' or 'simulated')"
            ))),
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Browserless => write!(f, "browserless"),
            Self::Simulated => write!(f, "simulated"),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Filters
    pub max_minutes_ago: u32,
    pub max_likes: i64,
    pub max_comments_store: usize,

    // Polling
    pub check_interval_secs: u64,

    // Comment source
    pub source: SourceKind,
    pub browserless_url: String,
    pub browserless_token: Option<String>,
    pub browser_timeout_secs: u64,
    pub browser_user_agent: String,

    // Reporting
    pub slack_webhook_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_minutes_ago: 2,
            max_likes: 5,
            max_comments_store: 100,
            check_interval_secs: 30,
            source: SourceKind::Simulated,
            browserless_url: "http://localhost:3000".to_string(),
            browserless_token: None,
            browser_timeout_secs: 30,
            browser_user_agent: DEFAULT_USER_AGENT.to_string(),
            slack_webhook_url: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults.
    /// Fails on unparsable values or when validation finds a problem.
    pub fn from_env() -> Result<Self, CommentWatchError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Config::from_env`] but reads values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CommentWatchError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            max_minutes_ago: parsed(&lookup, "MAX_MINUTES_AGO", defaults.max_minutes_ago)?,
            max_likes: parsed(&lookup, "MAX_LIKES", defaults.max_likes)?,
            max_comments_store: parsed(&lookup, "MAX_COMMENTS_STORE", defaults.max_comments_store)?,
            check_interval_secs: parsed(
                &lookup,
                "CHECK_INTERVAL_SECS",
                defaults.check_interval_secs,
            )?,
            source: parsed(&lookup, "COMMENT_SOURCE", defaults.source)?,
            browserless_url: lookup("BROWSERLESS_URL").unwrap_or(defaults.browserless_url),
            browserless_token: lookup("BROWSERLESS_TOKEN").filter(|t| !t.is_empty()),
            browser_timeout_secs: parsed(
                &lookup,
                "BROWSER_TIMEOUT_SECS",
                defaults.browser_timeout_secs,
            )?,
            browser_user_agent: lookup("BROWSER_USER_AGENT")
                .unwrap_or(defaults.browser_user_agent),
            slack_webhook_url: lookup("SLACK_WEBHOOK_URL").filter(|u| !u.is_empty()),
        };

        config.ensure_valid()?;
        Ok(config)
    }

    /// Every problem with this configuration, in field order. Empty when valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.max_minutes_ago == 0 {
            errors.push("MAX_MINUTES_AGO must be greater than 0".to_string());
        }
        if self.max_likes < 0 {
            errors.push("MAX_LIKES must not be negative".to_string());
        }
        if self.max_comments_store == 0 {
            errors.push("MAX_COMMENTS_STORE must be greater than 0".to_string());
        }
        if self.check_interval_secs < MIN_CHECK_INTERVAL_SECS {
            errors.push(format!(
                "CHECK_INTERVAL_SECS must be at least {MIN_CHECK_INTERVAL_SECS}"
            ));
        }
        if self.browser_timeout_secs == 0 {
            errors.push("BROWSER_TIMEOUT_SECS must be greater than 0".to_string());
        }
        if self.source == SourceKind::Browserless && self.browserless_url.trim().is_empty() {
            errors.push("BROWSERLESS_URL is required for the browserless source".to_string());
        }

        errors
    }

    /// Collapse [`Config::validate`] into a single fatal error.
    pub fn ensure_valid(&self) -> Result<(), CommentWatchError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(CommentWatchError::Config(errors.join("; ")))
        }
    }

    /// Timeout applied to a single comment fetch.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.browser_timeout_secs)
    }

    /// Log the effective configuration with secrets masked.
    pub fn log_redacted(&self) {
        info!(
            max_minutes_ago = self.max_minutes_ago,
            max_likes = self.max_likes,
            max_comments_store = self.max_comments_store,
            check_interval_secs = self.check_interval_secs,
            source = %self.source,
            browserless_url = self.browserless_url.as_str(),
            browserless_token = redact(self.browserless_token.as_deref()),
            browser_timeout_secs = self.browser_timeout_secs,
            slack_webhook = redact(self.slack_webhook_url.as_deref()),
            "Loaded configuration"
        );
    }
}

fn redact(secret: Option<&str>) -> &'static str {
    match secret {
        Some(_) => "***",
        None => "(unset)",
    }
}

fn parsed<F, T>(lookup: &F, key: &str, default: T) -> Result<T, CommentWatchError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| CommentWatchError::Config(format!("{key} has an invalid value: '{raw}'"))),
        _ => Ok(default),
    }
}
