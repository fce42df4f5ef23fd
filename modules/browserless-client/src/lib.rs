pub mod error;

pub use error::{BrowserlessError, Result};

use std::time::Duration;

use serde::Serialize;

/// Viewport passed to the headless browser. Mirrors Chrome's device metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub device_scale_factor: f64,
    pub is_mobile: bool,
    pub has_touch: bool,
}

impl Viewport {
    /// 375x812 @3x, the iPhone X/11 Pro class of device.
    pub fn iphone() -> Self {
        Self {
            width: 375,
            height: 812,
            device_scale_factor: 3.0,
            is_mobile: true,
            has_touch: true,
        }
    }
}

/// Per-request rendering options for `/content`.
#[derive(Debug, Clone, Default)]
pub struct ContentOptions {
    pub user_agent: Option<String>,
    pub viewport: Option<Viewport>,
    /// Navigation timeout handed to the browser.
    pub goto_timeout: Option<Duration>,
    /// Wait for this selector to appear before capturing HTML.
    pub wait_for_selector: Option<String>,
}

impl ContentOptions {
    /// Emulate a phone with the given user agent.
    pub fn mobile(user_agent: &str) -> Self {
        Self {
            user_agent: Some(user_agent.to_string()),
            viewport: Some(Viewport::iphone()),
            ..Self::default()
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ContentRequest<'a> {
    url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_agent: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    viewport: Option<&'a Viewport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    goto_options: Option<GotoOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    wait_for_selector: Option<WaitForSelector<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GotoOptions {
    timeout: u64,
    wait_until: &'static str,
}

#[derive(Serialize)]
struct WaitForSelector<'a> {
    selector: &'a str,
    timeout: u64,
}

impl<'a> ContentRequest<'a> {
    fn new(url: &'a str, options: &'a ContentOptions) -> Self {
        let timeout_ms = options.goto_timeout.map(|t| t.as_millis() as u64);
        Self {
            url,
            user_agent: options.user_agent.as_deref(),
            viewport: options.viewport.as_ref(),
            goto_options: timeout_ms.map(|timeout| GotoOptions {
                timeout,
                wait_until: "networkidle2",
            }),
            wait_for_selector: options.wait_for_selector.as_deref().map(|selector| {
                WaitForSelector {
                    selector,
                    timeout: timeout_ms.unwrap_or(30_000),
                }
            }),
        }
    }
}

pub struct BrowserlessClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl BrowserlessClient {
    /// Build a client whose HTTP requests give up after `timeout`.
    pub fn new(base_url: &str, token: Option<&str>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BrowserlessError::Build(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
        })
    }

    fn endpoint(&self) -> String {
        let mut endpoint = format!("{}/content", self.base_url);
        if let Some(ref token) = self.token {
            endpoint.push_str(&format!("?token={token}"));
        }
        endpoint
    }

    /// Fetch fully-rendered HTML content for a URL via Browserless /content endpoint.
    pub async fn content(&self, url: &str, options: &ContentOptions) -> Result<String> {
        let body = ContentRequest::new(url, options);
        tracing::debug!(url, mobile = options.viewport.is_some(), "Requesting rendered page");

        let resp = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(BrowserlessError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.text().await?)
    }
}
