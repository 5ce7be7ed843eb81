use async_trait::async_trait;
use std::time::Duration;

use crate::config::CalendarConfig;
use crate::error::{Result, ScrapeError};

/// Anything that can hand back the activities page markup.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self) -> Result<String>;

    fn describe(&self) -> String;
}

pub struct HtmlFetcher {
    client: reqwest::Client,
    url: String,
}

fn build_client(timeout: Duration, user_agent: &str) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
        .map_err(|e| ScrapeError::Fetch(format!("failed to build HTTP client: {e}")))
}

impl HtmlFetcher {
    pub fn new(url: impl Into<String>, timeout: Duration, user_agent: &str) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout, user_agent)?,
            url: url.into(),
        })
    }

    pub fn from_config(cfg: &CalendarConfig) -> Result<Self> {
        Self::new(cfg.url.clone(), cfg.timeout, &cfg.user_agent)
    }
}

#[async_trait]
impl PageSource for HtmlFetcher {
    async fn fetch(&self) -> Result<String> {
        tracing::info!(url = %self.url, "fetching activities page");

        let response = self
            .client
            .get(&self.url)
            .header("Accept", "text/html,application/xhtml+xml")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Fetch(format!("HTTP {status}")));
        }

        let html = response.text().await?;
        tracing::info!(bytes = html.len(), "downloaded activities page");
        Ok(html)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Fixed markup, used by the CLI `--file` mode and by tests.
pub struct StaticPage {
    html: String,
    label: String,
}

impl StaticPage {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            label: "static page".to_string(),
        }
    }

    pub fn labeled(html: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            label: label.into(),
        }
    }
}

#[async_trait]
impl PageSource for StaticPage {
    async fn fetch(&self) -> Result<String> {
        Ok(self.html.clone())
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}
