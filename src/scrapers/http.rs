use crate::scrapers::traits::PageFetcher;
use crate::scrapers::types::ScrapeConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Direct HTTP fetch strategy with browser-like headers.
///
/// Cheaper than the rendered fetch but blind to coordinates that are only
/// written into the DOM by scripts. Retries transient failures with a short
/// linear backoff before giving up.
pub struct HttpFetcher {
    client: Client,
    retries: u32,
}

impl HttpFetcher {
    /// Create a fetcher with the default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(&ScrapeConfig::default())
    }

    pub fn with_config(config: &ScrapeConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.fetch_timeout)
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36")
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            retries: config.retries.max(1),
        })
    }

    async fn try_fetch(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            )
            .header("Accept-Language", "pt-BR,pt;q=0.9,en-US;q=0.8,en;q=0.7")
            .header("Cache-Control", "no-cache")
            .send()
            .await
            .context("Request failed")?;

        if !response.status().is_success() {
            anyhow::bail!("HTTP {}", response.status());
        }

        let html = response.text().await.context("Failed to read response body")?;
        debug!("Downloaded {} bytes from {}", html.len(), url);
        Ok(html)
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_html(&self, url: &str) -> Result<String> {
        let mut last_error = anyhow::anyhow!("no fetch attempts made");

        for attempt in 1..=self.retries {
            match self.try_fetch(url).await {
                Ok(html) => return Ok(html),
                Err(e) => {
                    warn!("Attempt {}/{} failed for {}: {}", attempt, self.retries, url, e);
                    last_error = e;
                    if attempt < self.retries {
                        tokio::time::sleep(Duration::from_secs(u64::from(attempt))).await;
                    }
                }
            }
        }

        Err(last_error)
    }

    fn strategy_name(&self) -> &'static str {
        "http"
    }
}
