use crate::scrapers::traits::PageFetcher;
use crate::scrapers::types::ScrapeConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

/// Rendered fetch strategy: loads the page in headless Chrome so deferred
/// scripts can write coordinates into the DOM before the snapshot is taken.
///
/// The Chrome process is shared by every fetch: launched lazily on first use
/// and kept until [`BrowserFetcher::shutdown`]. Each fetch opens its own tab
/// and closes it whether or not the navigation succeeded, so concurrent
/// fetches never step on each other.
#[derive(Clone)]
pub struct BrowserFetcher {
    browser: Arc<Mutex<Option<Browser>>>,
    settle_delay: Duration,
    fetch_timeout: Duration,
}

impl BrowserFetcher {
    /// Create a fetcher with the default configuration. Chrome is not
    /// launched until the first fetch.
    pub fn new() -> Self {
        Self::with_config(&ScrapeConfig::default())
    }

    pub fn with_config(config: &ScrapeConfig) -> Self {
        Self {
            browser: Arc::new(Mutex::new(None)),
            settle_delay: config.settle_delay,
            fetch_timeout: config.fetch_timeout,
        }
    }

    /// Get the shared browser handle, launching Chrome on first use.
    fn shared_browser(cell: &Mutex<Option<Browser>>) -> Result<Browser> {
        let mut guard = cell.lock().expect("browser handle poisoned");
        if let Some(browser) = guard.as_ref() {
            return Ok(browser.clone());
        }

        info!("Launching headless Chrome...");
        let options = LaunchOptions::default_builder()
            .headless(true)
            .build()
            .context("Failed to build launch options")?;
        let browser = Browser::new(options).context("Failed to launch Chrome browser")?;

        *guard = Some(browser.clone());
        Ok(browser)
    }

    fn fetch_blocking(
        browser: &Browser,
        url: &str,
        settle_delay: Duration,
        timeout: Duration,
    ) -> Result<String> {
        let tab = browser.new_tab().context("Failed to open tab")?;
        tab.set_default_timeout(timeout);

        let result = (|| -> Result<String> {
            tab.navigate_to(url)?;
            tab.wait_until_navigated()?;

            // Heuristic wait for deferred scripts, not a completion guarantee
            thread::sleep(settle_delay);

            let html_result = tab.evaluate("document.documentElement.outerHTML", false)?;
            let html = html_result
                .value
                .and_then(|value| value.as_str().map(str::to_string))
                .unwrap_or_default();

            if html.is_empty() {
                anyhow::bail!("Page rendered to empty HTML");
            }
            Ok(html)
        })();

        // The tab must go away even when navigation failed
        let _ = tab.close(true);
        result
    }

    /// Tear down the shared Chrome process. Later fetches relaunch it.
    pub fn shutdown(&self) {
        let mut guard = self.browser.lock().expect("browser handle poisoned");
        if guard.take().is_some() {
            info!("Shut down headless Chrome");
        }
    }
}

impl Default for BrowserFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageFetcher for BrowserFetcher {
    async fn fetch_html(&self, url: &str) -> Result<String> {
        debug!("Rendering {}", url);

        let cell = Arc::clone(&self.browser);
        let target = url.to_string();
        let settle_delay = self.settle_delay;
        let timeout = self.fetch_timeout;

        // CDP calls are blocking; keep them off the async workers.
        let html = tokio::task::spawn_blocking(move || -> Result<String> {
            let browser = Self::shared_browser(&cell)?;
            Self::fetch_blocking(&browser, &target, settle_delay, timeout)
        })
        .await
        .context("Browser fetch task failed")??;

        debug!("Rendered {} bytes from {}", html.len(), url);
        Ok(html)
    }

    fn strategy_name(&self) -> &'static str {
        "browser"
    }
}
