use anyhow::Result;
use async_trait::async_trait;

/// Common capability for turning a URL into final page HTML.
/// The pipeline treats a plain HTTP GET and a rendered browser fetch as the
/// same thing, which allows swapping strategies (or stubbing in tests)
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the final HTML for `url`. Fails with a transport error on
    /// non-2xx status, network failure, or timeout.
    async fn fetch_html(&self, url: &str) -> Result<String>;

    /// Get the name of the fetch strategy
    fn strategy_name(&self) -> &'static str;
}
