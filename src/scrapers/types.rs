use std::time::Duration;

/// Tuning knobs for a scrape run.
///
/// The caps are cost/coverage heuristics carried over from running against
/// the live site, not protocol requirements.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Maximum candidate detail-page links taken from one listing page
    pub max_links: usize,
    /// How many detail pages are fetched concurrently per wave
    pub batch_size: usize,
    /// Per-fetch timeout applied by both fetch strategies
    pub fetch_timeout: Duration,
    /// Fixed post-load wait for deferred scripts to run (browser fetches).
    /// A heuristic wait, not a completion guarantee.
    pub settle_delay: Duration,
    /// Attempts per HTTP fetch before giving up
    pub retries: u32,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            max_links: 30,
            batch_size: 50,
            fetch_timeout: Duration::from_secs(20),
            settle_delay: Duration::from_secs(1),
            retries: 3,
        }
    }
}
