use crate::models::{Property, ScrapingReport};
use crate::scrapers::extract;
use crate::scrapers::traits::PageFetcher;
use crate::scrapers::types::ScrapeConfig;
use futures::future::join_all;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

/// Domain marker every input URL must carry.
const SITE_DOMAIN: &str = "dfimoveis.com.br";
const SITE_ORIGIN: &str = "https://www.dfimoveis.com.br";

/// Fatal scrape failures. Everything recoverable stays inside the
/// [`ScrapingReport`] instead of surfacing here.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("invalid URL: expected a dfimoveis.com.br listing page")]
    InvalidUrl,
    #[error("failed to fetch listing page {url}: {cause}")]
    ListingFetch { url: String, cause: anyhow::Error },
}

static DETAIL_LINK_SEL: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"a[href*="/imovel/"], a[href*="/aluguel/"], a[href*="/venda/"]"#).unwrap()
});
static CARD_LINK_SEL: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(".card-imovel a, .imovel-card a, [data-imovel] a, .property-card a").unwrap()
});
// Detail slugs start with a numeric listing id, e.g. /912345-casa-lago-sul
static NUMERIC_SLUG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\d+-").unwrap());

/// Collect candidate detail-page URLs from a listing page.
///
/// Anchors are matched either by known path segments of the site's listing
/// taxonomy or by membership in a card container. Relative hrefs resolve
/// against the site origin, off-site URLs are dropped, and the result is
/// deduplicated in first-seen order and truncated to `max_links`. An empty
/// result is a normal outcome, not an error.
pub fn collect_links(html: &str, max_links: usize) -> Vec<String> {
    let document = Html::parse_document(html);

    let mut seen = HashSet::new();
    let mut links = Vec::new();
    let mut push = |href: &str| {
        if let Some(absolute) = resolve_on_site(href) {
            if seen.insert(absolute.clone()) {
                links.push(absolute);
            }
        }
    };

    for anchor in document.select(&DETAIL_LINK_SEL) {
        if let Some(href) = anchor.value().attr("href") {
            if href.contains("/imovel/") || NUMERIC_SLUG_RE.is_match(href) {
                push(href);
            }
        }
    }

    for anchor in document.select(&CARD_LINK_SEL) {
        if let Some(href) = anchor.value().attr("href") {
            push(href);
        }
    }

    links.truncate(max_links);
    links
}

/// Resolve an href to an absolute URL on the target site, or `None` when it
/// lands off-site or cannot be parsed.
fn resolve_on_site(href: &str) -> Option<String> {
    let absolute = if href.starts_with("http") {
        Url::parse(href).ok()?
    } else {
        Url::parse(SITE_ORIGIN).ok()?.join(href).ok()?
    };

    let host = absolute.host_str()?;
    if host == SITE_DOMAIN || host.ends_with(&format!(".{SITE_DOMAIN}")) {
        Some(absolute.to_string())
    } else {
        None
    }
}

fn is_target_site(url: &str) -> bool {
    url.contains(SITE_DOMAIN)
}

/// End-to-end scraper for DFImóveis listing pages.
///
/// Drives the full pipeline: fetch the listing page, discover candidate
/// detail links, then fetch and extract every candidate in concurrent waves,
/// isolating per-item failures from the rest of the batch.
pub struct DfImoveisScraper {
    fetcher: Arc<dyn PageFetcher>,
    config: ScrapeConfig,
}

impl DfImoveisScraper {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self::with_config(fetcher, ScrapeConfig::default())
    }

    pub fn with_config(fetcher: Arc<dyn PageFetcher>, config: ScrapeConfig) -> Self {
        Self { fetcher, config }
    }

    /// Scrape one listing page into a [`ScrapingReport`].
    ///
    /// Never fails for recoverable conditions: an empty discovery or any
    /// number of per-item failures produce a report, not an error. The only
    /// fatal cases are an input URL off the target domain (rejected before
    /// any network activity) and an unreachable listing page.
    pub async fn scrape(&self, url: &str) -> Result<ScrapingReport, ScrapeError> {
        if !is_target_site(url) {
            return Err(ScrapeError::InvalidUrl);
        }

        info!("Fetching listing page via {}: {}", self.fetcher.strategy_name(), url);
        let listing_html =
            self.fetcher
                .fetch_html(url)
                .await
                .map_err(|cause| ScrapeError::ListingFetch {
                    url: url.to_string(),
                    cause,
                })?;

        let candidates = collect_links(&listing_html, self.config.max_links);
        info!("Found {} candidate detail links", candidates.len());

        if candidates.is_empty() {
            warn!("No detail links discovered on {}", url);
            return Ok(ScrapingReport::empty_with_error("no listings found"));
        }

        let mut properties = Vec::new();
        let mut errors = Vec::new();

        // Waves: every fetch in a wave settles before the next wave starts,
        // so a slow or failing page only ever holds up its own batch.
        let batch_size = self.config.batch_size.max(1);
        for batch in candidates.chunks(batch_size) {
            let outcomes = join_all(batch.iter().map(|link| self.fetch_and_extract(link))).await;

            for outcome in outcomes {
                match outcome {
                    Ok(property) => properties.push(property),
                    Err(message) => {
                        warn!("{}", message);
                        errors.push(message);
                    }
                }
            }
        }

        info!(
            "Scraped {} properties from {} candidates ({} failures)",
            properties.len(),
            candidates.len(),
            errors.len()
        );

        Ok(ScrapingReport::from_parts(properties, errors))
    }

    /// Fetch and extract a single detail page. Failures come back as the
    /// report-level error string for that URL.
    async fn fetch_and_extract(&self, link: &str) -> Result<Property, String> {
        debug!("Fetching detail page: {}", link);
        let html = self
            .fetcher
            .fetch_html(link)
            .await
            .map_err(|e| format!("{link}: {e}"))?;

        extract::extract_property(&html, link).ok_or_else(|| format!("{link}: no valid coordinates"))
    }
}
