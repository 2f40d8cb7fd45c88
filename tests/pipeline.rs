//! End-to-end pipeline tests against a stub page fetcher.

use async_trait::async_trait;
use imovel_scout::{DfImoveisScraper, PageFetcher, ScrapeError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const LISTING_URL: &str = "https://www.dfimoveis.com.br/venda/df/brasilia/apartamento";

/// In-memory fetcher: serves canned HTML per URL and counts every call.
struct StubFetcher {
    pages: HashMap<String, Result<String, String>>,
    calls: AtomicUsize,
}

impl StubFetcher {
    fn new() -> Self {
        Self {
            pages: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), Ok(html.to_string()));
        self
    }

    fn with_failure(mut self, url: &str, message: &str) -> Self {
        self.pages.insert(url.to_string(), Err(message.to_string()));
        self
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for StubFetcher {
    async fn fetch_html(&self, url: &str) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.pages.get(url) {
            Some(Ok(html)) => Ok(html.clone()),
            Some(Err(message)) => Err(anyhow::anyhow!("{}", message)),
            None => Err(anyhow::anyhow!("HTTP 404 Not Found")),
        }
    }

    fn strategy_name(&self) -> &'static str {
        "stub"
    }
}

fn listing_page(hrefs: &[&str]) -> String {
    let anchors: String = hrefs
        .iter()
        .map(|href| format!(r#"<a href="{href}">card</a>"#))
        .collect();
    format!("<html><body>{anchors}</body></html>")
}

fn detail_page(lat: &str, lng: &str) -> String {
    format!(
        r#"<html><body>
            <h1>Apartamento na Asa Sul</h1>
            <span class="valor">R$ 1.250,00</span>
            <script>latitude = {lat}; longitude = {lng};</script>
        </body></html>"#
    )
}

#[tokio::test]
async fn scenario_three_listings_all_succeed() {
    let detail_urls = [
        "https://www.dfimoveis.com.br/imovel/1-a",
        "https://www.dfimoveis.com.br/imovel/2-b",
        "https://www.dfimoveis.com.br/imovel/3-c",
    ];
    let mut stub = StubFetcher::new().with_page(
        LISTING_URL,
        &listing_page(&["/imovel/1-a", "/imovel/2-b", "/imovel/3-c"]),
    );
    for url in detail_urls {
        stub = stub.with_page(url, &detail_page("-15.80", "-47.90"));
    }

    let scraper = DfImoveisScraper::new(Arc::new(stub));
    let report = scraper.scrape(LISTING_URL).await.unwrap();

    assert!(report.success);
    assert_eq!(report.total, 3);
    assert_eq!(report.total, report.properties.len());
    assert!(report.errors.is_empty());
    for property in &report.properties {
        assert_eq!(property.latitude, -15.80);
        assert_eq!(property.longitude, -47.90);
        assert_eq!(property.price_value, 1250.0);
    }
}

#[tokio::test]
async fn scenario_no_listings_found() {
    let stub = StubFetcher::new().with_page(LISTING_URL, &listing_page(&[]));

    let scraper = DfImoveisScraper::new(Arc::new(stub));
    let report = scraper.scrape(LISTING_URL).await.unwrap();

    assert!(!report.success);
    assert_eq!(report.total, 0);
    assert!(report.properties.is_empty());
    assert_eq!(report.errors, vec!["no listings found".to_string()]);
}

#[tokio::test]
async fn scenario_partial_failure_keeps_survivors() {
    let ok_url = "https://www.dfimoveis.com.br/imovel/1-ok";
    let bad_url = "https://www.dfimoveis.com.br/imovel/2-timeout";

    let stub = StubFetcher::new()
        .with_page(LISTING_URL, &listing_page(&["/imovel/1-ok", "/imovel/2-timeout"]))
        .with_page(ok_url, &detail_page("-15.7801", "-47.9292"))
        .with_failure(bad_url, "operation timed out");

    let scraper = DfImoveisScraper::new(Arc::new(stub));
    let report = scraper.scrape(LISTING_URL).await.unwrap();

    assert!(report.success);
    assert_eq!(report.total, 1);
    assert_eq!(report.properties[0].link, ok_url);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains(bad_url));
    assert!(report.errors[0].contains("operation timed out"));
}

#[tokio::test]
async fn detail_page_without_coordinates_is_a_soft_failure() {
    let no_coords_url = "https://www.dfimoveis.com.br/imovel/1-sem-mapa";

    let stub = StubFetcher::new()
        .with_page(LISTING_URL, &listing_page(&["/imovel/1-sem-mapa"]))
        .with_page(no_coords_url, "<html><body><h1>Casa</h1></body></html>");

    let scraper = DfImoveisScraper::new(Arc::new(stub));
    let report = scraper.scrape(LISTING_URL).await.unwrap();

    assert!(!report.success);
    assert_eq!(report.total, 0);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains(no_coords_url));
    assert!(report.errors[0].contains("no valid coordinates"));
}

#[tokio::test]
async fn wrong_domain_is_rejected_before_any_fetch() {
    let stub = Arc::new(StubFetcher::new());
    let scraper = DfImoveisScraper::new(Arc::clone(&stub) as Arc<dyn PageFetcher>);

    let result = scraper.scrape("https://example.com").await;

    assert!(matches!(result, Err(ScrapeError::InvalidUrl)));
    assert_eq!(stub.call_count(), 0);
}

#[tokio::test]
async fn unreachable_listing_page_is_fatal() {
    let stub = StubFetcher::new().with_failure(LISTING_URL, "connection refused");

    let scraper = DfImoveisScraper::new(Arc::new(stub));
    let result = scraper.scrape(LISTING_URL).await;

    match result {
        Err(ScrapeError::ListingFetch { url, cause }) => {
            assert_eq!(url, LISTING_URL);
            assert!(cause.to_string().contains("connection refused"));
        }
        other => panic!("expected ListingFetch error, got {other:?}"),
    }
}

#[tokio::test]
async fn surfaced_errors_are_capped_at_ten() {
    let hrefs: Vec<String> = (0..15).map(|i| format!("/imovel/{i}-broken")).collect();
    let href_refs: Vec<&str> = hrefs.iter().map(String::as_str).collect();

    // Every detail fetch 404s; only the listing page resolves.
    let stub = StubFetcher::new().with_page(LISTING_URL, &listing_page(&href_refs));

    let scraper = DfImoveisScraper::new(Arc::new(stub));
    let report = scraper.scrape(LISTING_URL).await.unwrap();

    assert!(!report.success);
    assert_eq!(report.total, 0);
    assert_eq!(report.errors.len(), 10);
}
