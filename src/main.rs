use imovel_scout::{BrowserFetcher, DfImoveisScraper, HttpFetcher, PageFetcher};
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("🏠 Imóvel Scout - DFImóveis Map Scraper");
    info!("========================================");
    info!("");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let use_http = args.iter().any(|arg| arg == "--http");
    let url = args
        .iter()
        .find(|arg| !arg.starts_with("--"))
        .cloned()
        .unwrap_or_else(|| "https://www.dfimoveis.com.br/venda/df/brasilia/imoveis".to_string());

    let mut browser: Option<BrowserFetcher> = None;
    let fetcher: Arc<dyn PageFetcher> = if use_http {
        Arc::new(HttpFetcher::new()?)
    } else {
        let rendered = BrowserFetcher::new();
        browser = Some(rendered.clone());
        Arc::new(rendered)
    };

    let scraper = DfImoveisScraper::new(fetcher);

    info!("Scraping listing page: {}", url);
    info!("This will visit each property page for coordinates and details");
    info!("");

    let report = scraper.scrape(&url).await?;

    info!("\n✅ Scraped {} properties\n", report.total);

    for (i, property) in report.properties.iter().enumerate() {
        println!("{}. {} ({})", i + 1, property.title, property.price);
        println!("   ({}, {})", property.latitude, property.longitude);
        println!("   ID: {}", property.id);
        println!("   URL: {}", property.link);
        println!();
    }

    if !report.errors.is_empty() {
        warn!("{} page(s) failed:", report.errors.len());
        for error in &report.errors {
            warn!("   {}", error);
        }
    }

    // Save the full report for the map frontend
    let json = serde_json::to_string_pretty(&report)?;
    tokio::fs::write("scraped_properties.json", json).await?;
    info!("💾 Saved report to scraped_properties.json");

    if let Some(browser) = browser {
        browser.shutdown();
    }

    Ok(())
}
