pub mod models;
pub mod scrapers;

pub use models::{Property, ScrapingReport};
pub use scrapers::{
    BrowserFetcher, DfImoveisScraper, HttpFetcher, PageFetcher, ScrapeConfig, ScrapeError,
};
