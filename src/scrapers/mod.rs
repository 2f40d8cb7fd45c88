pub mod browser;
pub mod dfimoveis;
pub mod extract;
pub mod http;
pub mod traits;
pub mod types;

pub use browser::BrowserFetcher;
pub use dfimoveis::{DfImoveisScraper, ScrapeError};
pub use http::HttpFetcher;
pub use traits::PageFetcher;
pub use types::ScrapeConfig;
