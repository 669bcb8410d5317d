//! Shopify storefront listing scraper
//!
//! Fetches the paginated `products.json` / `collections.json` listings a
//! Shopify store exposes and saves the aggregated records as JSON:
//! - URL normalization and validation
//! - Paginated extraction with redirect-aware endpoint rebasing
//! - Single-store and CSV-driven batch runs with a per-row audit log

pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod storage;
pub mod target;
pub mod types;
pub mod url_format;

pub use batch::{run_batch, BatchRequest, BatchRow};
pub use config::FetchConfig;
pub use error::{ArgumentError, CliError, ConfigError, FetchError, UrlError};
pub use extract::{extract, get_collections, get_products};
pub use fetch::{FetchedPage, HttpFetcher, PageFetcher};
pub use target::{run, ExtractOptions, TargetSpec};
pub use types::{ExtractionResult, ListingKind, PageRange};
pub use url_format::{is_valid_url, normalize, CanonicalUrl, Scheme};
