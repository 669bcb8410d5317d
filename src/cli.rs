//! Command line surface
//!
//! `url` extracts a single store, `batch` every store of a CSV table. Option
//! values are validated here, before any extraction starts.

use std::path::PathBuf;

use chrono::Local;
use clap::{Args, Parser, Subcommand};

use crate::batch::{default_log_path, run_batch, BatchRequest};
use crate::error::{ArgumentError, CliError};
use crate::fetch::PageFetcher;
use crate::storage::validate_output_path;
use crate::target::{self, ExtractOptions, TargetSpec};
use crate::types::{ListingKind, PageRange};

#[derive(Parser, Debug)]
#[command(name = "shopify-scrape", version, about = "Scrape products.json / collections.json listings from Shopify stores")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Extract one store
    Url {
        /// Store URL, scheme optional (e.g. bombas.com)
        url: String,

        #[command(flatten)]
        listing: ListingArgs,
    },
    /// Extract every store listed in a CSV file
    Batch {
        /// CSV file whose first row is a header
        urls_file_path: PathBuf,

        /// Name of the column holding store URLs
        url_column: String,

        /// Inclusive range of data rows to process, e.g. `-r 1 50`
        #[arg(short, long = "row-range", num_args = 2, value_names = ["START", "END"], allow_negative_numbers = true)]
        row_range: Option<Vec<i64>>,

        /// Log each attempt to logs/<timestamp>_log.csv
        #[arg(short, long)]
        log: bool,

        /// Log each attempt to this CSV file instead
        #[arg(long = "log-file")]
        log_file: Option<PathBuf>,

        #[command(flatten)]
        listing: ListingArgs,
    },
}

/// Options applied to every extracted store.
#[derive(Args, Debug, Clone)]
pub struct ListingArgs {
    /// Destination folder
    #[arg(short, long = "dest-path", default_value = "./")]
    pub dest_path: PathBuf,

    /// Output file, defaults to <dest-path>/<domain>.<products|collections>.json.
    /// `{authority}` and `{listing}` are substituted per store.
    #[arg(short, long = "file-path")]
    pub file_path: Option<String>,

    /// Inclusive page range, e.g. `-p 1 3`. There are 30 items per page.
    #[arg(short, long = "page-range", num_args = 2, value_names = ["START", "END"], allow_negative_numbers = true)]
    pub page_range: Option<Vec<i64>>,

    /// Extract /collections.json instead of /products.json
    #[arg(short, long)]
    pub collections: bool,
}

impl ListingArgs {
    pub fn to_options(&self) -> Result<ExtractOptions, ArgumentError> {
        let page_range = self.page_range.as_deref().map(PageRange::from_values).transpose()?;
        let output_path = self.file_path.as_deref().map(validate_output_path).transpose()?;
        let listing_kind = if self.collections {
            ListingKind::Collections
        } else {
            ListingKind::Products
        };
        Ok(ExtractOptions {
            listing_kind,
            page_range,
            output_directory: self.dest_path.clone(),
            output_path,
        })
    }
}

/// Execute a parsed command line.
///
/// Extraction failures are reported on stdout and do not make this fail;
/// only argument and batch configuration errors do.
pub fn run<F: PageFetcher + ?Sized>(cli: Cli, fetcher: &F) -> Result<(), CliError> {
    match cli.command {
        Command::Url { url, listing } => {
            let options = listing.to_options()?;
            let result = target::run(fetcher, TargetSpec::new(url, options));
            println!("{}", serde_json::to_string_pretty(&result.summary())?);
        }
        Command::Batch {
            urls_file_path,
            url_column,
            row_range,
            log,
            log_file,
            listing,
        } => {
            let row_range = row_range.as_deref().map(PageRange::from_values).transpose()?;
            let log_path = match (log_file, log) {
                (Some(path), _) => Some(path),
                (None, true) => Some(default_log_path(Local::now())),
                (None, false) => None,
            };
            let request = BatchRequest {
                table_path: urls_file_path,
                url_column,
                row_range,
                options: listing.to_options()?,
                log_path,
            };

            let rows = run_batch(fetcher, &request)?;
            for row in &rows {
                let status = match &row.result.error {
                    None => "ok".to_string(),
                    Some(error) => error.clone(),
                };
                println!("{}\t{}\t{}", row.source_row_index, row.target_url, status);
            }
            let succeeded = rows.iter().filter(|r| r.result.success).count();
            println!("{}/{} targets succeeded", succeeded, rows.len());
        }
    }
    Ok(())
}
