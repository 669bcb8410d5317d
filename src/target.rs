//! Single-target extraction
//!
//! Resolves a store address into its listing endpoint and output file, runs
//! the extractor and persists the records. Every failure is folded into the
//! returned [`ExtractionResult`].

use std::path::PathBuf;

use chrono::Local;

use crate::extract::{extract, listing_endpoint};
use crate::fetch::PageFetcher;
use crate::storage::{default_output_path, expand_output_path, save_json};
use crate::types::{ExtractionResult, ListingKind, PageRange};
use crate::url_format::{normalize, Scheme};

/// Options shared by every target of an invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractOptions {
    pub listing_kind: ListingKind,
    pub page_range: Option<PageRange>,
    pub output_directory: PathBuf,
    /// Explicit output file; may hold `{authority}` / `{listing}` placeholders
    pub output_path: Option<PathBuf>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            listing_kind: ListingKind::Products,
            page_range: None,
            output_directory: PathBuf::from("./"),
            output_path: None,
        }
    }
}

/// One extraction request.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetSpec {
    pub raw_url: String,
    pub options: ExtractOptions,
}

impl TargetSpec {
    pub fn new(raw_url: impl Into<String>, options: ExtractOptions) -> Self {
        Self {
            raw_url: raw_url.into(),
            options,
        }
    }
}

/// Run one target to completion. Never fails; see `success` / `error`.
pub fn run<F: PageFetcher + ?Sized>(fetcher: &F, spec: TargetSpec) -> ExtractionResult {
    let collected_at = Local::now();
    let TargetSpec { raw_url, options } = spec;
    let kind = options.listing_kind;

    let base = match normalize(&raw_url, Scheme::Https) {
        Ok(base) => base,
        Err(e) => {
            tracing::warn!(url = %raw_url, "invalid URL: {}", e);
            return ExtractionResult::failed(String::new(), collected_at, e);
        }
    };

    let endpoint = listing_endpoint(&base, kind);
    let output_path = match &options.output_path {
        Some(template) => expand_output_path(template, base.authority(), kind),
        None => default_output_path(&options.output_directory, base.authority(), kind),
    };

    let records = match extract(fetcher, &endpoint, kind.key(), options.page_range) {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!(endpoint = %endpoint, "extraction failed: {}", e);
            return ExtractionResult::failed(endpoint, collected_at, e);
        }
    };

    if let Err(e) = save_json(&output_path, &records) {
        tracing::warn!(path = %output_path.display(), "failed to write output: {}", e);
        return ExtractionResult::failed(
            endpoint,
            collected_at,
            format!("failed to write {}: {}", output_path.display(), e),
        );
    }

    tracing::info!(
        endpoint = %endpoint,
        records = records.len(),
        path = %output_path.display(),
        "saved {}",
        kind
    );
    ExtractionResult::succeeded(endpoint, collected_at, records, output_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::{records, ScriptedFetcher};
    use crate::storage::load_json;
    use serde_json::{json, Value};

    fn options(dir: &std::path::Path) -> ExtractOptions {
        ExtractOptions {
            output_directory: dir.to_path_buf(),
            ..ExtractOptions::default()
        }
    }

    fn store(base: &str, key: &str, pages: u32) -> ScriptedFetcher {
        let mut fetcher = ScriptedFetcher::new();
        for page in 1..=pages {
            fetcher = fetcher.json(
                &format!("{}/{}.json?page={}", base, key, page),
                json!({ key: records(page, 30) }),
            );
        }
        fetcher.json(&format!("{}/{}.json?page={}", base, key, pages + 1), json!({ key: [] }))
    }

    #[test]
    fn test_run_writes_default_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = store("https://bombas.com", "products", 2);

        let result = run(&fetcher, TargetSpec::new("bombas.com", options(dir.path())));

        assert!(result.success, "{:?}", result.error);
        assert!(result.error.is_none());
        assert_eq!(result.endpoint_attempted, "https://bombas.com/products.json");
        let path = dir.path().join("bombas.com.products.json");
        assert_eq!(result.output_file_path.as_deref(), Some(path.as_path()));
        assert_eq!(load_json(&path).unwrap(), Value::Array(result.records.clone()));
        assert_eq!(result.record_count(), 60);
    }

    #[test]
    fn test_run_collections_with_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = store("https://shop.com", "collections", 1);
        let explicit = dir.path().join("sub/{authority}.{listing}.out.json");
        let spec = TargetSpec::new(
            "https://shop.com/",
            ExtractOptions {
                listing_kind: ListingKind::Collections,
                output_path: Some(explicit),
                ..options(dir.path())
            },
        );

        let result = run(&fetcher, spec);

        assert!(result.success);
        let path = dir.path().join("sub/shop.com.collections.out.json");
        assert_eq!(result.output_file_path.as_deref(), Some(path.as_path()));
        assert!(path.exists());
    }

    #[test]
    fn test_run_with_page_range() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = store("https://bombas.com", "products", 3);
        let spec = TargetSpec::new(
            "bombas.com",
            ExtractOptions {
                page_range: Some(PageRange::new(1, 1).unwrap()),
                ..options(dir.path())
            },
        );

        let result = run(&fetcher, spec);
        assert_eq!(result.records, records(1, 30));
        assert_eq!(fetcher.requests().len(), 1);
    }

    #[test]
    fn test_run_missing_endpoint_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = ScriptedFetcher::new();

        let result = run(&fetcher, TargetSpec::new("google.com", options(dir.path())));

        assert!(!result.success);
        assert!(result.error.as_deref().is_some_and(|e| e.contains("404")));
        assert!(result.output_file_path.is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_run_non_json_response_fails() {
        let dir = tempfile::tempdir().unwrap();
        let url = "https://google.com/products.json?page=1";
        let fetcher = ScriptedFetcher::new().page(url, url, Some("text/html"), "<html></html>");

        let result = run(&fetcher, TargetSpec::new("google.com", options(dir.path())));

        assert!(!result.success);
        assert!(result.error.is_some_and(|e| !e.is_empty()));
        assert!(!dir.path().join("google.com.products.json").exists());
    }

    #[test]
    fn test_run_invalid_url_is_a_failed_result() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = ScriptedFetcher::new();

        let result = run(&fetcher, TargetSpec::new("bad$$$host", options(dir.path())));

        assert!(!result.success);
        assert!(result.error.unwrap().contains("malformed"));
        assert!(fetcher.requests().is_empty());
    }
}
