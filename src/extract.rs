//! Paginated listing extraction
//!
//! Storefronts expose listings as `<base>/<key>.json?page=N`, each page a
//! JSON object holding an array under `<key>`. Pages are fetched one at a
//! time and aggregated until the first page without records or the end of
//! the requested page range.

use serde_json::Value;
use url::Url;

use crate::error::FetchError;
use crate::fetch::{FetchedPage, PageFetcher};
use crate::types::{ListingKind, PageRange};
use crate::url_format::CanonicalUrl;

/// Endpoint serving `kind` listings for a store.
pub fn listing_endpoint(base: &CanonicalUrl, kind: ListingKind) -> String {
    base.join(&format!("{}.json", kind.key()))
}

/// Fetch and aggregate every productive page of `endpoint`.
///
/// Pagination starts at page 1 and stops at the first page whose
/// `listing_key` is missing or empty, or at the first page outside
/// `page_range`. A range that does not contain page 1 therefore yields
/// nothing and sends no request. Any failed page aborts the whole
/// extraction; records gathered so far are dropped with it.
///
/// If a response is served from a different URL than requested, later pages
/// are requested from the redirect target.
pub fn extract<F: PageFetcher + ?Sized>(
    fetcher: &F,
    endpoint: &str,
    listing_key: &str,
    page_range: Option<PageRange>,
) -> Result<Vec<Value>, FetchError> {
    let mut endpoint = endpoint.to_string();
    let mut page: u32 = 1;
    let mut aggregate = Vec::new();

    loop {
        if page_range.is_some_and(|r| !r.contains(page)) {
            break;
        }

        let page_url = format!("{}?page={}", endpoint, page);
        tracing::debug!(page, url = %page_url, "requesting listing page");
        let fetched = fetcher.get(&page_url)?;

        if fetched.final_url != page_url {
            let rebased = rebase(&fetched.final_url)?;
            if rebased != endpoint {
                tracing::debug!(from = %endpoint, to = %rebased, "endpoint redirected");
                endpoint = rebased;
            }
        }

        check_content_type(&fetched, &page_url)?;

        let data: Value = serde_json::from_str(&fetched.body).map_err(|source| FetchError::Json {
            url: page_url.clone(),
            source,
        })?;

        match take_records(data, listing_key) {
            Some(records) => {
                tracing::debug!(page, count = records.len(), "page collected");
                aggregate.extend(records);
            }
            None => break,
        }

        page = match page.checked_add(1) {
            Some(next) => next,
            None => break,
        };
    }

    tracing::info!(endpoint = %endpoint, records = aggregate.len(), "extraction finished");
    Ok(aggregate)
}

/// Extract `kind` listings from a store's canonical base URL.
pub fn extract_listing<F: PageFetcher + ?Sized>(
    fetcher: &F,
    base: &CanonicalUrl,
    kind: ListingKind,
    page_range: Option<PageRange>,
) -> Result<Vec<Value>, FetchError> {
    extract(fetcher, &listing_endpoint(base, kind), kind.key(), page_range)
}

pub fn get_products<F: PageFetcher + ?Sized>(
    fetcher: &F,
    base: &CanonicalUrl,
    page_range: Option<PageRange>,
) -> Result<Vec<Value>, FetchError> {
    extract_listing(fetcher, base, ListingKind::Products, page_range)
}

pub fn get_collections<F: PageFetcher + ?Sized>(
    fetcher: &F,
    base: &CanonicalUrl,
    page_range: Option<PageRange>,
) -> Result<Vec<Value>, FetchError> {
    extract_listing(fetcher, base, ListingKind::Collections, page_range)
}

/// `scheme://host[:port]/path` of a redirect target, without query.
fn rebase(final_url: &str) -> Result<String, FetchError> {
    let parsed = Url::parse(final_url).map_err(|source| FetchError::Redirect {
        url: final_url.to_string(),
        source,
    })?;
    let host = parsed.host_str().unwrap_or_default();
    let authority = match parsed.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };
    Ok(format!("{}://{}{}", parsed.scheme(), authority, parsed.path()))
}

/// Only `application/json` bodies are parsed; block pages and login walls
/// usually come back as HTML with a 200.
fn check_content_type(page: &FetchedPage, url: &str) -> Result<(), FetchError> {
    let declared = page.content_type.as_deref().unwrap_or("");
    let media_type = declared.split(';').next().unwrap_or("").trim();
    if media_type.eq_ignore_ascii_case("application/json") {
        Ok(())
    } else {
        Err(FetchError::ContentType {
            content_type: declared.to_string(),
            url: url.to_string(),
        })
    }
}

/// Records of a productive page, `None` otherwise.
fn take_records(data: Value, listing_key: &str) -> Option<Vec<Value>> {
    match data {
        Value::Object(mut map) => match map.remove(listing_key) {
            Some(Value::Array(records)) if !records.is_empty() => Some(records),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::{records, ScriptedFetcher, JSON};
    use crate::url_format::{normalize, Scheme};
    use serde_json::json;

    const ENDPOINT: &str = "https://shop.example.com/products.json";

    fn page_url(n: u32) -> String {
        format!("{}?page={}", ENDPOINT, n)
    }

    fn two_page_store() -> ScriptedFetcher {
        ScriptedFetcher::new()
            .json(&page_url(1), json!({ "products": records(1, 30) }))
            .json(&page_url(2), json!({ "products": records(2, 30) }))
            .json(&page_url(3), json!({ "products": [] }))
    }

    #[test]
    fn test_extract_all_pages() {
        let fetcher = two_page_store();
        let products = extract(&fetcher, ENDPOINT, "products", None).unwrap();

        assert_eq!(products.len(), 60);
        assert_eq!(products[0]["id"], 1001);
        assert_eq!(products[59]["id"], 2030);
        assert_eq!(fetcher.requests(), vec![page_url(1), page_url(2), page_url(3)]);
    }

    #[test]
    fn test_extract_first_page_only() {
        let fetcher = two_page_store();
        let range = PageRange::new(1, 1).unwrap();
        let products = extract(&fetcher, ENDPOINT, "products", Some(range)).unwrap();

        assert_eq!(products, records(1, 30));
        assert_eq!(fetcher.requests(), vec![page_url(1)]);
    }

    #[test]
    fn test_extract_range_without_first_page_is_empty() {
        let fetcher = two_page_store().json(&page_url(3), json!({ "products": records(3, 5) }));
        let range = PageRange::new(2, 3).unwrap();
        let products = extract(&fetcher, ENDPOINT, "products", Some(range)).unwrap();

        assert!(products.is_empty());
        assert!(fetcher.requests().is_empty());
    }

    #[test]
    fn test_extract_range_stops_after_last_page() {
        let fetcher = two_page_store().json(&page_url(3), json!({ "products": records(3, 5) }));
        let range = PageRange::new(1, 2).unwrap();
        let products = extract(&fetcher, ENDPOINT, "products", Some(range)).unwrap();

        assert_eq!(products.len(), 60);
        assert_eq!(fetcher.requests(), vec![page_url(1), page_url(2)]);
    }

    #[test]
    fn test_extract_stops_at_empty_page_inside_range() {
        let fetcher = ScriptedFetcher::new()
            .json(&page_url(1), json!({ "products": records(1, 30) }))
            .json(&page_url(2), json!({ "products": [] }));
        let range = PageRange::new(1, 5).unwrap();
        let products = extract(&fetcher, ENDPOINT, "products", Some(range)).unwrap();

        assert_eq!(products.len(), 30);
        assert_eq!(fetcher.requests().len(), 2);
    }

    #[test]
    fn test_extract_stops_when_key_missing() {
        let fetcher = ScriptedFetcher::new()
            .json(&page_url(1), json!({ "products": records(1, 2) }))
            .json(&page_url(2), json!({ "collections": records(9, 2) }));
        let products = extract(&fetcher, ENDPOINT, "products", None).unwrap();
        assert_eq!(products, records(1, 2));

        let fetcher = ScriptedFetcher::new().json(&page_url(1), json!(["not", "an", "object"]));
        assert!(extract(&fetcher, ENDPOINT, "products", None).unwrap().is_empty());
    }

    #[test]
    fn test_extract_rejects_non_json_content_type() {
        let fetcher = ScriptedFetcher::new().page(
            &page_url(1),
            &page_url(1),
            Some("text/html; charset=utf-8"),
            "<html>login</html>",
        );
        let err = extract(&fetcher, ENDPOINT, "products", None).unwrap_err();
        assert!(matches!(err, FetchError::ContentType { .. }), "got {err:?}");

        let fetcher = ScriptedFetcher::new().page(&page_url(1), &page_url(1), None, "{}");
        let err = extract(&fetcher, ENDPOINT, "products", None).unwrap_err();
        assert!(matches!(err, FetchError::ContentType { .. }), "got {err:?}");
    }

    #[test]
    fn test_content_type_parameters_are_ignored() {
        let body = json!({ "products": [] }).to_string();
        for ct in ["application/json", "Application/JSON; charset=UTF-8", JSON] {
            let fetcher = ScriptedFetcher::new().page(&page_url(1), &page_url(1), Some(ct), &body);
            assert!(extract(&fetcher, ENDPOINT, "products", None).is_ok(), "content type {ct}");
        }
    }

    #[test]
    fn test_extract_follows_redirected_endpoint() {
        let moved = "https://www.example.com/products.json";
        let fetcher = ScriptedFetcher::new()
            .page(
                &page_url(1),
                &format!("{}?page=1", moved),
                Some(JSON),
                &json!({ "products": records(1, 3) }).to_string(),
            )
            .json(&format!("{}?page=2", moved), json!({ "products": records(2, 3) }))
            .json(&format!("{}?page=3", moved), json!({ "products": [] }));

        let products = extract(&fetcher, ENDPOINT, "products", None).unwrap();
        assert_eq!(products.len(), 6);
        assert_eq!(
            fetcher.requests(),
            vec![page_url(1), format!("{}?page=2", moved), format!("{}?page=3", moved)]
        );
    }

    #[test]
    fn test_rebase_keeps_port_and_drops_query() {
        assert_eq!(
            rebase("http://localhost:8080/shop/products.json?page=4#x").unwrap(),
            "http://localhost:8080/shop/products.json"
        );
        assert_eq!(
            rebase("https://example.com:443/products.json").unwrap(),
            "https://example.com/products.json"
        );
        assert!(matches!(rebase("not a url"), Err(FetchError::Redirect { .. })));
    }

    #[test]
    fn test_extract_aborts_on_failed_page() {
        let fetcher = ScriptedFetcher::new()
            .json(&page_url(1), json!({ "products": records(1, 30) }))
            .status(&page_url(2), 503);
        let err = extract(&fetcher, ENDPOINT, "products", None).unwrap_err();
        assert!(matches!(err, FetchError::Http { status: 503, .. }));

        let fetcher = ScriptedFetcher::new().down(&page_url(1));
        let err = extract(&fetcher, ENDPOINT, "products", None).unwrap_err();
        assert!(matches!(err, FetchError::Transport { .. }));
    }

    #[test]
    fn test_extract_rejects_malformed_json() {
        let fetcher = ScriptedFetcher::new().page(&page_url(1), &page_url(1), Some(JSON), "{\"products\": [");
        let err = extract(&fetcher, ENDPOINT, "products", None).unwrap_err();
        assert!(matches!(err, FetchError::Json { .. }));
    }

    #[test]
    fn test_get_collections_uses_collections_endpoint() {
        let base = normalize("shop.example.com", Scheme::Https).unwrap();
        let fetcher = ScriptedFetcher::new()
            .json(
                "https://shop.example.com/collections.json?page=1",
                json!({ "collections": records(1, 4) }),
            )
            .json("https://shop.example.com/collections.json?page=2", json!({ "collections": [] }));

        let collections = get_collections(&fetcher, &base, None).unwrap();
        assert_eq!(collections.len(), 4);

        let products = get_products(&fetcher, &base, None);
        assert!(matches!(products, Err(FetchError::Http { status: 404, .. })));
    }
}
