//! URL normalization and validation
//!
//! Turns loosely formed store addresses (`example.com`, `www.example.com/`,
//! `HTTP://Example.com/path?x=1`) into a canonical absolute URL:
//!
//! 1. default a missing scheme (`example.com` -> `https://example.com`)
//! 2. split into scheme / authority / path (RFC 3986, appendix B)
//! 3. check the scheme and authority against their grammars
//! 4. re-assemble without query or fragment

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::UrlError;

pub const MAX_URL_LEN: usize = 2048;

/// Longest host name accepted, excluding port.
const MAX_HOST_LEN: usize = 253;

static SCHEME_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://").unwrap());

static URL_SPLIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:([^:/?#]+):)?(?://([^/?#]*))?([^?#]*)(?:\?([^#]*))?(?:#(.*))?$").unwrap()
});

// http(s) plus the defanged look-alikes and ftp(s)
static SCHEME_FORMAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:http|hxxp|ftp|fxp)s?$").unwrap());

// At least one label plus a TLD (labels 1-63 chars, no leading/trailing
// dash, TLD without dashes), or literal localhost; optional port.
static DOMAIN_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?P<host>(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z0-9]{1,63}|localhost)(?::\d{1,5})?$",
    )
    .unwrap()
});

/// Scheme of a canonical URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    #[default]
    Https,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

impl FromStr for Scheme {
    type Err = UrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("https") {
            Ok(Scheme::Https)
        } else if s.eq_ignore_ascii_case("http") {
            Ok(Scheme::Http)
        } else {
            Err(UrlError::UnsupportedScheme(s.to_string()))
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated, scheme-normalized absolute URL without query or fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalUrl {
    scheme: Scheme,
    authority: String,
    path: String,
}

impl CanonicalUrl {
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Host with optional `:port`, lowercased.
    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Path without trailing slash; empty for the site root.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Append a path segment, e.g. `products.json`.
    pub fn join(&self, segment: &str) -> String {
        format!("{}/{}", self, segment.trim_start_matches('/'))
    }
}

impl fmt::Display for CanonicalUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}{}", self.scheme, self.authority, self.path)
    }
}

struct Parts<'a> {
    scheme: Option<&'a str>,
    authority: Option<&'a str>,
    path: &'a str,
}

fn split(url: &str) -> Parts<'_> {
    // The split pattern matches every input, including the empty string.
    match URL_SPLIT.captures(url) {
        Some(caps) => Parts {
            scheme: caps.get(1).map(|m| m.as_str()),
            authority: caps.get(2).map(|m| m.as_str()),
            path: caps.get(3).map_or("", |m| m.as_str()),
        },
        None => Parts {
            scheme: None,
            authority: None,
            path: url,
        },
    }
}

fn check_length(url: &str) -> Result<(), UrlError> {
    if url.is_empty() {
        return Err(UrlError::Empty);
    }
    let len = url.chars().count();
    if len > MAX_URL_LEN {
        return Err(UrlError::TooLong {
            len,
            max: MAX_URL_LEN,
        });
    }
    Ok(())
}

fn check_scheme(scheme: &str) -> Result<(), UrlError> {
    if SCHEME_FORMAT.is_match(scheme) {
        Ok(())
    } else {
        Err(UrlError::UnsupportedScheme(scheme.to_string()))
    }
}

fn check_domain(authority: &str) -> Result<(), UrlError> {
    if authority.is_empty() {
        return Err(UrlError::MissingDomain);
    }
    let host_ok = DOMAIN_FORMAT
        .captures(authority)
        .and_then(|caps| caps.name("host"))
        .is_some_and(|host| host.as_str().len() <= MAX_HOST_LEN);
    if host_ok {
        Ok(())
    } else {
        Err(UrlError::MalformedDomain(authority.to_string()))
    }
}

/// Check that `raw` is an absolute URL with a known scheme and a well formed
/// domain. Unlike [`normalize`], no scheme is defaulted.
pub fn is_valid_url(raw: &str) -> Result<(), UrlError> {
    let url = raw.trim();
    check_length(url)?;

    let parts = split(url);
    let scheme = parts.scheme.ok_or(UrlError::MissingScheme)?;
    check_scheme(scheme)?;
    check_domain(parts.authority.unwrap_or(""))
}

/// Normalize a loosely formed URL into a [`CanonicalUrl`].
///
/// A missing scheme is replaced with `default_scheme`. Query strings and
/// fragments are dropped, trailing slashes are trimmed from the path and
/// scheme/authority are lowercased, so normalizing a canonical URL's string
/// form yields the same URL.
pub fn normalize(raw: &str, default_scheme: Scheme) -> Result<CanonicalUrl, UrlError> {
    let trimmed = raw.trim();
    check_length(trimmed)?;

    let with_scheme = if SCHEME_PREFIX.is_match(trimmed) {
        trimmed.to_string()
    } else if let Some(rest) = trimmed.strip_prefix("//") {
        format!("{}://{}", default_scheme, rest)
    } else {
        format!("{}://{}", default_scheme, trimmed)
    };
    check_length(&with_scheme)?;

    let parts = split(&with_scheme);
    let raw_scheme = parts.scheme.ok_or(UrlError::MissingScheme)?;
    let authority = parts.authority.unwrap_or("");
    if authority.is_empty() {
        return Err(UrlError::MissingDomain);
    }
    check_scheme(raw_scheme)?;
    check_domain(authority)?;

    // hxxp/ftp pass the grammar above but are never emitted
    let scheme: Scheme = raw_scheme.parse()?;

    Ok(CanonicalUrl {
        scheme,
        authority: authority.to_ascii_lowercase(),
        path: parts.path.trim_end_matches('/').to_string(),
    })
}
