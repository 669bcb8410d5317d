//! Error types
//!
//! Target-local failures (`UrlError`, `FetchError`) end up stringified in an
//! `ExtractionResult`. `ConfigError` and `ArgumentError` abort the whole
//! invocation before any network activity.

use thiserror::Error;

/// Input could not be turned into a valid absolute URL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("no URL specified")]
    Empty,

    #[error("URL exceeds its maximum length of {max} characters (given length={len})")]
    TooLong { len: usize, max: usize },

    #[error("no URL scheme specified")]
    MissingScheme,

    #[error("URL scheme must be http(s) (given scheme={0})")]
    UnsupportedScheme(String),

    #[error("no URL domain specified")]
    MissingDomain,

    #[error("URL domain malformed (domain={0})")]
    MalformedDomain(String),
}

/// A single page request failed; aborts the current extraction only.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} for {url}")]
    Http { status: u16, url: String },

    #[error("incorrect response content type {content_type:?} for {url}")]
    ContentType { content_type: String, url: String },

    #[error("failed to fetch {url}: {message}")]
    Transport { url: String, message: String },

    #[error("invalid JSON body from {url}: {source}")]
    Json {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid redirect target {url}: {source}")]
    Redirect {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Structural precondition of a batch run was violated.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} does not exist")]
    MissingTable(String),

    #[error("{0} must be a .csv file")]
    NotCsv(String),

    #[error("{0} seems to be empty")]
    EmptyTable(String),

    #[error("failed to read {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("{column} is not in the header row of {path}")]
    MissingColumn { column: String, path: String },

    #[error("row range {start}..={end} is not within the {rows} data rows of the table")]
    RowRangeOutOfBounds { start: u32, end: u32, rows: usize },

    #[error("failed to open log file {path}: {source}")]
    LogFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create output directory {path}: {source}")]
    OutputDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Malformed option value, rejected before any extraction attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    #[error("range must be positive, non-zero and ordered (start <= end); got ({start}, {end})")]
    InvalidRange { start: i64, end: i64 },

    #[error("range requires exactly 2 integers, got {0}")]
    RangeArity(usize),

    #[error("unsafe output path {0:?}")]
    UnsafePath(String),
}

/// Fatal failure of a command line invocation.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Argument(#[from] ArgumentError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to render summary: {0}")]
    Summary(#[from] serde_json::Error),
}
