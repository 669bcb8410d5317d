//! Shared data types for extraction requests and outcomes

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ArgumentError;

/// Which catalog view a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingKind {
    #[default]
    Products,
    Collections,
}

impl ListingKind {
    /// JSON key holding the listing array, also the endpoint's file stem.
    pub fn key(self) -> &'static str {
        match self {
            ListingKind::Products => "products",
            ListingKind::Collections => "collections",
        }
    }
}

impl fmt::Display for ListingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Closed, 1-based, inclusive interval of pages or table rows.
///
/// Only constructible through [`PageRange::new`], so a value of this type is
/// always `1 <= start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRange {
    start: u32,
    end: u32,
}

impl PageRange {
    pub fn new(start: i64, end: i64) -> Result<Self, ArgumentError> {
        if start < 1 || end < 1 || start > end || end > i64::from(u32::MAX) {
            return Err(ArgumentError::InvalidRange { start, end });
        }
        Ok(Self {
            start: start as u32,
            end: end as u32,
        })
    }

    /// Build from a raw argument list, which must hold exactly two values.
    pub fn from_values(values: &[i64]) -> Result<Self, ArgumentError> {
        match values {
            [start, end] => Self::new(*start, *end),
            other => Err(ArgumentError::RangeArity(other.len())),
        }
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn contains(&self, n: u32) -> bool {
        (self.start..=self.end).contains(&n)
    }

    pub fn iter(&self) -> std::ops::RangeInclusive<u32> {
        self.start..=self.end
    }
}

impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// Outcome of one single-target run.
///
/// Build through [`ExtractionResult::succeeded`] or
/// [`ExtractionResult::failed`]; exactly one of `success` and `error` holds.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    pub endpoint_attempted: String,
    pub collected_at: DateTime<Local>,
    pub success: bool,
    pub error: Option<String>,
    pub output_file_path: Option<PathBuf>,
    /// Aggregated listing records; persisted separately, not part of the summary
    #[serde(skip_serializing)]
    pub records: Vec<Value>,
}

impl ExtractionResult {
    pub fn succeeded(
        endpoint_attempted: String,
        collected_at: DateTime<Local>,
        records: Vec<Value>,
        output_file_path: PathBuf,
    ) -> Self {
        Self {
            endpoint_attempted,
            collected_at,
            success: true,
            error: None,
            output_file_path: Some(output_file_path),
            records,
        }
    }

    pub fn failed(
        endpoint_attempted: String,
        collected_at: DateTime<Local>,
        error: impl fmt::Display,
    ) -> Self {
        Self {
            endpoint_attempted,
            collected_at,
            success: false,
            error: Some(error.to_string()),
            output_file_path: None,
            records: Vec::new(),
        }
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Printable summary: every field except the records themselves.
    pub fn summary(&self) -> Value {
        serde_json::json!({
            "endpoint_attempted": self.endpoint_attempted,
            "collected_at": self.collected_at.to_rfc3339(),
            "success": self.success,
            "error": self.error,
            "output_file_path": self.output_file_path,
            "record_count": self.record_count(),
        })
    }
}
