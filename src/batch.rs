//! Batch extraction over a CSV table of store URLs
//!
//! Table problems (missing file, wrong format, unknown column, row range out
//! of bounds) abort before any request is made. After that every selected row
//! is attempted in order and recorded, whether or not its extraction
//! succeeded.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::error::ConfigError;
use crate::fetch::PageFetcher;
use crate::target::{self, ExtractOptions, TargetSpec};
use crate::types::{ExtractionResult, PageRange};

pub const LOG_HEADER: [&str; 5] = [
    "source_url",
    "endpoint_attempted",
    "collected_at",
    "error",
    "output_file_path",
];

/// Outcome for one processed table row.
#[derive(Debug, Clone)]
pub struct BatchRow {
    /// 1-based data row index (the header is row 0)
    pub source_row_index: usize,
    pub target_url: String,
    pub result: ExtractionResult,
}

#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub table_path: PathBuf,
    pub url_column: String,
    /// Data rows to process; all rows when absent
    pub row_range: Option<PageRange>,
    pub options: ExtractOptions,
    pub log_path: Option<PathBuf>,
}

/// Sink for per-row audit lines.
pub trait AuditLog {
    fn record(&mut self, row: &BatchRow) -> io::Result<()>;
}

/// Used when no log file was requested.
pub struct NullAuditLog;

impl AuditLog for NullAuditLog {
    fn record(&mut self, _row: &BatchRow) -> io::Result<()> {
        Ok(())
    }
}

/// CSV audit log, appended to and flushed after every row.
pub struct CsvAuditLog {
    writer: csv::Writer<File>,
}

impl CsvAuditLog {
    /// Open `path` for appending; the header is written only to an empty file.
    pub fn open(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let is_new = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .quote_style(csv::QuoteStyle::Always)
            .from_writer(file);
        if is_new {
            writer.write_record(LOG_HEADER)?;
            writer.flush()?;
        }
        Ok(Self { writer })
    }
}

impl AuditLog for CsvAuditLog {
    fn record(&mut self, row: &BatchRow) -> io::Result<()> {
        let result = &row.result;
        let output = result
            .output_file_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        self.writer.write_record([
            row.target_url.as_str(),
            result.endpoint_attempted.as_str(),
            result.collected_at.to_rfc3339().as_str(),
            result.error.as_deref().unwrap_or(""),
            output.as_str(),
        ])?;
        self.writer.flush()
    }
}

/// Audit log for an optional path; a no-op sink when there is none.
pub fn open_audit_log(path: Option<&Path>) -> Result<Box<dyn AuditLog>, ConfigError> {
    match path {
        Some(path) => {
            let log = CsvAuditLog::open(path).map_err(|source| ConfigError::LogFile {
                path: path.display().to_string(),
                source,
            })?;
            Ok(Box::new(log))
        }
        None => Ok(Box::new(NullAuditLog)),
    }
}

/// `logs/<unix seconds>_log.csv`
pub fn default_log_path(now: DateTime<Local>) -> PathBuf {
    PathBuf::from("logs").join(format!("{}_log.csv", now.timestamp()))
}

/// URL cells of a table's data rows, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTable {
    pub urls: Vec<String>,
}

impl UrlTable {
    /// Read `column` from a headed CSV file. Rows too short to hold the
    /// column yield an empty URL.
    pub fn load(path: &Path, column: &str) -> Result<Self, ConfigError> {
        let display = path.display().to_string();

        if !path.is_file() {
            return Err(ConfigError::MissingTable(display));
        }
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if !is_csv {
            return Err(ConfigError::NotCsv(display));
        }
        let size = fs::metadata(path)
            .map(|m| m.len())
            .map_err(|e| ConfigError::Unreadable {
                path: display.clone(),
                source: e.into(),
            })?;
        if size == 0 {
            return Err(ConfigError::EmptyTable(display));
        }

        let unreadable = |source: csv::Error| ConfigError::Unreadable {
            path: display.clone(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .map_err(unreadable)?;

        let headers = reader.headers().map_err(unreadable)?.clone();
        if headers.iter().all(|h| h.trim().is_empty()) {
            return Err(ConfigError::EmptyTable(display.clone()));
        }
        let index = headers
            .iter()
            .position(|h| h.trim_start_matches('\u{feff}').trim() == column)
            .ok_or_else(|| ConfigError::MissingColumn {
                column: column.to_string(),
                path: display.clone(),
            })?;

        let mut urls = Vec::new();
        for record in reader.records() {
            let record = record.map_err(unreadable)?;
            urls.push(record.get(index).unwrap_or("").trim().to_string());
        }
        Ok(Self { urls })
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// Run every selected row of the table through the single-target
/// extraction, one at a time and in ascending row order.
///
/// Only table and log-file problems are errors; per-row failures are in the
/// returned rows (and the audit log).
pub fn run_batch<F: PageFetcher + ?Sized>(
    fetcher: &F,
    request: &BatchRequest,
) -> Result<Vec<BatchRow>, ConfigError> {
    let table = UrlTable::load(&request.table_path, &request.url_column)?;

    let rows = match request.row_range {
        Some(range) => {
            if range.end() as usize > table.len() {
                return Err(ConfigError::RowRangeOutOfBounds {
                    start: range.start(),
                    end: range.end(),
                    rows: table.len(),
                });
            }
            range.start() as usize..=range.end() as usize
        }
        // empty when the table has no data rows
        None => 1..=table.len(),
    };

    let out_dir = &request.options.output_directory;
    fs::create_dir_all(out_dir).map_err(|source| ConfigError::OutputDirectory {
        path: out_dir.display().to_string(),
        source,
    })?;

    let mut log = open_audit_log(request.log_path.as_deref())?;

    let total = rows.clone().count();
    tracing::info!(
        table = %request.table_path.display(),
        rows = total,
        "starting batch extraction"
    );

    let mut processed = Vec::with_capacity(total);
    for (n, row_index) in rows.enumerate() {
        let url = table.urls[row_index - 1].clone();
        tracing::info!("[{}/{}] row {}: {}", n + 1, total, row_index, url);

        let spec = TargetSpec::new(url.clone(), request.options.clone());
        let result = target::run(fetcher, spec);

        let row = BatchRow {
            source_row_index: row_index,
            target_url: url,
            result,
        };
        if let Err(e) = log.record(&row) {
            tracing::warn!(row = row_index, "failed to write audit log line: {}", e);
        }
        processed.push(row);
    }

    let succeeded = processed.iter().filter(|r| r.result.success).count();
    tracing::info!(succeeded, attempted = processed.len(), "batch extraction finished");
    Ok(processed)
}
