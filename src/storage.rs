//! Output files
//!
//! Writes aggregated records as JSON and resolves where they go.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use crate::error::ArgumentError;
use crate::types::ListingKind;

const UNSAFE_PATH_CHARS: &[char] = &['<', '>', '|', '"', '?', '*'];

/// Default destination: `<dir>/<authority>.<listing>.json`.
pub fn default_output_path(dir: &Path, authority: &str, kind: ListingKind) -> PathBuf {
    dir.join(format!("{}.{}.json", authority, kind.key()))
}

/// Fill `{authority}` and `{listing}` placeholders of an explicit output
/// path; paths without placeholders are returned unchanged.
pub fn expand_output_path(template: &Path, authority: &str, kind: ListingKind) -> PathBuf {
    let raw = template.to_string_lossy();
    if !raw.contains('{') {
        return template.to_path_buf();
    }
    PathBuf::from(
        raw.replace("{authority}", authority)
            .replace("{listing}", kind.key()),
    )
}

/// Reject empty paths and paths with NUL, control or shell-special characters.
pub fn validate_output_path(raw: &str) -> Result<PathBuf, ArgumentError> {
    let unsafe_char = raw
        .chars()
        .any(|c| c.is_control() || UNSAFE_PATH_CHARS.contains(&c));
    if raw.trim().is_empty() || unsafe_char {
        return Err(ArgumentError::UnsafePath(raw.to_string()));
    }
    Ok(PathBuf::from(raw))
}

/// Serialize `value` to `path` as pretty JSON, creating parent directories.
pub fn save_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()
}

pub fn load_json(path: &Path) -> io::Result<Value> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}
