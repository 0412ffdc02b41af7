//! Path and query shaping shared by the operator mappers.

use chrono::{DateTime, Local};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

const FILE_SCHEME: &str = "file:///";
const TEXT_EXTENSION: &str = ".txt";

// Anchored to the closing `) as X` so columns such as `valid_from` never match.
static FROM_CLAUSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bFROM\s+([A-Za-z0-9_]+)\s*\)\s*as\s+X\s*$")
        .expect("FROM clause pattern is valid")
});

/// Format a folder as an executor URI: absolute, percent-encoded per segment,
/// `file:///` prefixed and `/` terminated.
pub fn folder_uri(folder: &Path) -> std::io::Result<String> {
    let raw = folder.to_string_lossy();
    let trimmed = raw.trim();

    let mut uri = if trimmed.starts_with("file://") {
        trimmed.to_string()
    } else {
        let absolute = std::path::absolute(Path::new(trimmed))?;
        let encoded = absolute
            .to_string_lossy()
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!("{}{}", FILE_SCHEME, encoded.trim_start_matches('/'))
    };

    if !uri.ends_with('/') {
        uri.push('/');
    }
    Ok(uri)
}

/// `<name>.txt`, without doubling an extension the caller already added.
pub fn text_file_name(logical_name: &str) -> String {
    let stem = logical_name
        .trim()
        .strip_suffix(TEXT_EXTENSION)
        .unwrap_or(logical_name.trim());
    format!("{}{}", urlencoding::encode(stem), TEXT_EXTENSION)
}

/// Fresh output file name stamped with the given time.
pub fn output_file_name(now: DateTime<Local>) -> String {
    format!("output_{}{}", now.format("%Y%m%d_%H%M%S"), TEXT_EXTENSION)
}

/// Recover the logical name from a stored path: last segment without the
/// `.txt` that [`text_file_name`] appends.
pub fn logical_file_name(stored: &str) -> String {
    let last = stored.rsplit('/').next().unwrap_or(stored);
    let stem = last.strip_suffix(TEXT_EXTENSION).unwrap_or(last);
    urlencoding::decode(stem)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| stem.to_string())
}

/// `(SELECT <columns> FROM <table>) as X`
pub fn projection_query(table: &str, columns: &[String]) -> String {
    let columns = if columns.is_empty() {
        "*".to_string()
    } else {
        columns.join(", ")
    };
    format!("(SELECT {} FROM {}) as X", columns, table)
}

/// Bare table name out of a projection query, if it has a FROM clause.
pub fn table_from_projection(query: &str) -> Option<String> {
    FROM_CLAUSE
        .captures(query)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
