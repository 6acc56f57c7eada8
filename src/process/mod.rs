// src/process/mod.rs
pub mod date_parser;
pub mod derive;
pub mod normalize;
pub mod utils;

use std::{borrow::Cow, fs, path::Path};

use csv::ReaderBuilder;
use tracing::{debug, info};

use crate::{config::Encoding, error::IngestError};

pub use normalize::{NormalizedBatch, Normalizer};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    /// File name (or other label) the table was read from, for diagnostics.
    pub source_name: String,
    /// Column labels exactly as the file has them.
    pub headers: Vec<String>,
    /// Data rows. Ragged rows are kept as-is; a short row simply lacks trailing cells.
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    #[cfg(test)]
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col).map(String::as_str)
    }
}

/// Decode extract bytes to text.
///
/// Latin-1 maps every byte to the code point of the same value, so it never fails.
pub fn decode_extract<'a>(
    source_name: &str,
    bytes: &'a [u8],
    encoding: Encoding,
) -> Result<Cow<'a, str>, IngestError> {
    let stripped = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    match encoding {
        Encoding::Utf8 => std::str::from_utf8(stripped)
            .map(Cow::Borrowed)
            .map_err(|e| IngestError::structural(source_name, format!("not UTF-8: {}", e))),
        Encoding::Latin1 => Ok(Cow::Owned(decode_latin1(stripped))),
        Encoding::Auto => match std::str::from_utf8(stripped) {
            Ok(text) => Ok(Cow::Borrowed(text)),
            Err(_) => {
                debug!(source_name, "not valid UTF-8, reading as Latin-1");
                Ok(Cow::Owned(decode_latin1(stripped)))
            }
        },
    }
}

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Parse comma-delimited text with a header row into a [`RawTable`].
///
/// Fails only when the text is not tabular at all: no header row, or a
/// record the CSV reader cannot tokenize.
pub fn parse_raw_table(source_name: &str, text: &str) -> Result<RawTable, IngestError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = rdr.records();
    let headers: Vec<String> = match records.next() {
        Some(Ok(rec)) => rec.iter().map(str::to_string).collect(),
        Some(Err(e)) => return Err(IngestError::structural(source_name, e)),
        None => return Err(IngestError::structural(source_name, "empty file, no header row")),
    };
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(IngestError::structural(source_name, "header row is blank"));
    }

    let mut rows = Vec::new();
    for (idx, result) in records.enumerate() {
        let record = result.map_err(|e| {
            IngestError::structural(source_name, format!("record {}: {}", idx + 1, e))
        })?;
        if record.iter().all(|v| v.trim().is_empty()) {
            continue;
        }
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(RawTable {
        source_name: source_name.to_string(),
        headers,
        rows,
    })
}

/// Read and decode an extract file from disk.
#[tracing::instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn load_extract<P: AsRef<Path>>(path: P, encoding: Encoding) -> Result<RawTable, IngestError> {
    let path = path.as_ref();
    let source_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    let bytes = fs::read(path).map_err(|e| IngestError::structural(&source_name, e))?;
    let text = decode_extract(&source_name, &bytes, encoding)?;
    let table = parse_raw_table(&source_name, &text)?;
    info!(
        columns = table.headers.len(),
        rows = table.rows.len(),
        "loaded extract"
    );
    Ok(table)
}
