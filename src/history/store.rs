use std::{
    fs,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use csv::{ReaderBuilder, Trim, WriterBuilder};
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::{
    error::IngestError,
    process::derive,
    schema::{CanonicalRecord, CANONICAL_COLUMNS},
};

const KEY_COLUMN: &str = "ref_id";

/// The accumulated dataset: one flat UTF-8 CSV file, keyed by `ref_id`.
#[derive(Debug, Clone)]
pub struct AccumulatedStore {
    path: PathBuf,
}

impl AccumulatedStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted dataset. A missing file is an empty dataset.
    ///
    /// Columns are matched by canonical header name; absent ones stay unset,
    /// except `ref_id`, without which the file cannot be reconciled against.
    /// Keys are re-trimmed and derived fields recomputed from the stored dates.
    #[tracing::instrument(level = "info", skip(self), fields(path = %self.path.display()))]
    pub fn load(&self) -> Result<Vec<CanonicalRecord>, IngestError> {
        if !self.path.exists() {
            info!("no accumulated dataset yet, starting empty");
            return Ok(Vec::new());
        }
        let source_name = self.path.display().to_string();
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::Headers)
            .from_path(&self.path)
            .map_err(|e| IngestError::structural(&source_name, e))?;

        let headers = rdr
            .headers()
            .map_err(|e| IngestError::structural(&source_name, e))?;
        if !headers.iter().any(|h| h == KEY_COLUMN) {
            warn!(headers = ?headers, "accumulated dataset has no ref_id column");
            return Err(IngestError::MissingKeyColumn { source_name });
        }

        let mut records = Vec::new();
        for (idx, result) in rdr.deserialize::<CanonicalRecord>().enumerate() {
            let mut record = result.map_err(|e| {
                IngestError::structural(&source_name, format!("row {}: {}", idx + 1, e))
            })?;
            record.ref_id = record
                .ref_id
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty());
            derive::apply(&mut record);
            records.push(record);
        }
        info!(rows = records.len(), "loaded accumulated dataset");
        Ok(records)
    }

    /// Replace the persisted dataset with `records`.
    ///
    /// The new content is fully written to a sibling temporary file before it
    /// is renamed over the old one, so a failure leaves the previous file intact.
    #[tracing::instrument(level = "info", skip(self, records), fields(path = %self.path.display(), rows = records.len()))]
    pub fn persist(&self, records: &[CanonicalRecord]) -> Result<(), IngestError> {
        write_atomically(&self.path, |w| write_records(w, records))?;
        info!("persisted accumulated dataset");
        Ok(())
    }
}

/// Write `records` as CSV with the canonical header row (always present).
pub fn write_records<'a, W, I>(writer: W, records: I) -> csv::Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a CanonicalRecord>,
{
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(CANONICAL_COLUMNS)?;
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write-new-then-replace: `fill` writes into a temp file in the target's
/// directory, which is synced and renamed over `path` only if `fill` succeeds.
pub fn write_atomically<F>(path: &Path, fill: F) -> Result<(), IngestError>
where
    F: FnOnce(&mut dyn Write) -> csv::Result<()>,
{
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(|e| IngestError::persistence(&dir, e))?;

    let tmp = NamedTempFile::new_in(&dir).map_err(|e| IngestError::persistence(path, e))?;
    {
        let mut buf = BufWriter::new(tmp.as_file());
        fill(&mut buf).map_err(|e| IngestError::persistence(path, e.into()))?;
        buf.flush().map_err(|e| IngestError::persistence(path, e))?;
    }
    if let Ok(meta) = fs::metadata(path) {
        // keep the replaced file's mode instead of the temp file's 0600
        tmp.as_file()
            .set_permissions(meta.permissions())
            .map_err(|e| IngestError::persistence(path, e))?;
    }
    tmp.as_file()
        .sync_all()
        .map_err(|e| IngestError::persistence(path, e))?;
    tmp.persist(path).map_err(|e| {
        warn!(path = %path.display(), error = %e.error, "rename over target failed");
        IngestError::persistence(path, e.error)
    })?;
    Ok(())
}
