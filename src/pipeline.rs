// src/pipeline.rs
//! Extract file → normalized batch → reconciled and persisted accumulated dataset.

use std::path::Path;

use tracing::{debug, info};

use crate::{
    config::Config,
    error::IngestError,
    history::{reconcile, AccumulatedStore},
    ops_log::OpsLog,
    process::{self, Normalizer},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOutcome {
    pub source_name: String,
    pub incoming: usize,
    pub added: usize,
    pub duplicates: usize,
    pub rejected: usize,
    pub total: usize,
    /// Keys of the rows this extract appended, in merge order.
    pub new_ref_ids: Vec<String>,
}

/// Merge one extract into the accumulated dataset.
///
/// The persisted file is only replaced once the merge is complete; any error
/// before that leaves it as it was.
#[tracing::instrument(level = "info", skip_all, fields(extract = %extract_path.display()))]
pub fn ingest_extract(
    extract_path: &Path,
    cfg: &Config,
    store: &AccumulatedStore,
    ops_log: &OpsLog,
) -> Result<IngestOutcome, IngestError> {
    let table = process::load_extract(extract_path, cfg.encoding)?;
    ops_log.log(&format!(
        "Columns in {}: {:?}",
        table.source_name, table.headers
    ));

    let batch = Normalizer::new(cfg.field_aliases()).normalize(&table);
    if !batch.has_key_column() {
        return Err(IngestError::MissingKeyColumn {
            source_name: batch.source_name,
        });
    }
    let incoming = batch.records.len();

    let accumulated = store.load()?;
    let result = reconcile(accumulated, batch.records);
    store.persist(&result.merged)?;

    ops_log.log(&format!(
        "Merged and updated cleaned data: {} new rows added.",
        result.added
    ));
    let new_ref_ids: Vec<String> = result
        .new_rows()
        .iter()
        .filter_map(|r| r.key().map(str::to_string))
        .collect();
    debug!(new = ?new_ref_ids, "appended rows");
    info!(added = result.added, total = result.merged.len(), "ingest complete");

    Ok(IngestOutcome {
        source_name: batch.source_name,
        incoming,
        added: result.added,
        duplicates: result.duplicates,
        rejected: result.rejected,
        total: result.merged.len(),
        new_ref_ids,
    })
}
