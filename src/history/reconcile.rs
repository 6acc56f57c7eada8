//! Identity-based merge of an incoming batch into the accumulated dataset.

use std::collections::HashSet;

use tracing::{info, warn};

use crate::schema::CanonicalRecord;

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    /// Accumulated rows in their original order, followed by the new rows in
    /// incoming order.
    pub merged: Vec<CanonicalRecord>,
    /// Incoming rows whose `ref_id` was not yet present.
    pub added: usize,
    /// Incoming rows whose `ref_id` was already present (in the accumulated set
    /// or earlier in the same batch).
    pub duplicates: usize,
    /// Incoming rows with no usable `ref_id`.
    pub rejected: usize,
}

impl Reconciliation {
    pub fn new_rows(&self) -> &[CanonicalRecord] {
        &self.merged[self.merged.len() - self.added..]
    }
}

/// Append to `accumulated` every incoming record whose trimmed `ref_id` is not
/// already there. Existing rows are never modified, dropped or reordered.
///
/// Set difference on keys followed by a union, so a second pass with the same
/// batch over the result adds nothing.
#[tracing::instrument(level = "info", skip_all, fields(accumulated = accumulated.len(), incoming = incoming.len()))]
pub fn reconcile(
    accumulated: Vec<CanonicalRecord>,
    incoming: Vec<CanonicalRecord>,
) -> Reconciliation {
    let mut seen: HashSet<String> = HashSet::with_capacity(accumulated.len() + incoming.len());
    let mut historical_dupes = 0usize;
    for record in &accumulated {
        if let Some(key) = record.key() {
            if !seen.insert(key.to_string()) {
                historical_dupes += 1;
            }
        }
    }
    if historical_dupes > 0 {
        warn!(historical_dupes, "accumulated dataset already holds repeated ref_ids");
    }

    let mut merged = accumulated;
    let mut added = 0;
    let mut duplicates = 0;
    let mut rejected = 0;

    for mut record in incoming {
        let key = match record.key() {
            Some(k) => k.to_string(),
            None => {
                rejected += 1;
                continue;
            }
        };
        if seen.contains(&key) {
            duplicates += 1;
            continue;
        }
        record.ref_id = Some(key.clone());
        seen.insert(key);
        merged.push(record);
        added += 1;
    }

    if rejected > 0 {
        warn!(rejected, "incoming rows without ref_id skipped");
    }
    info!(added, duplicates, rejected, total = merged.len(), "reconciled");

    Reconciliation {
        merged,
        added,
        duplicates,
        rejected,
    }
}
