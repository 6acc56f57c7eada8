// src/schema/types.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Column order of the persisted accumulated dataset and of exports.
/// Must follow the field order of [`CanonicalRecord`].
pub const CANONICAL_COLUMNS: &[&str] = &[
    "ref_id",
    "site_name",
    "operator",
    "technology_type",
    "development_status",
    "region",
    "county",
    "country",
    "installed_capacity_mw",
    "application_submitted_date",
    "permission_granted_date",
    "application_year",
    "consent_days",
];

/// One project row in the fixed schema.
///
/// `None` is the unset marker for every field; it is never conflated with an
/// empty string. `application_year` and `consent_days` are derived from the
/// two dates and recomputed on every load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanonicalRecord {
    pub ref_id: Option<String>,
    pub site_name: Option<String>,
    pub operator: Option<String>,
    pub technology_type: Option<String>,
    pub development_status: Option<String>,
    pub region: Option<String>,
    pub county: Option<String>,
    pub country: Option<String>,
    pub installed_capacity_mw: Option<f64>,
    pub application_submitted_date: Option<NaiveDate>,
    pub permission_granted_date: Option<NaiveDate>,
    pub application_year: Option<i32>,
    pub consent_days: Option<i64>,
}

impl CanonicalRecord {
    /// Reconciliation key: the trimmed `ref_id`, if non-empty.
    pub fn key(&self) -> Option<&str> {
        self.ref_id
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}
