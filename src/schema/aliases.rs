// src/schema/aliases.rs
//! Maps the column labels seen across extract versions onto canonical fields.

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;

use crate::process::utils::clean_label;

/// Canonical fields that are read from a source column.
/// Derived fields (`application_year`, `consent_days`) have no source label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    RefId,
    SiteName,
    Operator,
    TechnologyType,
    DevelopmentStatus,
    Region,
    County,
    Country,
    InstalledCapacityMw,
    ApplicationSubmittedDate,
    PermissionGrantedDate,
}

impl Field {
    pub const ALL: [Field; 11] = [
        Field::RefId,
        Field::SiteName,
        Field::Operator,
        Field::TechnologyType,
        Field::DevelopmentStatus,
        Field::Region,
        Field::County,
        Field::Country,
        Field::InstalledCapacityMw,
        Field::ApplicationSubmittedDate,
        Field::PermissionGrantedDate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::RefId => "ref_id",
            Field::SiteName => "site_name",
            Field::Operator => "operator",
            Field::TechnologyType => "technology_type",
            Field::DevelopmentStatus => "development_status",
            Field::Region => "region",
            Field::County => "county",
            Field::Country => "country",
            Field::InstalledCapacityMw => "installed_capacity_mw",
            Field::ApplicationSubmittedDate => "application_submitted_date",
            Field::PermissionGrantedDate => "permission_granted_date",
        }
    }
}

/// Known source labels, already in cleaned form (see [`clean_label`]).
/// The canonical name of each field is always accepted as well.
static BUILTIN_ALIASES: &[(Field, &[&str])] = &[
    (Field::RefId, &["ref id", "ref_id", "refid", "ref. id", "reference"]),
    (Field::SiteName, &["site name"]),
    (
        Field::Operator,
        &["operator (or applicant)", "operator or applicant", "operator", "applicant"],
    ),
    (Field::TechnologyType, &["technology type", "technology"]),
    (
        Field::DevelopmentStatus,
        &["development status (short)", "development status", "status"],
    ),
    (Field::Region, &["region"]),
    (Field::County, &["county"]),
    (Field::Country, &["country"]),
    (
        Field::InstalledCapacityMw,
        &[
            "installed capacity (mwelec)",
            "installed capacity (mw)",
            "installed capacity",
            "capacity (mw)",
        ],
    ),
    (
        Field::ApplicationSubmittedDate,
        &["planning application submitted", "application submitted"],
    ),
    (
        Field::PermissionGrantedDate,
        &["planning permission granted", "permission granted"],
    ),
];

/// Lookup from cleaned source label to canonical field.
#[derive(Debug, Clone)]
pub struct FieldAliases {
    by_label: HashMap<String, Field>,
}

impl FieldAliases {
    pub fn builtin() -> Self {
        let mut by_label = HashMap::new();
        for &(field, labels) in BUILTIN_ALIASES {
            by_label.insert(field.as_str().to_string(), field);
            for label in labels {
                by_label.insert(clean_label(label), field);
            }
        }
        Self { by_label }
    }

    /// Add configured labels. A label already bound to another field is rebound.
    pub fn with_overrides(mut self, overrides: &BTreeMap<Field, Vec<String>>) -> Self {
        for (field, labels) in overrides {
            for label in labels {
                self.by_label.insert(clean_label(label), *field);
            }
        }
        self
    }

    pub fn resolve(&self, raw_label: &str) -> Option<Field> {
        self.by_label.get(&clean_label(raw_label)).copied()
    }

    /// Bind each field to the first header (in file order) that resolves to it.
    pub fn column_map(&self, headers: &[String]) -> ColumnMap {
        let mut indices = BTreeMap::new();
        for (idx, header) in headers.iter().enumerate() {
            if let Some(field) = self.resolve(header) {
                indices.entry(field).or_insert(idx);
            }
        }
        ColumnMap { indices }
    }
}

impl Default for FieldAliases {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Which column index feeds each canonical field in one particular extract.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    indices: BTreeMap<Field, usize>,
}

impl ColumnMap {
    pub fn index(&self, field: Field) -> Option<usize> {
        self.indices.get(&field).copied()
    }

    pub fn contains(&self, field: Field) -> bool {
        self.indices.contains_key(&field)
    }

    /// Fields with no source column in this extract.
    pub fn missing(&self) -> Vec<Field> {
        Field::ALL
            .iter()
            .copied()
            .filter(|f| !self.indices.contains_key(f))
            .collect()
    }
}
