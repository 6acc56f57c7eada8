// src/process/normalize.rs

use tracing::{debug, info, warn};

use crate::{
    process::{date_parser::parse_date, derive, utils, RawTable},
    schema::{CanonicalRecord, ColumnMap, Field, FieldAliases},
};

/// A raw extract mapped onto the canonical schema.
#[derive(Debug, Clone)]
pub struct NormalizedBatch {
    pub source_name: String,
    pub columns: ColumnMap,
    pub records: Vec<CanonicalRecord>,
}

impl NormalizedBatch {
    pub fn has_key_column(&self) -> bool {
        self.columns.contains(Field::RefId)
    }
}

/// Turns [`RawTable`]s into canonical records using a field-alias table.
///
/// Never fails: a missing column leaves its field `None` on every row, and a
/// cell that does not clean up resolves to `None`.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    aliases: FieldAliases,
}

impl Normalizer {
    pub fn new(aliases: FieldAliases) -> Self {
        Self { aliases }
    }

    #[tracing::instrument(level = "info", skip(self, table), fields(source = %table.source_name))]
    pub fn normalize(&self, table: &RawTable) -> NormalizedBatch {
        let columns = self.aliases.column_map(&table.headers);
        let missing = columns.missing();
        if !missing.is_empty() {
            let names: Vec<&str> = missing.iter().map(Field::as_str).collect();
            warn!(missing = ?names, "source columns absent, fields left unset");
        }

        let records: Vec<CanonicalRecord> = table
            .rows
            .iter()
            .map(|row| normalize_row(row, &columns))
            .collect();

        info!(rows = records.len(), "normalized");
        NormalizedBatch {
            source_name: table.source_name.clone(),
            columns,
            records,
        }
    }
}

fn normalize_row(row: &[String], columns: &ColumnMap) -> CanonicalRecord {
    let cell = |field: Field| {
        columns
            .index(field)
            .and_then(|idx| row.get(idx))
            .map(String::as_str)
    };
    let date = |field: Field| {
        let raw = cell(field)?;
        let parsed = parse_date(raw);
        if parsed.is_none() && !raw.trim().is_empty() {
            debug!(field = field.as_str(), value = raw, "unparseable date");
        }
        parsed
    };

    let installed_capacity_mw = utils::parse_capacity(cell(Field::InstalledCapacityMw));
    if installed_capacity_mw.is_none() {
        if let Some(raw) = cell(Field::InstalledCapacityMw) {
            debug!(value = raw, "unparseable capacity");
        }
    }

    let mut record = CanonicalRecord {
        ref_id: utils::clean_text(cell(Field::RefId)),
        site_name: utils::clean_text(cell(Field::SiteName)),
        operator: utils::clean_text(cell(Field::Operator)),
        technology_type: utils::clean_category(cell(Field::TechnologyType)),
        development_status: utils::clean_category(cell(Field::DevelopmentStatus)),
        region: utils::clean_category(cell(Field::Region)),
        county: utils::clean_text(cell(Field::County)),
        country: utils::clean_text(cell(Field::Country)),
        installed_capacity_mw,
        application_submitted_date: date(Field::ApplicationSubmittedDate),
        permission_granted_date: date(Field::PermissionGrantedDate),
        application_year: None,
        consent_days: None,
    };
    derive::apply(&mut record);
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::parse_raw_table;
    use chrono::NaiveDate;

    fn normalize(text: &str) -> NormalizedBatch {
        let table = parse_raw_table("test.csv", text).unwrap();
        Normalizer::default().normalize(&table)
    }

    #[test]
    fn normalizes_a_typical_repd_row() {
        let batch = normalize(
            "\"Ref ID\",Site Name,Technology Type,Development Status (short),Region,Installed Capacity (MWelec),Planning Application Submitted,Planning Permission Granted\n\
             \" 1234 \",Moor Farm,solar photovoltaics,operational,south west,\"12,500 MW\",01/02/2015,15/04/2015\n",
        );
        assert!(batch.has_key_column());
        let rec = &batch.records[0];
        assert_eq!(rec.ref_id.as_deref(), Some("1234"));
        assert_eq!(rec.site_name.as_deref(), Some("Moor Farm"));
        assert_eq!(rec.technology_type.as_deref(), Some("Solar Photovoltaics"));
        assert_eq!(rec.development_status.as_deref(), Some("Operational"));
        assert_eq!(rec.region.as_deref(), Some("South West"));
        assert_eq!(rec.installed_capacity_mw, Some(12500.0));
        assert_eq!(
            rec.application_submitted_date,
            NaiveDate::from_ymd_opt(2015, 2, 1)
        );
        assert_eq!(rec.application_year, Some(2015));
        assert_eq!(rec.consent_days, Some(73));
    }

    #[test]
    fn missing_region_column_loads_with_region_unset() {
        let batch = normalize("Ref ID,Technology Type\n1,Wind Onshore\n2,Biomass\n");
        assert_eq!(batch.records.len(), 2);
        assert!(batch.records.iter().all(|r| r.region.is_none()));
        assert!(batch.records.iter().all(|r| r.installed_capacity_mw.is_none()));
        assert!(batch.records.iter().all(|r| r.consent_days.is_none()));
    }

    #[test]
    fn per_field_garbage_degrades_to_none() {
        let batch = normalize(
            "Ref ID,Region,Installed Capacity (MWelec),Planning Application Submitted,Planning Permission Granted\n\
             9,  ,abc,not a date,01/01/2020\n\
             10,wales,,01/03/2020,01/01/2020\n",
        );
        let bad = &batch.records[0];
        assert_eq!(bad.region, None);
        assert_eq!(bad.installed_capacity_mw, None);
        assert_eq!(bad.application_submitted_date, None);
        assert_eq!(bad.application_year, None);
        assert_eq!(bad.consent_days, None);

        let negative = &batch.records[1];
        assert_eq!(negative.installed_capacity_mw, Some(0.0));
        assert_eq!(negative.consent_days, Some(-60));
    }

    #[test]
    fn short_rows_leave_trailing_fields_unset() {
        let batch = normalize("Ref ID,Region,Installed Capacity (MWelec)\n5,Scotland\n");
        let rec = &batch.records[0];
        assert_eq!(rec.region.as_deref(), Some("Scotland"));
        assert_eq!(rec.installed_capacity_mw, None);
    }

    #[test]
    fn missing_key_column_is_reported_not_fatal() {
        let batch = normalize("Site Name\nA\n");
        assert!(!batch.has_key_column());
        assert_eq!(batch.records[0].ref_id, None);
    }

    #[test]
    fn canonical_headers_are_accepted() {
        let batch = normalize(
            "ref_id,technology_type,region,installed_capacity_mw,application_submitted_date,permission_granted_date,application_year,consent_days\n\
             A1,Wind Offshore,Scotland,1200.5,2018-01-01,2018-12-31,1999,1\n",
        );
        let rec = &batch.records[0];
        assert_eq!(rec.installed_capacity_mw, Some(1200.5));
        assert_eq!(rec.application_year, Some(2018));
        assert_eq!(rec.consent_days, Some(364));
    }
}
