// src/view/mod.rs
//! Filter, aggregate and export over the canonical dataset: everything the
//! dashboard shows, minus the rendering.

use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
};

use chrono::NaiveDateTime;
use tracing::info;

use crate::{
    error::IngestError,
    history::{write_atomically, write_records},
    schema::CanonicalRecord,
};

/// Preferred technology selection when the dataset has it.
pub const DEFAULT_TECHNOLOGY: &str = "Solar Photovoltaics";

/// Row predicates. `None` leaves a dimension unconstrained; a constrained
/// range never matches a row whose value is unset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub technologies: Option<BTreeSet<String>>,
    pub regions: Option<BTreeSet<String>>,
    pub capacity: Option<(f64, f64)>,
    pub years: Option<(i32, i32)>,
}

impl Filter {
    pub fn matches(&self, r: &CanonicalRecord) -> bool {
        in_set(&self.technologies, r.technology_type.as_deref())
            && in_set(&self.regions, r.region.as_deref())
            && in_range(self.capacity, r.installed_capacity_mw)
            && in_range(self.years, r.application_year)
    }

    pub fn apply<'a>(&self, records: &'a [CanonicalRecord]) -> Vec<&'a CanonicalRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

fn in_set(set: &Option<BTreeSet<String>>, value: Option<&str>) -> bool {
    match set {
        None => true,
        Some(set) => value.is_some_and(|v| set.contains(v)),
    }
}

fn in_range<T: PartialOrd + Copy>(range: Option<(T, T)>, value: Option<T>) -> bool {
    match range {
        None => true,
        Some((lo, hi)) => value.is_some_and(|v| lo <= v && v <= hi),
    }
}

/// The selectable domain of each filter dimension.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOptions {
    pub technologies: Vec<String>,
    pub regions: Vec<String>,
    pub capacity: Option<(f64, f64)>,
    pub years: Option<(i32, i32)>,
}

impl FilterOptions {
    pub fn from_records(records: &[CanonicalRecord]) -> Self {
        let technologies: BTreeSet<&str> = records
            .iter()
            .filter_map(|r| r.technology_type.as_deref())
            .collect();
        let regions: BTreeSet<&str> = records.iter().filter_map(|r| r.region.as_deref()).collect();

        let capacity = records
            .iter()
            .filter_map(|r| r.installed_capacity_mw)
            .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            });
        let years = records
            .iter()
            .filter_map(|r| r.application_year)
            .fold(None, |acc: Option<(i32, i32)>, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            });

        Self {
            technologies: technologies.into_iter().map(str::to_string).collect(),
            regions: regions.into_iter().map(str::to_string).collect(),
            capacity,
            years,
        }
    }

    /// Initial selection: solar PV only (if present, else nothing), every
    /// region, and the full capacity and year ranges.
    pub fn default_filter(&self) -> Filter {
        let technologies = self
            .technologies
            .iter()
            .filter(|t| t.as_str() == DEFAULT_TECHNOLOGY)
            .cloned()
            .collect();
        Filter {
            technologies: Some(technologies),
            regions: Some(self.regions.iter().cloned().collect()),
            capacity: self.capacity,
            years: self.years,
        }
    }
}

/// Headline consent-time statistics over a filtered selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean_consent_days: Option<f64>,
    pub median_consent_days: Option<f64>,
    pub max_consent_days: Option<i64>,
    /// Rows granted before they were submitted.
    pub negative_consent: usize,
}

impl Summary {
    pub fn of(rows: &[&CanonicalRecord]) -> Self {
        let mut days: Vec<i64> = rows.iter().filter_map(|r| r.consent_days).collect();
        days.sort_unstable();

        let mean = (!days.is_empty())
            .then(|| days.iter().map(|&d| d as f64).sum::<f64>() / days.len() as f64);
        let median = match days.len() {
            0 => None,
            n if n % 2 == 1 => Some(days[n / 2] as f64),
            n => Some((days[n / 2 - 1] as f64 + days[n / 2] as f64) / 2.0),
        };

        Self {
            count: rows.len(),
            mean_consent_days: mean,
            median_consent_days: median,
            max_consent_days: days.last().copied(),
            negative_consent: days.iter().filter(|&&d| d < 0).count(),
        }
    }
}

/// Mean consent days per application year, ascending by year.
pub fn consent_trend(rows: &[&CanonicalRecord]) -> Vec<(i32, f64)> {
    let mut by_year: BTreeMap<i32, (i64, usize)> = BTreeMap::new();
    for r in rows {
        if let (Some(year), Some(days)) = (r.application_year, r.consent_days) {
            let entry = by_year.entry(year).or_default();
            entry.0 += days;
            entry.1 += 1;
        }
    }
    by_year
        .into_iter()
        .map(|(year, (sum, n))| (year, sum as f64 / n as f64))
        .collect()
}

pub fn export_file_name(now: NaiveDateTime) -> String {
    format!("repd_filtered_{}.csv", now.format("%Y%m%d_%H%M"))
}

/// Write `rows` as a UTF-8 CSV with the canonical header into `dir`.
#[tracing::instrument(level = "info", skip(rows, dir), fields(count = rows.len()))]
pub fn export_csv(
    rows: &[&CanonicalRecord],
    dir: &Path,
    now: NaiveDateTime,
) -> Result<PathBuf, IngestError> {
    let path = dir.join(export_file_name(now));
    write_atomically(&path, |w| write_records(w, rows.iter().copied()))?;
    info!(path = %path.display(), "exported");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::AccumulatedStore;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn rec(
        id: &str,
        tech: Option<&str>,
        region: Option<&str>,
        mw: Option<f64>,
        year: Option<i32>,
        days: Option<i64>,
    ) -> CanonicalRecord {
        CanonicalRecord {
            ref_id: Some(id.into()),
            technology_type: tech.map(Into::into),
            region: region.map(Into::into),
            installed_capacity_mw: mw,
            application_year: year,
            consent_days: days,
            ..Default::default()
        }
    }

    fn sample() -> Vec<CanonicalRecord> {
        vec![
            rec("1", Some("Solar Photovoltaics"), Some("Wales"), Some(5.0), Some(2019), Some(100)),
            rec("2", Some("Solar Photovoltaics"), Some("Scotland"), Some(50.0), Some(2020), Some(200)),
            rec("3", Some("Wind Onshore"), Some("Scotland"), Some(20.0), Some(2020), Some(-10)),
            rec("4", Some("Solar Photovoltaics"), None, None, None, None),
            rec("5", None, Some("Wales"), Some(1.0), Some(2019), Some(300)),
        ]
    }

    fn ids(rows: &[&CanonicalRecord]) -> Vec<String> {
        rows.iter().map(|r| r.ref_id.clone().unwrap()).collect()
    }

    #[test]
    fn unconstrained_filter_keeps_everything() {
        let data = sample();
        assert_eq!(Filter::default().apply(&data).len(), data.len());
    }

    #[test]
    fn constrained_ranges_drop_unset_values() {
        let data = sample();
        let filter = Filter {
            capacity: Some((0.0, 100.0)),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(&data)), vec!["1", "2", "3", "5"]);

        let filter = Filter {
            technologies: Some(["Solar Photovoltaics".to_string()].into()),
            years: Some((2020, 2020)),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(&data)), vec!["2"]);
    }

    #[test]
    fn options_and_dashboard_defaults() {
        let data = sample();
        let opts = FilterOptions::from_records(&data);
        assert_eq!(opts.technologies, vec!["Solar Photovoltaics", "Wind Onshore"]);
        assert_eq!(opts.regions, vec!["Scotland", "Wales"]);
        assert_eq!(opts.capacity, Some((1.0, 50.0)));
        assert_eq!(opts.years, Some((2019, 2020)));

        let filter = opts.default_filter();
        assert_eq!(ids(&filter.apply(&data)), vec!["1", "2"]);
    }

    #[test]
    fn default_filter_without_solar_selects_nothing() {
        let data = vec![rec("1", Some("Biomass"), Some("Wales"), Some(1.0), Some(2019), Some(1))];
        let filter = FilterOptions::from_records(&data).default_filter();
        assert!(filter.apply(&data).is_empty());
    }

    #[test]
    fn summary_ignores_nulls_and_flags_negatives() {
        let data = sample();
        let rows: Vec<&CanonicalRecord> = data.iter().collect();
        let s = Summary::of(&rows);
        assert_eq!(s.count, 5);
        assert_eq!(s.mean_consent_days, Some(147.5));
        assert_eq!(s.median_consent_days, Some(150.0));
        assert_eq!(s.max_consent_days, Some(300));
        assert_eq!(s.negative_consent, 1);

        let empty = Summary::of(&[]);
        assert_eq!(empty.count, 0);
        assert_eq!(empty.mean_consent_days, None);
        assert_eq!(empty.median_consent_days, None);
    }

    #[test]
    fn trend_is_mean_per_year_ascending() {
        let data = sample();
        let rows: Vec<&CanonicalRecord> = data.iter().collect();
        assert_eq!(consent_trend(&rows), vec![(2019, 200.0), (2020, 95.0)]);
    }

    #[test]
    fn export_writes_timestamped_csv() {
        let dir = tempdir().unwrap();
        let data = sample();
        let rows: Vec<&CanonicalRecord> = data.iter().take(2).collect();
        let now = NaiveDate::from_ymd_opt(2025, 4, 9)
            .unwrap()
            .and_hms_opt(14, 7, 0)
            .unwrap();
        let path = export_csv(&rows, dir.path(), now).unwrap();
        assert_eq!(path.file_name().unwrap(), "repd_filtered_20250409_1407.csv");

        let back = AccumulatedStore::new(&path).load().unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back[1].region.as_deref(), Some("Scotland"));
    }
}
