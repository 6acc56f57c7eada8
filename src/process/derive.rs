//! Fields computed from the two planning dates. Pure functions of their
//! inputs, re-run on every load.

use chrono::{Datelike, NaiveDate};

use crate::schema::CanonicalRecord;

pub fn application_year(submitted: Option<NaiveDate>) -> Option<i32> {
    submitted.map(|d| d.year())
}

/// `granted - submitted` in whole days. Negative values are kept: they flag
/// a data-quality problem upstream, not a parse failure.
pub fn consent_days(submitted: Option<NaiveDate>, granted: Option<NaiveDate>) -> Option<i64> {
    Some((granted? - submitted?).num_days())
}

/// Overwrite the derived fields of `record` from its dates.
pub fn apply(record: &mut CanonicalRecord) {
    record.application_year = application_year(record.application_submitted_date);
    record.consent_days = consent_days(
        record.application_submitted_date,
        record.permission_granted_date,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, day)
    }

    #[test]
    fn consent_days_needs_both_dates() {
        assert_eq!(consent_days(None, d(2020, 1, 1)), None);
        assert_eq!(consent_days(d(2020, 1, 1), None), None);
        assert_eq!(consent_days(None, None), None);
    }

    #[test]
    fn consent_days_is_day_difference_and_may_be_negative() {
        assert_eq!(consent_days(d(2020, 1, 1), d(2020, 3, 1)), Some(60));
        assert_eq!(consent_days(d(2020, 3, 1), d(2020, 1, 1)), Some(-60));
        assert_eq!(consent_days(d(2020, 1, 1), d(2020, 1, 1)), Some(0));
    }

    #[test]
    fn apply_is_idempotent_and_clears_stale_values() {
        let mut rec = CanonicalRecord {
            application_submitted_date: d(2019, 6, 1),
            permission_granted_date: None,
            application_year: Some(1900),
            consent_days: Some(5),
            ..Default::default()
        };
        apply(&mut rec);
        assert_eq!(rec.application_year, Some(2019));
        assert_eq!(rec.consent_days, None);

        let once = rec.clone();
        apply(&mut rec);
        assert_eq!(rec, once);
    }
}
