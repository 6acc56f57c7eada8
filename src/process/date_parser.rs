use chrono::{Datelike, NaiveDate};

/// Day-first numeric and named-month layouts, four-digit year.
const LONG_YEAR_FORMATS: &[&str] = &[
    "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y-%m-%d", "%Y/%m/%d", "%d %B %Y", "%d %b %Y",
];

const SHORT_YEAR_FORMATS: &[&str] = &["%d/%m/%y", "%d-%m-%y", "%d.%m.%y"];

/// Permissive calendar-date parse. Anything unrecognised is `None`, never an error.
///
/// A trailing time of day (`" 10:30"`, `"T10:30:00"`) is ignored.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim().trim_matches('"').trim();
    if s.is_empty() {
        return None;
    }
    let date_part = strip_time(s);

    for fmt in LONG_YEAR_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(date_part, fmt) {
            // chrono's %Y also accepts two-digit years; leave those to %y
            if (1000..=9999).contains(&d.year()) {
                return Some(d);
            }
        }
    }
    SHORT_YEAR_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

fn strip_time(s: &str) -> &str {
    match s.rfind([' ', 'T']) {
        Some(idx) => {
            let tail = s[idx + 1..].trim();
            let looks_like_time = tail.contains(':')
                && tail.chars().all(|c| c.is_ascii_digit() || c == ':' || c == '.');
            if looks_like_time {
                s[..idx].trim_end()
            } else {
                s
            }
        }
        None => s,
    }
}
