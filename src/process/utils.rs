use once_cell::sync::Lazy;
use regex::Regex;

static UNIT_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)mw").expect("unit regex"));

/// Trim whitespace + strip outer quotes if present.
pub fn clean_str(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

/// Column label as used for alias lookup: trimmed, every quote character
/// removed, inner whitespace collapsed, lowercased.
pub fn clean_label(raw: &str) -> String {
    raw.replace(['"', '\''], "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Trimmed text, or `None` if nothing is left.
pub fn clean_text(raw: Option<&str>) -> Option<String> {
    let cleaned = clean_str(raw?);
    (!cleaned.is_empty()).then_some(cleaned)
}

/// Title case with word boundaries at any non-letter:
/// `"solar PHOTOVOLTAICS"` → `"Solar Photovoltaics"`, `"north-east"` → `"North-East"`.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_cased = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_cased {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_cased = true;
        } else {
            out.push(c);
            prev_cased = false;
        }
    }
    out
}

/// Trimmed + title-cased category text; blank or missing is `None`.
pub fn clean_category(raw: Option<&str>) -> Option<String> {
    clean_text(raw).map(|s| title_case(&s))
}

/// Installed capacity in MW from text like `"12,500 MW"`.
///
/// Missing cell ⇒ `None`. After dropping thousands separators and unit
/// suffixes an empty string ⇒ `Some(0.0)`; anything non-numeric ⇒ `None`.
pub fn parse_capacity(raw: Option<&str>) -> Option<f64> {
    let raw = raw?;
    let without_commas = raw.replace(',', "");
    let stripped = UNIT_SUFFIX.replace_all(&without_commas, "");
    let cleaned = clean_str(&stripped);
    if cleaned.is_empty() {
        return Some(0.0);
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}
