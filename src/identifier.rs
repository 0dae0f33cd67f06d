use once_cell::sync::Lazy;
use regex::Regex;

static NON_DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9]").expect("static regex"));

/// Strip everything that is not an ASCII digit. `"12.345.678/0001-99"` → `"12345678000199"`.
pub fn normalize(raw: &str) -> String {
    NON_DIGIT.replace_all(raw, "").into_owned()
}

/// Normalize every raw value, keeping input order and duplicates.
pub fn normalize_all<I, S>(raws: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raws.into_iter().map(|r| normalize(r.as_ref())).collect()
}
