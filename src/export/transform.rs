use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::activity::parse_activities;
use super::flatten::Table;

static CODE_PUNCT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.-]").expect("static regex"));
static DOC_PUNCT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[./-]").expect("static regex"));
static DASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"-").expect("static regex"));

/// Source list column and the two scalar columns derived from its first entry.
struct ActivityColumns {
    source: &'static str,
    code: &'static str,
    text: &'static str,
}

const PRIMARY: ActivityColumns = ActivityColumns {
    source: "atividade_principal",
    code: "atv_principal_code",
    text: "atv_principal_text",
};

const SECONDARY: ActivityColumns = ActivityColumns {
    source: "atividades_secundarias",
    code: "ativ_sec_code",
    text: "ativ_sec_text",
};

/// All post-flatten cleanups, in export order.
pub fn apply_all(table: &mut Table) {
    derive_activity(table, &PRIMARY);
    derive_activity(table, &SECONDARY);
    strip_column(table, "cnpj", &DOC_PUNCT);
    // same character set as cnpj, dots and slashes included
    strip_column(table, "cep", &DOC_PUNCT);
    strip_column(table, "telefone", &DASH);
}

/// Replace a list column by `<code>`/`<text>` of its first entry; the code
/// loses `.` and `-`. Empty or missing lists give nulls.
fn derive_activity(table: &mut Table, cols: &ActivityColumns) {
    if !table.has_column(cols.source) {
        return;
    }
    for row in &mut table.rows {
        let first = row
            .remove(cols.source)
            .map(|v| parse_activities(&v))
            .and_then(|acts| acts.into_iter().next());
        let (code, text) = match first {
            Some(a) => (
                a.code
                    .map(|c| Value::String(CODE_PUNCT.replace_all(&c, "").into_owned()))
                    .unwrap_or(Value::Null),
                a.text.map(Value::String).unwrap_or(Value::Null),
            ),
            None => (Value::Null, Value::Null),
        };
        row.insert(cols.code.to_string(), code);
        row.insert(cols.text.to_string(), text);
    }
    table.drop_column(cols.source);
    table.push_column(cols.code);
    table.push_column(cols.text);
}

/// Coerce every present, non-null cell of `column` to text and delete `pattern` matches.
fn strip_column(table: &mut Table, column: &str, pattern: &Regex) {
    if !table.has_column(column) {
        return;
    }
    for row in &mut table.rows {
        if let Some(cell) = row.get_mut(column) {
            let text = match &*cell {
                Value::Null => continue,
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            *cell = Value::String(pattern.replace_all(&text, "").into_owned());
        }
    }
}
