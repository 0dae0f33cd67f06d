use serde_json::{Map, Value};

use crate::fetch::Record;

/// Flat table: ordered column names plus one single-level row per record.
/// A row may lack some columns; those cells are empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Map<String, Value>>,
}

impl Table {
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(column))
    }

    pub fn drop_column(&mut self, name: &str) {
        self.columns.retain(|c| c != name);
        for row in &mut self.rows {
            row.remove(name);
        }
    }

    pub fn push_column(&mut self, name: &str) {
        if !self.has_column(name) {
            self.columns.push(name.to_string());
        }
    }
}

/// Nested objects become `parent.child` keys; arrays stay as they are.
pub fn flatten_record(record: &Record) -> Map<String, Value> {
    let mut out = Map::new();
    flatten_into("", record, &mut out);
    out
}

fn flatten_into(prefix: &str, obj: &Map<String, Value>, out: &mut Map<String, Value>) {
    for (k, v) in obj {
        let key = if prefix.is_empty() {
            k.clone()
        } else {
            format!("{}.{}", prefix, k)
        };
        match v {
            Value::Object(inner) => flatten_into(&key, inner, out),
            other => {
                out.insert(key, other.clone());
            }
        }
    }
}

/// Columns appear in the order they are first seen across all records.
pub fn build_table(records: &[Record]) -> Table {
    let mut table = Table::default();
    for rec in records {
        let row = flatten_record(rec);
        for key in row.keys() {
            table.push_column(key);
        }
        table.rows.push(row);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rec(v: Value) -> Record {
        match v {
            Value::Object(m) => m,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_nested_objects_use_dotted_keys() {
        let r = rec(json!({
            "nome": "ACME",
            "billing": {"free": true, "database": {"ok": 1}},
            "qsa": [{"nome": "X"}]
        }));
        let flat = flatten_record(&r);
        let keys: Vec<&str> = flat.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["nome", "billing.free", "billing.database.ok", "qsa"]
        );
        assert_eq!(flat["qsa"], json!([{"nome": "X"}]));
    }

    #[test]
    fn test_columns_are_union_in_first_seen_order() {
        let t = build_table(&[
            rec(json!({"b": 1, "a": 2})),
            rec(json!({"c": 3, "a": 4})),
        ]);
        assert_eq!(t.columns, vec!["b", "a", "c"]);
        assert_eq!(t.rows.len(), 2);
        assert_eq!(t.cell(1, "b"), None);
        assert_eq!(t.cell(1, "c"), Some(&json!(3)));
    }

    #[test]
    fn test_drop_and_push_column() {
        let mut t = build_table(&[rec(json!({"x": 1, "y": 2}))]);
        t.drop_column("x");
        t.push_column("z");
        t.push_column("z");
        assert_eq!(t.columns, vec!["y", "z"]);
        assert!(t.cell(0, "x").is_none());
    }
}
