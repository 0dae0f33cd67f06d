//! Turns the successful payloads of a run into one flat spreadsheet.

pub mod activity;
pub mod flatten;
pub mod transform;
pub mod write;

pub use flatten::{build_table, Table};
pub use write::{write_table, SheetFormat};

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::{event_log::EventLog, fetch::Record};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub rows: usize,
    pub columns: usize,
}

/// Flatten, derive and clean the records into a table.
pub fn prepare_table(records: &[Record]) -> Table {
    let mut table = build_table(records);
    transform::apply_all(&mut table);
    table
}

/// Write `records` to `path`. With no records nothing is touched and
/// `Ok(None)` comes back after a warning.
pub fn export(records: &[Record], path: &Path, log: &EventLog) -> Result<Option<ExportSummary>> {
    if records.is_empty() {
        log.warn("⚠️ no data returned to export.");
        return Ok(None);
    }

    log.log("📊 normalizing data and exporting spreadsheet...");
    let table = prepare_table(records);
    write_table(&table, path).with_context(|| format!("exporting to {}", path.display()))?;
    log.log(format!(
        "✅ spreadsheet '{}' created successfully!",
        path.display()
    ));

    Ok(Some(ExportSummary {
        path: path.to_path_buf(),
        rows: table.rows.len(),
        columns: table.columns.len(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    fn records(values: Vec<serde_json::Value>) -> Vec<Record> {
        values
            .into_iter()
            .map(|v| v.as_object().cloned().unwrap())
            .collect()
    }

    #[test]
    fn test_empty_run_writes_nothing() {
        let tmp = tempdir().unwrap();
        let log = EventLog::open(tmp.path().join("log.txt")).unwrap();
        let out = tmp.path().join("dados.xlsx");
        fs::write(&out, b"previous").unwrap();

        let summary = export(&[], &out, &log).unwrap();
        assert!(summary.is_none());
        assert_eq!(fs::read(&out).unwrap(), b"previous");
        let text = fs::read_to_string(log.path()).unwrap();
        assert!(text.contains("no data returned to export"));

        let missing = tmp.path().join("never.xlsx");
        export(&[], &missing, &log).unwrap();
        assert!(!missing.exists());
    }

    #[test]
    fn test_export_round_trip_through_csv() {
        let tmp = tempdir().unwrap();
        let log = EventLog::open(tmp.path().join("log.txt")).unwrap();
        let out = tmp.path().join("dados.csv");
        let recs = records(vec![
            json!({
                "status": "OK",
                "cnpj": "12.345.678/0001-99",
                "atividade_principal": [{"code": "12.3-4", "text": "X"}]
            }),
            json!({"status": "OK", "cnpj": "98.765.432/0001-10"}),
        ]);

        let summary = export(&recs, &out, &log).unwrap().unwrap();
        assert_eq!(summary.rows, 2);
        assert_eq!(summary.columns, 4);

        let mut rdr = csv::Reader::from_path(&out).unwrap();
        let headers: Vec<String> = rdr.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(
            headers,
            vec!["status", "cnpj", "atv_principal_code", "atv_principal_text"]
        );
        let rows: Vec<csv::StringRecord> = rdr.records().map(Result::unwrap).collect();
        assert_eq!(&rows[0][1], "12345678000199");
        assert_eq!(&rows[0][2], "1234");
        assert_eq!(&rows[0][3], "X");
        assert_eq!(&rows[1][2], "");
        assert_eq!(&rows[1][3], "");

        let text = fs::read_to_string(log.path()).unwrap();
        assert!(text.contains("created successfully"));
    }

    #[test]
    fn test_export_xlsx() {
        let tmp = tempdir().unwrap();
        let log = EventLog::open(tmp.path().join("log.txt")).unwrap();
        let out = tmp.path().join("dados_empresas.xlsx");
        let recs = records(vec![json!({"status": "OK", "cnpj": "1", "cep": "01.310-100"})]);

        let summary = export(&recs, &out, &log).unwrap().unwrap();
        assert_eq!(summary.rows, 1);
        assert!(out.exists());
    }
}
