use anyhow::{anyhow, Context, Result};
use csv::WriterBuilder;
use rust_xlsxwriter::{Format, Workbook};
use serde_json::Value;
use std::path::Path;

use super::flatten::Table;

/// Longest text Excel accepts in one cell.
const XLSX_MAX_STRING: usize = 32_767;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Xlsx,
    Csv,
}

impl SheetFormat {
    /// `.csv` (any case) means CSV; everything else is written as xlsx.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => SheetFormat::Csv,
            _ => SheetFormat::Xlsx,
        }
    }
}

/// Write `table` to `path`, replacing any existing file.
pub fn write_table(table: &Table, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory {}", parent.display()))?;
    }
    match SheetFormat::from_path(path) {
        SheetFormat::Xlsx => write_xlsx(table, path),
        SheetFormat::Csv => write_csv(table, path),
    }
}

fn write_xlsx(table: &Table, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    let header = Format::new().set_bold();

    for (c, name) in table.columns.iter().enumerate() {
        let col = u16::try_from(c).map_err(|_| anyhow!("too many columns for xlsx: {}", c + 1))?;
        sheet
            .write_string_with_format(0, col, name.as_str(), &header)
            .with_context(|| format!("writing header `{}`", name))?;
    }

    for (r, row) in table.rows.iter().enumerate() {
        let xrow = u32::try_from(r + 1).map_err(|_| anyhow!("too many rows for xlsx"))?;
        for (c, name) in table.columns.iter().enumerate() {
            let col = c as u16;
            let res = match row.get(name) {
                None | Some(Value::Null) => continue,
                Some(Value::Bool(b)) => sheet.write_boolean(xrow, col, *b),
                Some(Value::Number(n)) => match n.as_f64() {
                    Some(f) => sheet.write_number(xrow, col, f),
                    None => sheet.write_string(xrow, col, n.to_string()),
                },
                Some(Value::String(s)) => sheet.write_string(xrow, col, clip(s)),
                Some(other) => sheet.write_string(xrow, col, clip(&other.to_string())),
            };
            res.with_context(|| format!("writing row {} column `{}`", r + 1, name))?;
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("saving workbook {}", path.display()))?;
    Ok(())
}

fn clip(s: &str) -> String {
    if s.chars().count() <= XLSX_MAX_STRING {
        s.to_string()
    } else {
        s.chars().take(XLSX_MAX_STRING).collect()
    }
}

fn write_csv(table: &Table, path: &Path) -> Result<()> {
    let mut w = WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    w.write_record(&table.columns).context("writing CSV header")?;
    for row in &table.rows {
        let cells = table.columns.iter().map(|name| match row.get(name) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        });
        w.write_record(cells).context("writing CSV row")?;
    }
    w.flush()
        .with_context(|| format!("flushing {}", path.display()))?;
    Ok(())
}
