use anyhow::{anyhow, Context, Result};
use csv::ReaderBuilder;
use std::path::Path;

/// Read the raw (un-normalized) values of `column` from a CSV file, in row order.
/// Every field is taken as text; blank cells come back as empty strings.
pub fn read_identifiers(path: impl AsRef<Path>, column: &str) -> Result<Vec<String>> {
    let path = path.as_ref();
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening input file {}", path.display()))?;

    let headers = rdr
        .headers()
        .with_context(|| format!("reading header row of {}", path.display()))?
        .clone();
    let idx = headers
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| anyhow!("column `{}` not found in {}", column, path.display()))?;

    let mut out = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let record =
            record.with_context(|| format!("parsing row {} of {}", line + 2, path.display()))?;
        out.push(record.get(idx).unwrap_or_default().to_string());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_reads_named_column() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("CNPJS.csv");
        fs::write(
            &path,
            "A1_NOME,A2_CGC\nacme,12.345.678/0001-99\nfoo,\"00.000.000/0001-91\"\nbar,\n",
        )
        .unwrap();

        let ids = read_identifiers(&path, "A2_CGC").unwrap();
        assert_eq!(ids, vec!["12.345.678/0001-99", "00.000.000/0001-91", ""]);
    }

    #[test]
    fn test_missing_column_is_error() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("in.csv");
        fs::write(&path, "other\n1\n").unwrap();
        let err = read_identifiers(&path, "A2_CGC").unwrap_err();
        assert!(err.to_string().contains("A2_CGC"));
    }

    #[test]
    fn test_missing_file_is_error() {
        let tmp = tempdir().unwrap();
        assert!(read_identifiers(tmp.path().join("nope.csv"), "A2_CGC").is_err());
    }
}
