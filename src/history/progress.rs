use anyhow::{Context, Result};
use std::{
    collections::BTreeSet,
    fs,
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};
use tracing::debug;

/// JSON-array file holding every identifier attempted so far, whatever the outcome.
///
/// The whole set is rewritten on each `save`, staged to `<path>.tmp` and renamed
/// into place so a reader never sees a half-written file.
#[derive(Debug, Clone)]
pub struct ProgressStore {
    path: PathBuf,
}

impl ProgressStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Empty set if nothing was saved yet; a corrupt file is an error.
    pub fn load(&self) -> Result<BTreeSet<String>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no progress file yet");
            return Ok(BTreeSet::new());
        }
        let file = fs::File::open(&self.path)
            .with_context(|| format!("opening progress file {}", self.path.display()))?;
        let ids: Vec<String> = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing progress file {}", self.path.display()))?;
        Ok(ids.into_iter().collect())
    }

    pub fn save(&self, processed: &BTreeSet<String>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }

        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        {
            let file = fs::File::create(&tmp_path)
                .with_context(|| format!("creating {}", tmp_path.display()))?;
            let mut w = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut w, processed).context("serializing progress")?;
            w.write_all(b"\n")?;
            let file = w
                .into_inner()
                .map_err(|e| e.into_error())
                .with_context(|| format!("flushing {}", tmp_path.display()))?;
            file.sync_all()
                .with_context(|| format!("syncing {}", tmp_path.display()))?;
        }

        fs::rename(&tmp_path, &self.path).with_context(|| {
            format!(
                "renaming {} -> {}",
                tmp_path.display(),
                self.path.display()
            )
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn set(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_load_missing_is_empty() {
        let tmp = tempdir().unwrap();
        let store = ProgressStore::new(tmp.path().join("progresso.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_persistence_across_restarts() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("state").join("progresso.json");
        {
            let store = ProgressStore::new(&path);
            store.save(&set(&["222", "111"])).unwrap();
        }
        let store = ProgressStore::new(&path);
        assert_eq!(store.load().unwrap(), set(&["111", "222"]));
    }

    #[test]
    fn test_save_overwrites_and_leaves_no_tmp() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("progresso.json");
        let store = ProgressStore::new(&path);
        store.save(&set(&["1", "2", "3"])).unwrap();
        store.save(&set(&["9"])).unwrap();

        assert_eq!(store.load().unwrap(), set(&["9"]));
        let names: Vec<_> = fs::read_dir(tmp.path())
            .unwrap()
            .filter_map(Result::ok)
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["progresso.json"]);
    }

    #[test]
    fn test_file_is_json_array() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("progresso.json");
        ProgressStore::new(&path).save(&set(&["5", "4"])).unwrap();
        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw, serde_json::json!(["4", "5"]));
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("progresso.json");
        fs::write(&path, "{not json").unwrap();
        assert!(ProgressStore::new(&path).load().is_err());
    }
}
