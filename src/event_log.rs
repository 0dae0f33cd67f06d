use anyhow::{Context, Result};
use chrono::Local;
use std::{
    fs::{self, File, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};
use tracing::{error, info, warn};

/// Append-only, human-readable run log.
///
/// Each event is written as `[YYYY-MM-DD HH:MM:SS] message` and flushed before
/// `log` returns; the bare message is echoed to the console via `tracing`.
pub struct EventLog {
    path: PathBuf,
    file: Mutex<File>,
}

enum Level {
    Info,
    Warn,
}

impl EventLog {
    /// Open (or create) the sink. Failing here is fatal for the run.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating log directory {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("opening log file {}", path.display()))?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn log(&self, msg: impl AsRef<str>) {
        self.write(Level::Info, msg.as_ref());
    }

    pub fn warn(&self, msg: impl AsRef<str>) {
        self.write(Level::Warn, msg.as_ref());
    }

    fn write(&self, level: Level, msg: &str) {
        let line = format!("[{}] {}\n", Local::now().format("%Y-%m-%d %H:%M:%S"), msg);
        // a writer that panicked mid-line leaves the file usable; keep appending
        let res = {
            let mut f = self.file.lock().unwrap_or_else(PoisonError::into_inner);
            f.write_all(line.as_bytes()).and_then(|_| f.flush())
        };
        if let Err(e) = res {
            error!(path = %self.path.display(), error = %e, "could not append to log file");
        }

        match level {
            Level::Info => info!("{}", msg),
            Level::Warn => warn!("{}", msg),
        }
    }
}
