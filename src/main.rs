use anyhow::{Context, Result};
use clap::Parser;
use cnpjscraper::{
    batch::BatchController,
    clock::SystemClock,
    config::Config,
    event_log::EventLog,
    export,
    fetch::HttpFetcher,
    history::ProgressStore,
    input::read_identifiers,
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Resumable, rate-limited CNPJ lookups exported to a spreadsheet"
)]
struct Args {
    /// YAML file with any subset of the run settings
    #[arg(short, long, env = "CNPJ_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long, env = "CNPJ_INPUT")]
    input: Option<PathBuf>,
    /// CSV header holding the identifiers
    #[arg(long, env = "CNPJ_INPUT_COLUMN")]
    input_column: Option<String>,
    /// `.xlsx`, or `.csv` for plain text
    #[arg(short, long, env = "CNPJ_OUTPUT")]
    output: Option<PathBuf>,
    #[arg(long, env = "CNPJ_LOG")]
    log: Option<PathBuf>,
    #[arg(long, env = "CNPJ_PROGRESS")]
    progress: Option<PathBuf>,
    #[arg(long, env = "CNPJ_BATCH_SIZE")]
    batch_size: Option<usize>,
    #[arg(long, env = "CNPJ_BATCH_PAUSE_SECS")]
    batch_pause_secs: Option<u64>,
    #[arg(long, env = "CNPJ_REQUEST_PAUSE_SECS")]
    request_pause_secs: Option<u64>,
    #[arg(long, env = "CNPJ_REQUEST_TIMEOUT_SECS")]
    request_timeout_secs: Option<u64>,
    /// URL with a `{cnpj}` placeholder
    #[arg(long, env = "CNPJ_ENDPOINT")]
    endpoint: Option<String>,
}

impl Args {
    fn into_config(self) -> Result<Config> {
        let mut cfg = match &self.config {
            Some(path) => Config::from_yaml_file(path)?,
            None => Config::default(),
        };
        if let Some(v) = self.input {
            cfg.input_path = v;
        }
        if let Some(v) = self.input_column {
            cfg.input_column = v;
        }
        if let Some(v) = self.output {
            cfg.output_path = v;
        }
        if let Some(v) = self.log {
            cfg.log_path = v;
        }
        if let Some(v) = self.progress {
            cfg.progress_path = v;
        }
        if let Some(v) = self.batch_size {
            cfg.batch_size = v;
        }
        if let Some(v) = self.batch_pause_secs {
            cfg.batch_pause_secs = v;
        }
        if let Some(v) = self.request_pause_secs {
            cfg.request_pause_secs = v;
        }
        if let Some(v) = self.request_timeout_secs {
            cfg.request_timeout_secs = v;
        }
        if let Some(v) = self.endpoint {
            cfg.endpoint_template = v;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    // console shows the bare event text; timestamps live in the log file
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(env)
        .without_time()
        .with_level(false)
        .with_target(false)
        .init();

    // ─── 2) configuration ───────────────────────────────────────────
    let cfg = Args::parse().into_config()?;
    info!(?cfg, "configuration");

    // ─── 3) fatal-on-failure collaborators ──────────────────────────
    let log = EventLog::open(&cfg.log_path)?;
    let raw = match read_identifiers(&cfg.input_path, &cfg.input_column) {
        Ok(raw) => raw,
        Err(e) => {
            log.warn(format!("❌ cannot read input: {:#}", e));
            return Err(e);
        }
    };
    let store = ProgressStore::new(&cfg.progress_path);
    let fetcher = HttpFetcher::from_config(&cfg)?;

    // ─── 4) batch lookups ───────────────────────────────────────────
    let report = BatchController::new(&cfg, &fetcher, &SystemClock, &store, &log)
        .run(&raw)
        .context("batch run aborted")?;

    // ─── 5) export ──────────────────────────────────────────────────
    export::export(&report.records, &cfg.output_path, &log)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let args = Args::parse_from([
            "cnpjscraper",
            "--batch-size",
            "5",
            "--output",
            "out.csv",
            "--endpoint",
            "http://localhost:8080/v1/cnpj/{cnpj}",
        ]);
        let cfg = args.into_config().unwrap();
        assert_eq!(cfg.batch_size, 5);
        assert_eq!(cfg.output_path, PathBuf::from("out.csv"));
        assert_eq!(cfg.batch_pause_secs, 90);
    }

    #[test]
    fn test_invalid_flags_rejected() {
        let args = Args::parse_from(["cnpjscraper", "--batch-size", "0"]);
        assert!(args.into_config().is_err());
    }
}
