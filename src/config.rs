use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf, time::Duration};
use url::Url;

/// Placeholder substituted with the identifier in `endpoint_template`.
pub const CNPJ_PLACEHOLDER: &str = "{cnpj}";

/// Everything a run needs to know. Every field has a default, so a YAML
/// file only has to name what it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input_path: PathBuf,
    /// Header of the CSV column holding the raw identifiers.
    pub input_column: String,
    pub output_path: PathBuf,
    pub log_path: PathBuf,
    pub progress_path: PathBuf,
    pub batch_size: usize,
    pub batch_pause_secs: u64,
    pub request_pause_secs: u64,
    pub request_timeout_secs: u64,
    pub endpoint_template: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("CNPJS.csv"),
            input_column: "A2_CGC".to_string(),
            output_path: PathBuf::from("dados_empresas.xlsx"),
            log_path: PathBuf::from("log_consulta.txt"),
            progress_path: PathBuf::from("progresso.json"),
            batch_size: 3,
            batch_pause_secs: 90,
            request_pause_secs: 2,
            request_timeout_secs: 30,
            endpoint_template: "https://www.receitaws.com.br/v1/cnpj/{cnpj}".to_string(),
        }
    }
}

impl Config {
    /// Load a YAML file on top of the defaults.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_yaml::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))
    }

    /// Reject settings that would make the run meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            bail!("batch_size must be at least 1");
        }
        if !self.endpoint_template.contains(CNPJ_PLACEHOLDER) {
            bail!(
                "endpoint_template `{}` has no `{}` placeholder",
                self.endpoint_template,
                CNPJ_PLACEHOLDER
            );
        }
        let probe = self.endpoint_for("00000000000000");
        Url::parse(&probe)
            .with_context(|| format!("endpoint_template renders invalid URL `{}`", probe))?;
        Ok(())
    }

    pub fn endpoint_for(&self, cnpj: &str) -> String {
        self.endpoint_template.replace(CNPJ_PLACEHOLDER, cnpj)
    }

    pub fn batch_pause(&self) -> Duration {
        Duration::from_secs(self.batch_pause_secs)
    }

    pub fn request_pause(&self) -> Duration {
        Duration::from_secs(self.request_pause_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
