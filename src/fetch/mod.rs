//! Single-request access to the registry API and classification of what comes back.

mod outcome;

pub use outcome::{classify, Failure, Outcome, Record};

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use std::time::Duration;
use tracing::debug;

use crate::config::Config;

/// Raw HTTP answer, before any interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The request could not be completed at all (connect, timeout, body read).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Issues one lookup for one identifier. No retries at this layer.
pub trait Fetcher {
    fn fetch(&self, cnpj: &str) -> Result<FetchResponse, TransportError>;
}

/// `GET <endpoint_template with {cnpj} substituted>` over a blocking reqwest client.
pub struct HttpFetcher {
    client: Client,
    endpoint_template: String,
}

impl HttpFetcher {
    pub fn new(endpoint_template: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("cnpjscraper/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            client,
            endpoint_template: endpoint_template.into(),
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(cfg.endpoint_template.clone(), cfg.request_timeout())
    }

    fn url_for(&self, cnpj: &str) -> String {
        self.endpoint_template
            .replace(crate::config::CNPJ_PLACEHOLDER, cnpj)
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, cnpj: &str) -> Result<FetchResponse, TransportError> {
        let url = self.url_for(cnpj);
        debug!(%url, "GET");
        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| TransportError(e.to_string()))?;
        let status = resp.status().as_u16();
        let body = resp.text().map_err(|e| TransportError(e.to_string()))?;
        debug!(%url, status, bytes = body.len(), "response");
        Ok(FetchResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_substitution() {
        let f = HttpFetcher::new("https://host.test/v1/cnpj/{cnpj}", Duration::from_secs(1))
            .unwrap();
        assert_eq!(f.url_for("123"), "https://host.test/v1/cnpj/123");
    }

    #[test]
    fn test_unreachable_host_is_transport_error() {
        // port 9 on localhost: nothing listens, connect is refused immediately
        let f = HttpFetcher::new("http://127.0.0.1:9/v1/cnpj/{cnpj}", Duration::from_secs(2))
            .unwrap();
        assert!(f.fetch("123").is_err());
    }

    #[test]
    fn test_success_range() {
        let ok = FetchResponse {
            status: 204,
            body: String::new(),
        };
        let throttled = FetchResponse {
            status: 429,
            body: String::new(),
        };
        assert!(ok.is_success());
        assert!(!throttled.is_success());
    }
}
