//! Downloads the daily vaccination reports and the national cases file.
//!
//! Every request is attempted exactly once. A failed date is logged, recorded
//! in the returned [`FetchSummary`], and the loop moves on to the next date.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate};
use reqwest::blocking::Client;
use tracing::{debug, info, warn};

use crate::domain::{RunConfig, rate_report_file_name};

/// Why a single download was abandoned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Connection, DNS, TLS or body-read failure.
    Network(String),
    /// The server answered with a non-2xx status.
    Status(u16),
    /// The body arrived but could not be written to disk.
    Io(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Network(msg) => write!(f, "network error: {msg}"),
            FetchError::Status(code) => write!(f, "HTTP status {code}"),
            FetchError::Io(msg) => write!(f, "write failed: {msg}"),
        }
    }
}

impl std::error::Error for FetchError {}

/// Blocking "GET these bytes" seam.
pub trait Transport {
    fn get(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// reqwest-backed transport. Uses the client's default timeouts.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let bytes = resp
            .bytes()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// One abandoned download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    /// Report date, or `None` for the cases file.
    pub date: Option<NaiveDate>,
    pub url: String,
    pub error: FetchError,
}

/// Outcome of a date-range download.
#[derive(Debug, Clone, Default)]
pub struct FetchSummary {
    pub attempted: usize,
    pub written: Vec<PathBuf>,
    pub failures: Vec<FetchFailure>,
}

pub struct Fetcher<'a, T: Transport> {
    transport: T,
    config: &'a RunConfig,
}

impl<'a, T: Transport> Fetcher<'a, T> {
    pub fn new(transport: T, config: &'a RunConfig) -> Self {
        Self { transport, config }
    }

    pub fn rate_report_url(&self, date: NaiveDate) -> String {
        format!("{}{}", self.config.rates_base_url, rate_report_file_name(date))
    }

    pub fn cases_url(&self) -> String {
        format!("{}{}", self.config.cases_base_url, self.config.cases_file_name)
    }

    /// Download one report per day in `[from, to]`, ascending.
    pub fn fetch_rate_reports(&self, from: NaiveDate, to: NaiveDate) -> FetchSummary {
        let mut summary = FetchSummary::default();
        let mut date = from;

        while date <= to {
            summary.attempted += 1;
            let url = self.rate_report_url(date);
            let path = self.config.rate_report_path(date);

            match self.download(&url, &path) {
                Ok(()) => {
                    debug!(date = %date, path = %path.display(), "Report downloaded");
                    summary.written.push(path);
                }
                Err(error) => {
                    warn!(date = %date, error = %error, "Failed to download vaccination report");
                    summary.failures.push(FetchFailure {
                        date: Some(date),
                        url,
                        error,
                    });
                }
            }

            date += Duration::days(1);
        }

        info!(
            attempted = summary.attempted,
            written = summary.written.len(),
            failed = summary.failures.len(),
            "Vaccination reports downloaded"
        );
        summary
    }

    /// Download the single cases file.
    pub fn fetch_cases_file(&self) -> Result<PathBuf, FetchFailure> {
        let url = self.cases_url();
        let path = self.config.cases_path();

        match self.download(&url, &path) {
            Ok(()) => {
                info!(path = %path.display(), "Cases file downloaded");
                Ok(path)
            }
            Err(error) => {
                warn!(error = %error, "Failed to download cases file");
                Err(FetchFailure {
                    date: None,
                    url,
                    error,
                })
            }
        }
    }

    fn download(&self, url: &str, path: &Path) -> Result<(), FetchError> {
        let bytes = self.transport.get(url)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| FetchError::Io(e.to_string()))?;
            }
        }
        fs::write(path, bytes).map_err(|e| FetchError::Io(e.to_string()))
    }
}
