use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use archive_core::DEFAULT_POLL_INTERVAL;
use archive_engine::ApiSettings;
use archive_logging::LogDestination;
use url::Url;

const DEFAULT_API_ROOT: &str = "http://localhost:8000";
const LOG_FILE: &str = "archive_viewer.log";

const VAR_API_ROOT: &str = "ARCHIVE_API_ROOT";
const VAR_REQUEST_TIMEOUT: &str = "ARCHIVE_REQUEST_TIMEOUT_MS";
const VAR_POLL_INTERVAL: &str = "ARCHIVE_POLL_INTERVAL_MS";
const VAR_LOG: &str = "ARCHIVE_LOG";
const VAR_STATE_DIR: &str = "ARCHIVE_STATE_DIR";

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ClientConfig {
    pub api_root: Url,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub poll_interval: Duration,
    pub log_destination: LogDestination,
    /// Where the session file lives.
    pub state_dir: PathBuf,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from defaults overridden by whatever `lookup` returns.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = ApiSettings::new(Url::parse(DEFAULT_API_ROOT)?);
        let mut config = Self {
            api_root: defaults.api_root,
            connect_timeout: defaults.connect_timeout,
            request_timeout: defaults.request_timeout,
            poll_interval: DEFAULT_POLL_INTERVAL,
            log_destination: LogDestination::default(),
            state_dir: PathBuf::from("."),
        };

        let set = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(raw) = set(VAR_API_ROOT) {
            let url =
                Url::parse(raw.trim()).map_err(|err| anyhow!("{VAR_API_ROOT}={raw:?}: {err}"))?;
            if !matches!(url.scheme(), "http" | "https") {
                bail!("{VAR_API_ROOT}={raw:?}: expected an http or https URL");
            }
            config.api_root = url;
        }
        if let Some(raw) = set(VAR_REQUEST_TIMEOUT) {
            config.request_timeout = parse_millis(VAR_REQUEST_TIMEOUT, &raw)?;
        }
        if let Some(raw) = set(VAR_POLL_INTERVAL) {
            config.poll_interval = parse_millis(VAR_POLL_INTERVAL, &raw)?;
        }
        if let Some(raw) = set(VAR_LOG) {
            config.log_destination = LogDestination::parse(&raw)
                .ok_or_else(|| anyhow!("{VAR_LOG}={raw:?}: expected file, terminal or both"))?;
        }
        if let Some(raw) = set(VAR_STATE_DIR) {
            config.state_dir = PathBuf::from(raw.trim());
        }
        Ok(config)
    }

    pub fn api_settings(&self) -> ApiSettings {
        ApiSettings {
            api_root: self.api_root.clone(),
            connect_timeout: self.connect_timeout,
            request_timeout: self.request_timeout,
        }
    }

    /// Log file in the working directory.
    pub fn log_path(&self) -> PathBuf {
        PathBuf::from(".").join(LOG_FILE)
    }
}

fn parse_millis(key: &str, raw: &str) -> Result<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(0) => bail!("{key}={raw:?}: must be greater than zero"),
        Ok(ms) => Ok(Duration::from_millis(ms)),
        Err(err) => bail!("{key}={raw:?}: {err}"),
    }
}
