use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

pub const DEFAULT_API_BASE_URL: &str = "https://arraiaware-backend.onrender.com/api";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_DATA_DIR: &str = ".arraiaware";

const ENV_API_BASE_URL: &str = "ARRAIAWARE_API_BASE_URL";
const ENV_HTTP_TIMEOUT: &str = "ARRAIAWARE_HTTP_TIMEOUT_SECS";
const ENV_DATA_DIR: &str = "ARRAIAWARE_DATA_DIR";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_base_url: String,
    pub http_timeout: Duration,
    pub data_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(url) = read_env(ENV_API_BASE_URL) {
            config.api_base_url = url;
        }

        if let Some(raw) = read_env(ENV_HTTP_TIMEOUT) {
            match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => config.http_timeout = Duration::from_secs(secs),
                _ => warn!(
                    target: "app::config",
                    value = %raw,
                    "ignoring invalid HTTP timeout, keeping default"
                ),
            }
        }

        if let Some(dir) = read_env(ENV_DATA_DIR) {
            config.data_dir = PathBuf::from(dir);
        }

        config.api_base_url = config.api_base_url.trim_end_matches('/').to_string();
        config
    }

    /// Config pointing at a custom backend, used by tests and embedding shells.
    pub fn with_base_url(base_url: impl Into<String>, data_dir: impl Into<PathBuf>) -> Self {
        let base_url = base_url.into();
        Self {
            api_base_url: base_url.trim_end_matches('/').to_string(),
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn session_file(&self) -> PathBuf {
        self.data_dir.join("session.json")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

fn read_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
