//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `MARKSURE_*` environment variables.

pub mod error;

#[cfg(test)]
mod tests;

pub use error::ConfigError;

use std::env;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::DEFAULT_MAX_UPLOAD_BYTES;

/// Server configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `MARKSURE_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port. Default: `5000`.
    pub port: u16,

    /// IP address to bind to. Default: `127.0.0.1`.
    pub bind_addr: IpAddr,

    /// Directory holding the JSON snapshot and uploaded images. Default: `./.data`.
    pub storage_path: PathBuf,

    /// Base URL of the OCR service. Default: `http://localhost:8000`.
    pub ai_service_url: String,

    /// Timeout for a single OCR call. Default: 30 seconds.
    pub ai_timeout: Duration,

    /// Largest accepted upload in bytes. Default: 10 MiB.
    pub max_upload_bytes: usize,

    /// Use the in-process mock OCR backend instead of the HTTP service.
    pub mock_ocr: bool,
}

/// OCR service URL used when `MARKSURE_AI_SERVICE_URL` is not set.
pub const DEFAULT_AI_SERVICE_URL: &str = "http://localhost:8000";

/// OCR timeout used when `MARKSURE_AI_TIMEOUT_SECS` is not set.
pub const DEFAULT_AI_TIMEOUT_SECS: u64 = 30;

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5000,
            bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
            storage_path: PathBuf::from("./.data"),
            ai_service_url: DEFAULT_AI_SERVICE_URL.to_string(),
            ai_timeout: Duration::from_secs(DEFAULT_AI_TIMEOUT_SECS),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            mock_ocr: false,
        }
    }
}

impl Config {
    const ENV_PORT: &'static str = "MARKSURE_PORT";
    const ENV_BIND_ADDR: &'static str = "MARKSURE_BIND_ADDR";
    const ENV_STORAGE_PATH: &'static str = "MARKSURE_STORAGE_PATH";
    const ENV_AI_SERVICE_URL: &'static str = "MARKSURE_AI_SERVICE_URL";
    const ENV_AI_TIMEOUT_SECS: &'static str = "MARKSURE_AI_TIMEOUT_SECS";
    const ENV_MAX_UPLOAD_BYTES: &'static str = "MARKSURE_MAX_UPLOAD_BYTES";
    const ENV_MOCK_OCR: &'static str = "MARKSURE_MOCK_OCR";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = Self::parse_port_from_env(defaults.port)?;
        let bind_addr = Self::parse_bind_addr_from_env(defaults.bind_addr)?;
        let storage_path = Self::parse_path_from_env(Self::ENV_STORAGE_PATH, defaults.storage_path);
        let ai_service_url =
            Self::parse_string_from_env(Self::ENV_AI_SERVICE_URL, defaults.ai_service_url);
        let ai_timeout = Duration::from_secs(Self::parse_u64_from_env(
            Self::ENV_AI_TIMEOUT_SECS,
            defaults.ai_timeout.as_secs(),
        ));
        let max_upload_bytes = Self::parse_u64_from_env(
            Self::ENV_MAX_UPLOAD_BYTES,
            defaults.max_upload_bytes as u64,
        ) as usize;
        let mock_ocr = Self::parse_flag_from_env(Self::ENV_MOCK_OCR);

        Ok(Self {
            port,
            bind_addr,
            storage_path,
            ai_service_url,
            ai_timeout,
            max_upload_bytes,
            mock_ocr,
        })
    }

    /// Validates paths and basic invariants (does not create directories).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_path.exists() && !self.storage_path.is_dir() {
            return Err(ConfigError::NotADirectory {
                path: self.storage_path.clone(),
            });
        }

        if !self.mock_ocr
            && !(self.ai_service_url.starts_with("http://")
                || self.ai_service_url.starts_with("https://"))
        {
            return Err(ConfigError::InvalidServiceUrl {
                value: self.ai_service_url.clone(),
            });
        }

        if self.ai_timeout.is_zero() {
            return Err(ConfigError::ZeroValue {
                name: Self::ENV_AI_TIMEOUT_SECS,
            });
        }

        if self.max_upload_bytes == 0 {
            return Err(ConfigError::ZeroValue {
                name: Self::ENV_MAX_UPLOAD_BYTES,
            });
        }

        Ok(())
    }

    /// Returns `"{bind_addr}:{port}"` (useful for logging/binding).
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    /// Directory uploaded images are written to.
    pub fn uploads_dir(&self) -> PathBuf {
        self.storage_path.join("uploads")
    }

    /// Path of the JSON snapshot of both stores.
    pub fn snapshot_path(&self) -> PathBuf {
        self.storage_path.join("snapshot.json")
    }

    fn parse_port_from_env(default: u16) -> Result<u16, ConfigError> {
        match env::var(Self::ENV_PORT) {
            Ok(value) => {
                let port: u16 = value.parse().map_err(|e| ConfigError::PortParseError {
                    value: value.clone(),
                    source: e,
                })?;

                if port == 0 {
                    return Err(ConfigError::InvalidPort { value });
                }

                Ok(port)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_bind_addr_from_env(default: IpAddr) -> Result<IpAddr, ConfigError> {
        match env::var(Self::ENV_BIND_ADDR) {
            Ok(value) => value
                .parse()
                .map_err(|e| ConfigError::InvalidBindAddr { value, source: e }),
            Err(_) => Ok(default),
        }
    }

    fn parse_path_from_env(var_name: &str, default: PathBuf) -> PathBuf {
        env::var(var_name).map(PathBuf::from).unwrap_or(default)
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(default)
    }

    fn parse_u64_from_env(var_name: &str, default: u64) -> u64 {
        env::var(var_name)
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    fn parse_flag_from_env(var_name: &str) -> bool {
        env::var(var_name)
            .map(|v| {
                let v = v.trim();
                !v.is_empty() && v != "0" && !v.eq_ignore_ascii_case("false")
            })
            .unwrap_or(false)
    }
}
