use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "MedScribe";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8787";
const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-pro";
const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_VISION_URL: &str = "https://vision.googleapis.com/v1";
const DEFAULT_RXNAV_URL: &str = "https://rxnav.nlm.nih.gov/REST";

/// Terminology lookups are best-effort; a slow RxNav must not stall a request.
const DEFAULT_TERMINOLOGY_TIMEOUT_SECS: u64 = 3;
const DEFAULT_SERVICE_TIMEOUT_SECS: u64 = 60;

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "medscribe_lib=info,medscribe=info,tower_http=warn"
}

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Runtime configuration for the recognition service.
///
/// Every field has a default so a bare `medscribe` start works; missing API keys
/// surface later as the "invalid or missing API key" advisory, not at startup.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_addr: SocketAddr,
    pub gemini_api_key: String,
    pub vision_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub vision_base_url: String,
    pub rxnav_base_url: String,
    pub terminology_timeout: Duration,
    pub service_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8787)),
            gemini_api_key: String::new(),
            vision_api_key: String::new(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_URL.to_string(),
            vision_base_url: DEFAULT_VISION_URL.to_string(),
            rxnav_base_url: DEFAULT_RXNAV_URL.to_string(),
            terminology_timeout: Duration::from_secs(DEFAULT_TERMINOLOGY_TIMEOUT_SECS),
            service_timeout: Duration::from_secs(DEFAULT_SERVICE_TIMEOUT_SECS),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str, default: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let bind_raw = text("MEDSCRIBE_BIND_ADDR", DEFAULT_BIND_ADDR);
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidValue {
                key: "MEDSCRIBE_BIND_ADDR",
                value: bind_raw.clone(),
            })?;

        let terminology_timeout = parse_secs(
            "MEDSCRIBE_TERMINOLOGY_TIMEOUT_SECS",
            lookup("MEDSCRIBE_TERMINOLOGY_TIMEOUT_SECS"),
            DEFAULT_TERMINOLOGY_TIMEOUT_SECS,
        )?;
        let service_timeout = parse_secs(
            "MEDSCRIBE_SERVICE_TIMEOUT_SECS",
            lookup("MEDSCRIBE_SERVICE_TIMEOUT_SECS"),
            DEFAULT_SERVICE_TIMEOUT_SECS,
        )?;

        Ok(Self {
            bind_addr,
            gemini_api_key: text("GOOGLE_GENERATIVE_AI_API_KEY", ""),
            vision_api_key: text("GOOGLE_CLOUD_VISION_API_KEY", ""),
            gemini_model: text("MEDSCRIBE_GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
            gemini_base_url: text("MEDSCRIBE_GEMINI_URL", DEFAULT_GEMINI_URL),
            vision_base_url: text("MEDSCRIBE_VISION_URL", DEFAULT_VISION_URL),
            rxnav_base_url: text("MEDSCRIBE_RXNAV_URL", DEFAULT_RXNAV_URL),
            terminology_timeout,
            service_timeout,
        })
    }
}

fn parse_secs(
    key: &'static str,
    raw: Option<String>,
    default: u64,
) -> Result<Duration, ConfigError> {
    match raw.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        None => Ok(Duration::from_secs(default)),
        Some(value) => match value.parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
            _ => Err(ConfigError::InvalidValue { key, value }),
        },
    }
}
