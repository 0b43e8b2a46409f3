//! Application configuration loaded from environment variables.

use std::path::PathBuf;

use serde::Deserialize;
use url::Url;

/// Fixed filename of the model artifact inside `MODEL_DIR`.
pub const MODEL_FILENAME: &str = "model.json";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Model Artifact ===
    /// Directory holding the model artifact.
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,

    /// Optional URL to download the artifact from when the local copy is
    /// missing.
    #[serde(default)]
    pub model_url: Option<String>,

    // === Server Configuration ===
    /// HTTP server port for the prediction API.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    // === HTTP Client ===
    /// Timeout for the artifact download, in milliseconds.
    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,
}

fn default_model_dir() -> PathBuf {
    PathBuf::from("models")
}

fn default_port() -> u16 {
    8081
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_http_timeout_ms() -> u64 {
    30_000
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.model_dir.as_os_str().is_empty() {
            return Err("MODEL_DIR must not be empty".to_string());
        }

        if let Some(url) = &self.model_url {
            let parsed =
                Url::parse(url).map_err(|e| format!("MODEL_URL is not a valid URL: {e}"))?;
            if parsed.scheme() != "http" && parsed.scheme() != "https" {
                return Err("MODEL_URL must use http or https".to_string());
            }
        }

        if self.http_timeout_ms == 0 {
            return Err("HTTP_TIMEOUT_MS must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Full path of the local model artifact.
    pub fn model_path(&self) -> PathBuf {
        self.model_dir.join(MODEL_FILENAME)
    }
}
