use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Base URL of the Certifact backend.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Opaque bearer token for authenticated requests. Protected calls fail
    /// with an auth error when absent.
    pub auth_token: Option<String>,

    /// Fixed status-poll cadence in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Per-request timeout in seconds; bounds every call the client makes.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Path of the persisted history file.
    #[serde(default = "default_history_path")]
    pub history_path: PathBuf,
}

fn default_api_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_poll_interval_ms() -> u64 {
    3000
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_history_path() -> PathBuf {
    PathBuf::from("analysis_history.json")
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }
}
