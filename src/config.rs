// src/config.rs

use serde::Deserialize;

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_window_days() -> u32 {
    7
}

/// Runtime settings, read once at startup. Every key has a default so the
/// server comes up in a bare environment.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_host")]
    pub server_host: String,
    #[serde(default = "default_port")]
    pub server_port: u16,
    /// Paste-format text file loaded into the empty collection at startup.
    #[serde(default)]
    pub seed_data_path: Option<String>,
    /// Window length handed out when a schedule request does not name one.
    #[serde(default = "default_window_days")]
    pub window_days: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        // Load .env file if it exists
        dotenv::dotenv().ok();
        envy::from_env::<Config>()
    }
}
