use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000";
const CONFIG_FILE: &str = "env.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    Up,
    Down,
    Unknown,
}

/// Persistent CLI state: which server to talk to and who we are on it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    pub server_url: String,
    pub token: Option<String>,
    pub email: Option<String>,
    pub last_ping: Option<DateTime<Utc>>,
    pub status: ServerStatus,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            token: None,
            email: None,
            last_ping: None,
            status: ServerStatus::Unknown,
        }
    }
}

impl CliConfig {
    /// Point at a new server. Credentials belong to the old one.
    pub fn set_server(&mut self, url: &str) -> anyhow::Result<()> {
        let parsed = url::Url::parse(url).map_err(|e| anyhow::anyhow!("Invalid server URL '{}': {}", url, e))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("Server URL must use http or https: {}", url);
        }

        self.server_url = url.trim_end_matches('/').to_string();
        self.status = ServerStatus::Unknown;
        self.last_ping = None;
        self.clear_session();
        Ok(())
    }

    pub fn set_session(&mut self, email: String, token: String) {
        self.email = Some(email);
        self.token = Some(token);
    }

    pub fn clear_session(&mut self) {
        self.email = None;
        self.token = None;
    }

    pub fn update_ping(&mut self, status: ServerStatus) {
        self.last_ping = Some(Utc::now());
        self.status = status;
    }
}

pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    let config_dir = if let Ok(custom_dir) = std::env::var("CALC_CLI_CONFIG_DIR") {
        PathBuf::from(custom_dir)
    } else {
        let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
        PathBuf::from(home).join(".config").join("calc").join("cli")
    };

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

pub fn load_config() -> anyhow::Result<CliConfig> {
    load_config_from(&get_config_dir()?)
}

pub fn save_config(config: &CliConfig) -> anyhow::Result<()> {
    save_config_to(&get_config_dir()?, config)
}

pub fn load_config_from(dir: &Path) -> anyhow::Result<CliConfig> {
    let config_file = dir.join(CONFIG_FILE);

    if !config_file.exists() {
        return Ok(CliConfig::default());
    }

    let content = fs::read_to_string(config_file)?;
    let config: CliConfig = serde_json::from_str(&content)?;
    Ok(config)
}

pub fn save_config_to(dir: &Path, config: &CliConfig) -> anyhow::Result<()> {
    let content = serde_json::to_string_pretty(config)?;
    fs::write(dir.join(CONFIG_FILE), content)?;
    Ok(())
}

pub async fn ping_server(server_url: &str) -> ServerStatus {
    let client = reqwest::Client::new();
    let url = format!("{}/health", server_url);

    match client.get(&url).timeout(std::time::Duration::from_secs(5)).send().await {
        Ok(response) if response.status().is_success() => ServerStatus::Up,
        _ => ServerStatus::Down,
    }
}
