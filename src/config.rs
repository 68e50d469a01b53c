use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 5 * 60;
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 30;

const ENV_SPREADSHEET_ID: &str = "BRIKKS_SPREADSHEET_ID";
const ENV_API_KEY: &str = "BRIKKS_API_KEY";
const ENV_RPC_URL: &str = "BRIKKS_RPC_URL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RpcTransportKind {
    #[default]
    Jsonp,
    Fetch,
}

/// Read-only settings shared by the table store and the action channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub spreadsheet_id: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub rpc_url: String,
    /// Logical table name -> spreadsheet tab.
    #[serde(default)]
    pub sheets: BTreeMap<String, String>,
    #[serde(default = "default_sheets_base_url")]
    pub sheets_base_url: String,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// 0 disables the timer.
    #[serde(default = "default_rpc_timeout_secs")]
    pub rpc_timeout_secs: u64,
    #[serde(default)]
    pub rpc_transport: RpcTransportKind,
}

fn default_sheets_base_url() -> String {
    DEFAULT_SHEETS_BASE_URL.to_string()
}

fn default_cache_ttl_secs() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}

fn default_rpc_timeout_secs() -> u64 {
    DEFAULT_RPC_TIMEOUT_SECS
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.to_string_lossy()))?;
        let mut cfg = Self::from_json_str(&text)
            .with_context(|| format!("failed to parse config {}", path.to_string_lossy()))?;
        cfg.apply_env_overrides();
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_str(text: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var(ENV_SPREADSHEET_ID) {
            self.spreadsheet_id = v;
        }
        if let Ok(v) = std::env::var(ENV_API_KEY) {
            self.api_key = v;
        }
        if let Ok(v) = std::env::var(ENV_RPC_URL) {
            self.rpc_url = v;
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.spreadsheet_id.trim().is_empty() {
            return Err(anyhow!("spreadsheetId must not be empty"));
        }
        if self.api_key.trim().is_empty() {
            return Err(anyhow!("apiKey must not be empty"));
        }
        if self.rpc_url.trim().is_empty() {
            return Err(anyhow!("rpcUrl must not be empty"));
        }
        url::Url::parse(&self.rpc_url)
            .with_context(|| format!("rpcUrl is not a valid URL: {}", self.rpc_url))?;
        url::Url::parse(&self.sheets_base_url).with_context(|| {
            format!("sheetsBaseUrl is not a valid URL: {}", self.sheets_base_url)
        })?;
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn rpc_timeout(&self) -> Option<Duration> {
        match self.rpc_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Maps a logical table name to its tab; unknown names are used as-is.
    pub fn resolve_table<'a>(&'a self, name: &'a str) -> &'a str {
        self.sheets.get(name).map(String::as_str).unwrap_or(name)
    }
}
