//! Centralized configuration (environment variables + defaults).

use crate::error::{Result, StoreError};

/// Connection settings for the remote spreadsheet store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// API origin, e.g. `https://sheets.googleapis.com`.
    pub base_url: String,
    /// Spreadsheet document id holding the entity tabs.
    pub spreadsheet_id: String,
    /// Bearer token for the store API.
    pub api_token: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl StoreConfig {
    /// Loads from process environment. Call `dotenv::dotenv()` first in
    /// binaries that want `.env` support.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Loads from any key -> value source.
    pub fn from_vars<F>(vars: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = vars("SHEETS_BASE_URL")
            .unwrap_or_else(|| "https://sheets.googleapis.com".to_string());
        let spreadsheet_id = required(&vars, "SHEETS_SPREADSHEET_ID")?;
        let api_token = required(&vars, "SHEETS_API_TOKEN")?;
        let timeout_secs = match vars("SHEETS_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().map_err(|_| {
                StoreError::configuration(format!(
                    "SHEETS_TIMEOUT_SECS must be a positive integer, got '{}'",
                    raw
                ))
            })?,
            None => 10,
        };
        if timeout_secs == 0 {
            return Err(StoreError::configuration(
                "SHEETS_TIMEOUT_SECS must be at least 1",
            ));
        }
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            spreadsheet_id,
            api_token,
            timeout_secs,
        })
    }
}

/// Settings for the HTTP API server itself.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
        }
    }
}

fn required<F>(vars: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    match vars(key) {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(StoreError::configuration(format!("{} must be set", key))),
    }
}
