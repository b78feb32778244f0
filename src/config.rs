//! Configuration for Gatehouse
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::cache::CacheConfig;
use crate::queue::QueueConfig;
use crate::store::SheetsStoreConfig;

/// Gatehouse - account allocation gateway over a shared spreadsheet
#[derive(Parser, Debug, Clone)]
#[command(name = "gatehouse")]
#[command(about = "Hands out exclusive account rows from a shared spreadsheet")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    pub log_json: bool,

    /// JSON file of token digests (required in production)
    #[arg(long, env = "TOKENS_FILE")]
    pub tokens_file: Option<PathBuf>,

    /// Sheets API root
    #[arg(long, env = "SHEETS_API_BASE", default_value = "https://sheets.googleapis.com")]
    pub sheets_api_base: String,

    /// OAuth bearer token for the Sheets API (required in production)
    #[arg(long, env = "SHEETS_ACCESS_TOKEN")]
    pub sheets_access_token: Option<String>,

    /// Sheet used when a request names none
    #[arg(long, env = "DEFAULT_SHEET", default_value = "Accounts")]
    pub default_sheet: String,

    /// First sheet row holding account data
    #[arg(long, env = "DATA_START_ROW", default_value = "11")]
    pub data_start_row: usize,

    /// Last sheet row loaded into the cache
    #[arg(long, env = "DATA_END_ROW", default_value = "5000")]
    pub data_end_row: usize,

    /// Partition time-to-live in seconds
    #[arg(long, env = "CACHE_TTL_SECS", default_value = "300")]
    pub cache_ttl_secs: u64,

    /// Write-back debounce delay in milliseconds
    #[arg(long, env = "FLUSH_DELAY_MS", default_value = "3000")]
    pub flush_delay_ms: u64,

    /// Bound on a single remote fetch in seconds
    #[arg(long, env = "FETCH_TIMEOUT_SECS", default_value = "20")]
    pub fetch_timeout_secs: u64,

    /// Mail domains whose inboxes the service can read (comma separated)
    #[arg(long, env = "SYSTEM_EMAIL_DOMAINS", value_delimiter = ',')]
    pub system_email_domains: Vec<String>,

    /// Enable development mode (in-memory store, single dev token)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Token accepted in dev mode
    #[arg(long, env = "DEV_TOKEN", default_value = "dev-token")]
    pub dev_token: String,

    /// Store id the dev token maps to
    #[arg(long, env = "DEV_STORE_ID", default_value = "dev")]
    pub dev_store_id: String,
}

impl Args {
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            ttl: Duration::from_secs(self.cache_ttl_secs),
            data_start_row: self.data_start_row,
            data_end_row: self.data_end_row,
            fetch_timeout: Duration::from_secs(self.fetch_timeout_secs),
            ..CacheConfig::default()
        }
    }

    pub fn queue_config(&self) -> QueueConfig {
        QueueConfig {
            flush_delay: Duration::from_millis(self.flush_delay_ms),
            data_start_row: self.data_start_row,
        }
    }

    pub fn sheets_config(&self) -> SheetsStoreConfig {
        SheetsStoreConfig {
            base_url: self.sheets_api_base.trim_end_matches('/').to_string(),
            access_token: self.sheets_access_token.clone().filter(|t| !t.is_empty()),
            timeout: Duration::from_secs(self.fetch_timeout_secs),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode {
            if self.tokens_file.is_none() {
                return Err("TOKENS_FILE is required in production mode".to_string());
            }
            if self.sheets_access_token.as_deref().unwrap_or("").is_empty() {
                return Err("SHEETS_ACCESS_TOKEN is required in production mode".to_string());
            }
        }

        if self.data_start_row == 0 {
            return Err("DATA_START_ROW must be at least 1".to_string());
        }
        if self.data_end_row < self.data_start_row {
            return Err("DATA_END_ROW must be greater than or equal to DATA_START_ROW".to_string());
        }
        if self.cache_ttl_secs == 0 {
            return Err("CACHE_TTL_SECS must be greater than zero".to_string());
        }
        if self.fetch_timeout_secs == 0 {
            return Err("FETCH_TIMEOUT_SECS must be greater than zero".to_string());
        }
        if self.default_sheet.trim().is_empty() {
            return Err("DEFAULT_SHEET must not be empty".to_string());
        }

        Ok(())
    }
}
