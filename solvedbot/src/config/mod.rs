//! Runtime configuration.
//!
//! Every setting can come from a command-line flag or an environment
//! variable (a `.env` file is loaded first by `main`).

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use discord_gateway::{DEFAULT_API_BASE, DEFAULT_GATEWAY_URL, GatewayConfig, Intents};
use solvedac::{DEFAULT_API_URL, SolvedAcConfig};

use crate::{Error, Result};

/// solvedbot: relays solved.ac statistics into Discord channels.
#[derive(Parser, Clone)]
#[command(author, version, about, long_about = None)]
pub struct AppConfig {
    /// Discord bot token
    #[arg(long, env = "DISCORD_BOT_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Directory holding the `{handle}_info.json` snapshots
    #[arg(long, env = "SOLVEDBOT_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// solved.ac API root
    #[arg(long, env = "SOLVED_AC_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Timeout for solved.ac requests in seconds (0 disables it)
    #[arg(long, env = "SOLVEDBOT_HTTP_TIMEOUT_SECS", default_value_t = 10)]
    pub http_timeout_secs: u64,

    /// Also write daily-rotated log files to this directory
    #[arg(long, env = "SOLVEDBOT_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Days to keep rotated log files
    #[arg(long, env = "SOLVEDBOT_LOG_RETENTION_DAYS", default_value_t = 7)]
    pub log_retention_days: u32,

    /// Discord gateway websocket URL
    #[arg(long, env = "DISCORD_GATEWAY_URL", default_value = DEFAULT_GATEWAY_URL)]
    pub gateway_url: String,

    /// Discord REST API root
    #[arg(long, env = "DISCORD_API_BASE", default_value = DEFAULT_API_BASE)]
    pub discord_api_base: String,
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(Error::config("Discord bot token must not be empty"));
        }
        if self.data_dir.as_os_str().is_empty() {
            return Err(Error::config("data directory must not be empty"));
        }
        if self.api_url.trim().is_empty() {
            return Err(Error::config("solved.ac API URL must not be empty"));
        }
        if !self.gateway_url.starts_with("ws://") && !self.gateway_url.starts_with("wss://") {
            return Err(Error::config(format!(
                "gateway URL must use ws:// or wss://, got {}",
                self.gateway_url
            )));
        }
        Ok(())
    }

    pub fn solved_ac_config(&self) -> SolvedAcConfig {
        SolvedAcConfig {
            base_url: self.api_url.clone(),
            timeout: Duration::from_secs(self.http_timeout_secs),
            ..Default::default()
        }
    }

    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            url: self.gateway_url.clone(),
            intents: Intents::text_commands(),
            ..GatewayConfig::new(self.token.clone())
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("token", &"<redacted>")
            .field("data_dir", &self.data_dir)
            .field("api_url", &self.api_url)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("log_dir", &self.log_dir)
            .field("log_retention_days", &self.log_retention_days)
            .field("gateway_url", &self.gateway_url)
            .field("discord_api_base", &self.discord_api_base)
            .finish()
    }
}
