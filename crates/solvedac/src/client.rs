//! HTTP client for the solved.ac API.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, error, info};
use url::Url;

use crate::error::Result;
use crate::models::{UserShowResponse, UserStats};
use crate::source::StatsSource;

/// Public solved.ac v3 API root.
pub const DEFAULT_API_URL: &str = "https://solved.ac/api/v3";

const DEFAULT_TIMEOUT_SECS: u64 = 10;

const DEFAULT_USER_AGENT: &str = concat!("solvedbot/", env!("CARGO_PKG_VERSION"));

pub(crate) fn install_rustls_provider() {
    static PROVIDER_INSTALLED: OnceLock<()> = OnceLock::new();
    PROVIDER_INSTALLED.get_or_init(|| {
        if let Err(e) = rustls::crypto::aws_lc_rs::default_provider().install_default() {
            // Safe to ignore: can happen if another crate installed it first.
            debug!(existing_provider = ?e, "rustls CryptoProvider already installed");
        }
    });
}

/// solved.ac client configuration.
#[derive(Debug, Clone)]
pub struct SolvedAcConfig {
    /// API root, without the trailing `/user/show`.
    pub base_url: String,
    /// Per-request timeout. `Duration::ZERO` disables it.
    pub timeout: Duration,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
}

impl Default for SolvedAcConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl SolvedAcConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

/// Client for the solved.ac `user/show` endpoint.
#[derive(Debug, Clone)]
pub struct SolvedAcClient {
    config: SolvedAcConfig,
    client: Client,
}

impl SolvedAcClient {
    /// Create a new client from `config`.
    pub fn new(config: SolvedAcConfig) -> Result<Self> {
        install_rustls_provider();

        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if config.timeout > Duration::ZERO {
            builder = builder.timeout(config.timeout);
        }

        Ok(Self {
            client: builder.build()?,
            config,
        })
    }

    pub fn config(&self) -> &SolvedAcConfig {
        &self.config
    }

    /// Build `{base_url}/user/show?handle={handle}`.
    pub fn user_show_url(&self, handle: &str) -> Result<Url> {
        let endpoint = format!("{}/user/show", self.config.base_url.trim_end_matches('/'));
        Ok(Url::parse_with_params(&endpoint, &[("handle", handle)])?)
    }

    /// Fetch the solved count and rating of `handle`.
    ///
    /// A non-200 answer is not an error: it is logged and reported as zero
    /// stats, so an unknown handle and an empty profile look the same.
    /// Transport failures and undecodable bodies are returned as errors.
    pub async fn fetch_user_stats(&self, handle: &str) -> Result<UserStats> {
        let url = self.user_show_url(handle)?;
        debug!(handle, url = %url, "Requesting solved.ac user/show");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        info!(handle, status = status.as_u16(), body = %body, "API response for user/show");

        if status != StatusCode::OK {
            error!(handle, status = status.as_u16(), "Failed to get stats from solved.ac");
            return Ok(UserStats::default());
        }

        let stats = UserStats::from(serde_json::from_str::<UserShowResponse>(&body)?);
        info!(
            handle,
            solved_count = stats.solved_count,
            rating = stats.rating,
            "Fetched solved.ac stats"
        );
        Ok(stats)
    }
}

#[async_trait]
impl StatsSource for SolvedAcClient {
    async fn fetch_user_stats(&self, handle: &str) -> Result<UserStats> {
        SolvedAcClient::fetch_user_stats(self, handle).await
    }
}
