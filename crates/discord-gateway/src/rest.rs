//! REST side of the Discord API: posting messages to a channel.
//!
//! Rate limits follow Discord's recommendation: nothing is hardcoded, a 429
//! response is retried after its `Retry-After` (or `X-RateLimit-Reset-After`)
//! delay, up to [`MAX_RATE_LIMIT_RETRIES`] attempts.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::json;
use tracing::{debug, warn};

use crate::error::{GatewayError, Result};

/// Discord REST API root (v10).
pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";

/// Maximum number of characters in a single message.
pub const MESSAGE_LIMIT: usize = 2000;

/// Maximum number of attempts for rate-limited requests.
pub const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Delivers text replies to a channel.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Send `content` to `channel_id`, splitting it if it exceeds the size limit.
    async fn send_message(&self, channel_id: &str, content: &str) -> Result<()>;
}

/// Minimal Discord REST client authenticated with a bot token.
#[derive(Clone)]
pub struct RestClient {
    client: Client,
    api_base: String,
    token: String,
}

impl RestClient {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Self::with_api_base(token, DEFAULT_API_BASE)
    }

    pub fn with_api_base(token: impl Into<String>, api_base: impl Into<String>) -> Result<Self> {
        crate::install_rustls_provider();
        Ok(Self {
            client: Client::builder().build()?,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    /// Post a single message. `content` must already fit [`MESSAGE_LIMIT`].
    pub async fn create_message(&self, channel_id: &str, content: &str) -> Result<()> {
        let url = format!("{}/channels/{}/messages", self.api_base, channel_id);
        let payload = json!({ "content": content });
        let mut attempts = 0;

        loop {
            attempts += 1;

            let response = self
                .client
                .post(&url)
                .header("Authorization", format!("Bot {}", self.token))
                .json(&payload)
                .send()
                .await?;

            let status = response.status();

            if status.is_success() {
                debug!(channel_id, len = content.len(), "Message sent");
                return Ok(());
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                let retry_after = parse_retry_after(&response);

                if attempts >= MAX_RATE_LIMIT_RETRIES {
                    warn!(
                        "Discord rate limit: max retries ({}) exceeded, last retry_after was {:?}",
                        MAX_RATE_LIMIT_RETRIES, retry_after
                    );
                    return Err(GatewayError::RateLimited {
                        retries: MAX_RATE_LIMIT_RETRIES,
                    });
                }

                let wait_duration = retry_after.unwrap_or(Duration::from_secs(1));
                debug!(
                    "Discord rate limited (429), waiting {:?} before retry (attempt {}/{})",
                    wait_duration, attempts, MAX_RATE_LIMIT_RETRIES
                );
                tokio::time::sleep(wait_duration).await;
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            warn!("Discord message send failed: {} - {}", status, body);
            return Err(GatewayError::Api {
                status: status.as_u16(),
                body,
            });
        }
    }
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl MessageSink for RestClient {
    async fn send_message(&self, channel_id: &str, content: &str) -> Result<()> {
        for chunk in split_message(content, MESSAGE_LIMIT) {
            self.create_message(channel_id, &chunk).await?;
        }
        Ok(())
    }
}

/// Parse the retry delay from a 429 response.
fn parse_retry_after(response: &reqwest::Response) -> Option<Duration> {
    for header in ["Retry-After", "X-RateLimit-Reset-After"] {
        if let Some(value) = response.headers().get(header)
            && let Some(secs) = value.to_str().ok().and_then(|s| s.parse::<f64>().ok())
            && secs.is_finite()
            && secs >= 0.0
        {
            return Some(Duration::from_secs_f64(secs));
        }
    }
    None
}

/// Split `content` into chunks of at most `limit` characters.
///
/// Chunks break on line boundaries when possible; a single line longer than
/// `limit` is cut at character boundaries. Blank content yields no chunks.
pub fn split_message(content: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in content.split_inclusive('\n') {
        let line_len = line.chars().count();

        if current_len + line_len <= limit {
            current.push_str(line);
            current_len += line_len;
            continue;
        }

        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if line_len <= limit {
            current.push_str(line);
            current_len = line_len;
            continue;
        }

        let chars: Vec<char> = line.chars().collect();
        for piece in chars.chunks(limit) {
            if piece.len() == limit {
                chunks.push(piece.iter().collect());
            } else {
                current = piece.iter().collect();
                current_len = piece.len();
            }
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks.retain(|chunk| !chunk.trim().is_empty());
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::extract::{Path, State};
    use axum::http::{HeaderMap, StatusCode as AxumStatus};
    use axum::response::IntoResponse;
    use axum::routing::post;
    use serde_json::Value;
    use std::sync::{Arc, Mutex};
    use tokio::net::TcpListener;

    #[derive(Clone, Default)]
    struct Recorder {
        calls: Arc<Mutex<Vec<(String, String, Value)>>>,
        rate_limit_first: Arc<Mutex<u32>>,
    }

    async fn create_message(
        State(recorder): State<Recorder>,
        Path(channel_id): Path<String>,
        headers: HeaderMap,
        axum::Json(body): axum::Json<Value>,
    ) -> impl IntoResponse {
        {
            let mut remaining = recorder.rate_limit_first.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                return (
                    AxumStatus::TOO_MANY_REQUESTS,
                    [("Retry-After", "0.01")],
                    r#"{"message":"You are being rate limited."}"#,
                )
                    .into_response();
            }
        }

        if channel_id == "forbidden" {
            return (AxumStatus::FORBIDDEN, r#"{"message":"Missing Access"}"#).into_response();
        }

        let auth = headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        recorder.calls.lock().unwrap().push((channel_id, auth, body));
        (AxumStatus::OK, "{}").into_response()
    }

    async fn spawn_api(recorder: Recorder) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new()
            .route("/api/v10/channels/{channel_id}/messages", post(create_message))
            .with_state(recorder);
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/api/v10/")
    }

    #[test]
    fn test_split_short_message() {
        assert_eq!(split_message("hello", 2000), vec!["hello".to_string()]);
        assert!(split_message("", 2000).is_empty());
        assert!(split_message("  \n", 2000).is_empty());
    }

    #[test]
    fn test_split_on_line_boundaries() {
        let content = "aaaa\nbbbb\ncccc\n";
        let chunks = split_message(content, 10);
        assert_eq!(chunks, vec!["aaaa\nbbbb\n".to_string(), "cccc\n".to_string()]);
        assert_eq!(chunks.concat(), content);
    }

    #[test]
    fn test_split_long_line_by_characters() {
        let content = "가".repeat(25);
        let chunks = split_message(&content, 10);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
        assert_eq!(chunks.concat(), content);
    }

    #[test]
    fn test_split_long_line_tail_joins_next_line() {
        let chunks = split_message("abcdefghijkl\nxy", 5);
        assert_eq!(chunks, vec!["abcde", "fghij", "kl\nxy"]);
    }

    #[tokio::test]
    async fn test_create_message_sends_bot_auth() {
        let recorder = Recorder::default();
        let client = RestClient::with_api_base("t0k3n", spawn_api(recorder.clone()).await).unwrap();

        client.create_message("42", "hello").await.unwrap();

        let calls = recorder.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "42");
        assert_eq!(calls[0].1, "Bot t0k3n");
        assert_eq!(calls[0].2["content"], "hello");
    }

    #[tokio::test]
    async fn test_create_message_retries_after_rate_limit() {
        let recorder = Recorder::default();
        *recorder.rate_limit_first.lock().unwrap() = 2;
        let client = RestClient::with_api_base("t0k3n", spawn_api(recorder.clone()).await).unwrap();

        client.create_message("42", "hello").await.unwrap();
        assert_eq!(recorder.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_message_gives_up_when_rate_limited() {
        let recorder = Recorder::default();
        *recorder.rate_limit_first.lock().unwrap() = MAX_RATE_LIMIT_RETRIES;
        let client = RestClient::with_api_base("t0k3n", spawn_api(recorder.clone()).await).unwrap();

        let err = client.create_message("42", "hello").await.unwrap_err();
        assert!(matches!(err, GatewayError::RateLimited { retries: 3 }));
        assert!(recorder.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_message_api_error() {
        let recorder = Recorder::default();
        let client = RestClient::with_api_base("t0k3n", spawn_api(recorder.clone()).await).unwrap();

        let err = client.create_message("forbidden", "hello").await.unwrap_err();
        assert!(matches!(err, GatewayError::Api { status: 403, .. }));
    }

    #[tokio::test]
    async fn test_send_message_splits_long_content() {
        let recorder = Recorder::default();
        let client = RestClient::with_api_base("t0k3n", spawn_api(recorder.clone()).await).unwrap();

        let line = format!("{}\n", "x".repeat(999));
        let content = line.repeat(3);
        client.send_message("42", &content).await.unwrap();

        let calls = recorder.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].2["content"].as_str().unwrap(), line.repeat(2));
        assert_eq!(calls[1].2["content"].as_str().unwrap(), line);
    }
}
