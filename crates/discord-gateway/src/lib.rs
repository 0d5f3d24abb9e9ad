//! discord-gateway: the slice of the Discord API a text-command bot needs.
//!
//! ## Inbound
//!
//! - [`Gateway`] - Connects to the gateway websocket, identifies, keeps the
//!   heartbeat going and reconnects with backoff
//! - [`GatewayConnection`] - Handle yielding decoded [`GatewayEvent`]s
//!
//! ## Outbound
//!
//! - [`RestClient`] - Posts channel messages, honoring rate limits
//! - [`MessageSink`] - Trait for anything that can deliver a reply to a channel
//! - [`split_message`] - Splits long replies to fit the message size limit

pub mod connection;
pub mod error;
pub mod event;
pub mod protocol;
pub mod rest;

pub use connection::{
    DEFAULT_GATEWAY_URL, Gateway, GatewayConfig, GatewayConnection, ReconnectConfig,
};
pub use error::{GatewayError, Result};
pub use event::{Author, ChatMessage, GatewayEvent, ReadyEvent};
pub use protocol::{Intents, OpCode};
pub use rest::{DEFAULT_API_BASE, MESSAGE_LIMIT, MessageSink, RestClient, split_message};

use std::sync::OnceLock;

pub(crate) fn install_rustls_provider() {
    static PROVIDER_INSTALLED: OnceLock<()> = OnceLock::new();
    PROVIDER_INSTALLED.get_or_init(|| {
        if let Err(e) = rustls::crypto::aws_lc_rs::default_provider().install_default() {
            // Safe to ignore: can happen if another crate installed it first.
            tracing::debug!(existing_provider = ?e, "rustls CryptoProvider already installed");
        }
    });
}
