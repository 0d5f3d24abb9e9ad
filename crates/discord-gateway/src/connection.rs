//! Gateway websocket connection management.
//!
//! [`Gateway::connect`] spawns one management task that owns the socket. It
//! identifies after `Hello`, keeps the heartbeat going, forwards decoded
//! dispatches over a channel and reconnects with exponential backoff when the
//! gateway drops the session. Sessions are never resumed: every reconnect
//! starts with a fresh `Identify`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::protocol::Message,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::event::GatewayEvent;
use crate::protocol::{
    Intents, OpCode, decode_dispatch, decode_payload, heartbeat_message, hello_interval,
    identify_message, is_fatal_close_code,
};

/// Discord gateway endpoint, API v10 with JSON encoding.
pub const DEFAULT_GATEWAY_URL: &str = "wss://gateway.discord.gg/?v=10&encoding=json";

const EVENT_CHANNEL_CAPACITY: usize = 100;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Clone, Copy, Debug)]
pub struct ReconnectConfig {
    pub max_reconnect_attempts: u32,
    pub base_reconnect_delay_ms: u64,
    pub max_reconnect_delay_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_reconnect_attempts: 10,
            base_reconnect_delay_ms: 1000,
            max_reconnect_delay_ms: 60000,
        }
    }
}

/// Gateway connection settings.
#[derive(Clone)]
pub struct GatewayConfig {
    /// Websocket URL, including the `v` and `encoding` query parameters.
    pub url: String,
    /// Bot token, sent in `Identify`.
    pub token: String,
    pub intents: Intents,
    pub reconnect: ReconnectConfig,
}

impl GatewayConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            url: DEFAULT_GATEWAY_URL.to_string(),
            token: token.into(),
            intents: Intents::text_commands(),
            reconnect: ReconnectConfig::default(),
        }
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("url", &self.url)
            .field("token", &"<redacted>")
            .field("intents", &self.intents)
            .field("reconnect", &self.reconnect)
            .finish()
    }
}

/// How a single websocket session ended.
#[derive(Debug)]
enum SessionEnd {
    Reconnect,
    Fatal(String),
    Shutdown,
    ReceiverClosed,
}

/// Handle to a running gateway connection.
pub struct GatewayConnection {
    events: mpsc::Receiver<GatewayEvent>,
    shutdown: CancellationToken,
    is_connected: Arc<AtomicBool>,
    reconnect_count: Arc<AtomicU32>,
    task: Option<JoinHandle<()>>,
}

impl GatewayConnection {
    /// Receive the next event.
    ///
    /// Returns `None` once the connection task has stopped, either because it
    /// was shut down, hit a fatal close code or ran out of reconnect attempts.
    pub async fn next_event(&mut self) -> Option<GatewayEvent> {
        self.events.recv().await
    }

    pub fn is_connected(&self) -> bool {
        self.is_connected.load(Ordering::SeqCst)
    }

    pub fn reconnect_count(&self) -> u32 {
        self.reconnect_count.load(Ordering::SeqCst)
    }

    /// Close the socket and wait for the connection task to finish.
    pub async fn shutdown(mut self) {
        self.shutdown.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for GatewayConnection {
    fn drop(&mut self) {
        self.shutdown.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Entry point for gateway connections.
pub struct Gateway;

impl Gateway {
    /// Start a gateway connection in the background.
    ///
    /// Returns immediately; the first event is usually [`GatewayEvent::Ready`].
    pub fn connect(config: GatewayConfig) -> GatewayConnection {
        crate::install_rustls_provider();

        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let shutdown = CancellationToken::new();
        let is_connected = Arc::new(AtomicBool::new(false));
        let reconnect_count = Arc::new(AtomicU32::new(0));

        let task = tokio::spawn(run_gateway(
            config,
            events_tx,
            shutdown.clone(),
            is_connected.clone(),
            reconnect_count.clone(),
        ));

        GatewayConnection {
            events: events_rx,
            shutdown,
            is_connected,
            reconnect_count,
            task: Some(task),
        }
    }
}

async fn run_gateway(
    config: GatewayConfig,
    events_tx: mpsc::Sender<GatewayEvent>,
    shutdown: CancellationToken,
    is_connected: Arc<AtomicBool>,
    reconnect_count: Arc<AtomicU32>,
) {
    let reconnect = config.reconnect;
    let mut attempt = 0;
    let mut delay = reconnect.base_reconnect_delay_ms;

    loop {
        if shutdown.is_cancelled() {
            break;
        }

        info!("Connecting to gateway: {}", config.url);
        let connect_result = tokio::select! {
            result = connect_async(config.url.as_str()) => result,
            _ = shutdown.cancelled() => break,
        };

        match connect_result {
            Ok((mut stream, _)) => {
                info!("Connected to gateway");
                is_connected.store(true, Ordering::SeqCst);
                reconnect_count.store(0, Ordering::SeqCst);
                attempt = 0;
                delay = reconnect.base_reconnect_delay_ms;

                let end = run_session(&mut stream, &config, &events_tx, &shutdown).await;
                is_connected.store(false, Ordering::SeqCst);

                match end {
                    SessionEnd::Shutdown | SessionEnd::ReceiverClosed => break,
                    SessionEnd::Fatal(reason) => {
                        error!("Gateway session cannot continue: {}", reason);
                        break;
                    }
                    SessionEnd::Reconnect => {}
                }
            }
            Err(e) => {
                warn!("Gateway connection failed: {}", e);
            }
        }

        if attempt >= reconnect.max_reconnect_attempts {
            error!("Max reconnect attempts reached for gateway");
            break;
        }
        attempt += 1;
        reconnect_count.store(attempt, Ordering::SeqCst);

        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(delay)) => {},
            _ = shutdown.cancelled() => break,
        }

        delay = (delay * 2).min(reconnect.max_reconnect_delay_ms);
    }

    debug!("Gateway task stopped");
}

/// Wait for the next heartbeat tick, or forever before `Hello` arrived.
async fn next_heartbeat(heartbeat: &mut Option<Interval>) {
    match heartbeat {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

async fn run_session(
    stream: &mut WsStream,
    config: &GatewayConfig,
    events_tx: &mpsc::Sender<GatewayEvent>,
    shutdown: &CancellationToken,
) -> SessionEnd {
    let mut heartbeat: Option<Interval> = None;
    let mut last_sequence: Option<u64> = None;
    let mut ack_pending = false;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                let _ = stream.close(None).await;
                return SessionEnd::Shutdown;
            }

            _ = next_heartbeat(&mut heartbeat) => {
                if ack_pending {
                    warn!("No heartbeat ACK since the previous heartbeat, reconnecting");
                    return SessionEnd::Reconnect;
                }
                if let Err(e) = stream.send(heartbeat_message(last_sequence)).await {
                    error!("Failed to send heartbeat: {}", e);
                    return SessionEnd::Reconnect;
                }
                ack_pending = true;
                trace!(sequence = ?last_sequence, "Sent heartbeat");
            }

            frame = stream.next() => {
                let text = match frame {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(frame))) => {
                        let code = frame.as_ref().map(|f| u16::from(f.code));
                        let reason = frame
                            .as_ref()
                            .map(|f| f.reason.as_str().to_owned())
                            .unwrap_or_default();
                        if let Some(code) = code
                            && is_fatal_close_code(code)
                        {
                            return SessionEnd::Fatal(format!("closed with {code}: {reason}"));
                        }
                        warn!(code = ?code, reason = %reason, "Gateway closed the connection");
                        return SessionEnd::Reconnect;
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        error!("WebSocket error: {}", e);
                        return SessionEnd::Reconnect;
                    }
                    None => {
                        warn!("Gateway stream closed");
                        return SessionEnd::Reconnect;
                    }
                };

                let payload = match decode_payload(text.as_str()) {
                    Ok(payload) => payload,
                    Err(e) => {
                        warn!("Failed to decode gateway payload: {}", e);
                        continue;
                    }
                };

                if let Some(sequence) = payload.s {
                    last_sequence = Some(sequence);
                }

                match payload.opcode() {
                    OpCode::Hello => {
                        let interval_ms = match hello_interval(&payload) {
                            Ok(ms) => ms.max(1),
                            Err(e) => {
                                warn!("{}", e);
                                return SessionEnd::Reconnect;
                            }
                        };
                        let period = Duration::from_millis(interval_ms);
                        let mut timer = tokio::time::interval_at(Instant::now() + period, period);
                        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
                        heartbeat = Some(timer);
                        ack_pending = false;

                        if let Err(e) = stream
                            .send(identify_message(&config.token, config.intents))
                            .await
                        {
                            error!("Identify failed: {}", e);
                            return SessionEnd::Reconnect;
                        }
                        debug!(heartbeat_interval_ms = interval_ms, "Sent identify");
                    }
                    OpCode::HeartbeatAck => {
                        ack_pending = false;
                    }
                    OpCode::Heartbeat => {
                        if let Err(e) = stream.send(heartbeat_message(last_sequence)).await {
                            error!("Failed to answer heartbeat request: {}", e);
                            return SessionEnd::Reconnect;
                        }
                        ack_pending = true;
                    }
                    OpCode::Reconnect => {
                        info!("Gateway requested a reconnect");
                        let _ = stream.close(None).await;
                        return SessionEnd::Reconnect;
                    }
                    OpCode::InvalidSession => {
                        warn!("Gateway invalidated the session");
                        let _ = stream.close(None).await;
                        return SessionEnd::Reconnect;
                    }
                    OpCode::Dispatch => match decode_dispatch(&payload) {
                        Ok(Some(event)) => {
                            if events_tx.send(event).await.is_err() {
                                let _ = stream.close(None).await;
                                return SessionEnd::ReceiverClosed;
                            }
                        }
                        Ok(None) => trace!(event = ?payload.t, "Ignoring dispatch"),
                        Err(e) => warn!(event = ?payload.t, "Failed to decode dispatch: {}", e),
                    },
                    OpCode::Identify | OpCode::Unknown(_) => {
                        debug!(op = payload.op, "Ignoring gateway opcode");
                    }
                }
            }
        }
    }
}
