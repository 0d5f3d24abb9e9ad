//! Gateway wire protocol (v10, JSON encoding).
//!
//! Only the opcodes a non-resuming bot needs are modelled; everything else
//! is decoded as [`OpCode::Unknown`] and ignored.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio_tungstenite::tungstenite::protocol::Message;

use crate::error::{GatewayError, Result};
use crate::event::{ChatMessage, GatewayEvent, ReadyEvent};

/// Gateway intents bitfield.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Intents(pub u64);

impl Intents {
    pub const GUILDS: Intents = Intents(1 << 0);
    pub const GUILD_MESSAGES: Intents = Intents(1 << 9);
    pub const DIRECT_MESSAGES: Intents = Intents(1 << 12);
    pub const MESSAGE_CONTENT: Intents = Intents(1 << 15);

    /// Intents a prefix-command bot needs to see message text.
    pub fn text_commands() -> Self {
        Self::GUILDS | Self::GUILD_MESSAGES | Self::DIRECT_MESSAGES | Self::MESSAGE_CONTENT
    }

    pub fn bits(self) -> u64 {
        self.0
    }

    pub fn contains(self, other: Intents) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for Intents {
    type Output = Intents;

    fn bitor(self, rhs: Intents) -> Intents {
        Intents(self.0 | rhs.0)
    }
}

/// Gateway opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    Dispatch,
    Heartbeat,
    Identify,
    Reconnect,
    InvalidSession,
    Hello,
    HeartbeatAck,
    Unknown(u8),
}

impl From<u8> for OpCode {
    fn from(op: u8) -> Self {
        match op {
            0 => Self::Dispatch,
            1 => Self::Heartbeat,
            2 => Self::Identify,
            7 => Self::Reconnect,
            9 => Self::InvalidSession,
            10 => Self::Hello,
            11 => Self::HeartbeatAck,
            other => Self::Unknown(other),
        }
    }
}

impl From<OpCode> for u8 {
    fn from(op: OpCode) -> Self {
        match op {
            OpCode::Dispatch => 0,
            OpCode::Heartbeat => 1,
            OpCode::Identify => 2,
            OpCode::Reconnect => 7,
            OpCode::InvalidSession => 9,
            OpCode::Hello => 10,
            OpCode::HeartbeatAck => 11,
            OpCode::Unknown(other) => other,
        }
    }
}

/// A raw gateway frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayPayload {
    pub op: u8,
    #[serde(default)]
    pub d: Value,
    #[serde(default)]
    pub s: Option<u64>,
    #[serde(default)]
    pub t: Option<String>,
}

impl GatewayPayload {
    pub fn opcode(&self) -> OpCode {
        OpCode::from(self.op)
    }
}

#[derive(Debug, Deserialize)]
struct HelloData {
    heartbeat_interval: u64,
}

/// Close codes after which reconnecting with the same settings cannot succeed.
pub fn is_fatal_close_code(code: u16) -> bool {
    matches!(code, 4004 | 4010 | 4011 | 4012 | 4013 | 4014)
}

/// Parse a text frame.
pub fn decode_payload(text: &str) -> Result<GatewayPayload> {
    Ok(serde_json::from_str(text)?)
}

/// Extract the heartbeat interval (milliseconds) from a `Hello` payload.
pub fn hello_interval(payload: &GatewayPayload) -> Result<u64> {
    let hello: HelloData = serde_json::from_value(payload.d.clone())
        .map_err(|e| GatewayError::protocol(format!("invalid Hello payload: {e}")))?;
    Ok(hello.heartbeat_interval)
}

/// Decode a dispatch payload into an application event.
///
/// Dispatch types the bot does not consume yield `Ok(None)`.
pub fn decode_dispatch(payload: &GatewayPayload) -> Result<Option<GatewayEvent>> {
    let event = match payload.t.as_deref() {
        Some("READY") => {
            let ready: ReadyEvent = serde_json::from_value(payload.d.clone())?;
            GatewayEvent::Ready(ready)
        }
        Some("MESSAGE_CREATE") => {
            let message: ChatMessage = serde_json::from_value(payload.d.clone())?;
            GatewayEvent::MessageCreate(message)
        }
        _ => return Ok(None),
    };
    Ok(Some(event))
}

pub fn identify_message(token: &str, intents: Intents) -> Message {
    let payload = json!({
        "op": u8::from(OpCode::Identify),
        "d": {
            "token": token,
            "intents": intents.bits(),
            "properties": {
                "os": std::env::consts::OS,
                "browser": "solvedbot",
                "device": "solvedbot",
            }
        }
    });
    Message::text(payload.to_string())
}

pub fn heartbeat_message(last_sequence: Option<u64>) -> Message {
    let payload = json!({
        "op": u8::from(OpCode::Heartbeat),
        "d": last_sequence,
    });
    Message::text(payload.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(message: Message) -> Value {
        match message {
            Message::Text(text) => serde_json::from_str(text.as_str()).unwrap(),
            other => panic!("expected text frame, got {other:?}"),
        }
    }

    #[test]
    fn test_text_command_intents() {
        let intents = Intents::text_commands();
        assert!(intents.contains(Intents::MESSAGE_CONTENT));
        assert!(intents.contains(Intents::GUILD_MESSAGES));
        assert_eq!(intents.bits(), 1 | (1 << 9) | (1 << 12) | (1 << 15));
    }

    #[test]
    fn test_opcode_round_trip_for_known_codes() {
        for op in [0u8, 1, 2, 7, 9, 10, 11] {
            assert_eq!(u8::from(OpCode::from(op)), op);
        }
        assert_eq!(OpCode::from(3), OpCode::Unknown(3));
    }

    #[test]
    fn test_hello_interval() {
        let payload = decode_payload(r#"{"op":10,"d":{"heartbeat_interval":41250}}"#).unwrap();
        assert_eq!(payload.opcode(), OpCode::Hello);
        assert_eq!(hello_interval(&payload).unwrap(), 41250);

        let payload = decode_payload(r#"{"op":10,"d":{}}"#).unwrap();
        assert!(matches!(
            hello_interval(&payload),
            Err(GatewayError::Protocol(_))
        ));
    }

    #[test]
    fn test_decode_message_create() {
        let payload = decode_payload(
            r#"{"op":0,"s":3,"t":"MESSAGE_CREATE","d":{
                "id":"1","channel_id":"42","guild_id":"7",
                "author":{"id":"99","username":"alice"},
                "content":"!n abc","tts":false}}"#,
        )
        .unwrap();
        assert_eq!(payload.s, Some(3));

        let Some(GatewayEvent::MessageCreate(message)) = decode_dispatch(&payload).unwrap() else {
            panic!("expected MessageCreate");
        };
        assert_eq!(message.channel_id, "42");
        assert_eq!(message.author.id, "99");
        assert!(!message.author.bot);
        assert_eq!(message.content, "!n abc");
    }

    #[test]
    fn test_decode_ready() {
        let payload = decode_payload(
            r#"{"op":0,"s":1,"t":"READY","d":{"v":10,"session_id":"s1",
                "user":{"id":"5","username":"solvedbot","bot":true}}}"#,
        )
        .unwrap();
        let Some(GatewayEvent::Ready(ready)) = decode_dispatch(&payload).unwrap() else {
            panic!("expected Ready");
        };
        assert_eq!(ready.user.id, "5");
        assert!(ready.user.bot);
        assert_eq!(ready.session_id, "s1");
    }

    #[test]
    fn test_unconsumed_dispatch_is_skipped() {
        let payload = decode_payload(r#"{"op":0,"s":2,"t":"TYPING_START","d":{}}"#).unwrap();
        assert!(decode_dispatch(&payload).unwrap().is_none());
    }

    #[test]
    fn test_identify_message() {
        let value = text_of(identify_message("secret", Intents::text_commands()));
        assert_eq!(value["op"], 2);
        assert_eq!(value["d"]["token"], "secret");
        assert_eq!(value["d"]["intents"], Intents::text_commands().bits());
    }

    #[test]
    fn test_heartbeat_message() {
        assert_eq!(text_of(heartbeat_message(None))["d"], Value::Null);
        assert_eq!(text_of(heartbeat_message(Some(12)))["d"], 12);
    }

    #[test]
    fn test_fatal_close_codes() {
        assert!(is_fatal_close_code(4004));
        assert!(is_fatal_close_code(4014));
        assert!(!is_fatal_close_code(1000));
        assert!(!is_fatal_close_code(4000));
    }
}
