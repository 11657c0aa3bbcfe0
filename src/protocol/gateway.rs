//! Messenger gateway frames.
//!
//! Each account session talks to the gateway over TCP, one JSON object
//! per line, tagged by `type`. Identifiers are passed through verbatim.

use serde::{Deserialize, Serialize};

use crate::common::error::ProtocolError;

/// Frames sent by the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame<'a> {
    Login { account: &'a str, credential: &'a str },
    Send { to: &'a str, text: &'a str },
    Pong,
    Logout,
}

impl ClientFrame<'_> {
    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Frames sent by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GatewayFrame {
    /// Login accepted; the account can send and receive.
    Ready,
    AuthFailed { reason: String },
    /// An incoming message. `group` is set for group chats and absent for
    /// direct messages to this account.
    Message {
        #[serde(default)]
        group: Option<String>,
        from: String,
        text: String,
    },
    Ping,
    Error { message: String },
}

impl GatewayFrame {
    pub fn decode(line: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(line)?)
    }
}
