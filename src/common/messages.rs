//! Canonical message types for bridge communication.
//!
//! This module defines the single source of truth for message types
//! flowing between the IRC side and the messenger side.

use std::fmt;
use std::sync::LazyLock;

use fancy_regex::Regex;
use serde::Serialize;
use tracing::warn;

/// Matches the `"<identifier>: <text>"` convention for directed messages.
static DIRECTED_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^([^\s:]+):\s*(.+)$").expect("directed prefix pattern is valid")
});

/// Which network a message was received from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Network A.
    Irc,
    /// Network B.
    Messenger,
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Irc => f.write_str("IRC"),
            Self::Messenger => f.write_str("MSG"),
        }
    }
}

/// A message received from either network, consumed once by the router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InboundMessage {
    /// Channel the message arrived on, or the bridge's own identity for
    /// private messages.
    pub source: String,
    /// Explicit recipient parsed from a directed private message.
    pub target: Option<String>,
    /// Nick (IRC) or account id (messenger) of the author.
    pub sender: String,
    /// Message text, with any directed prefix removed.
    pub body: String,
}

impl InboundMessage {
    pub fn new(
        source: impl Into<String>,
        sender: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: None,
            sender: sender.into(),
            body: body.into(),
        }
    }

    /// Build a private message, splitting off a `"name: text"` prefix
    /// into `target` when present.
    pub fn directed(source: impl Into<String>, sender: impl Into<String>, text: &str) -> Self {
        let (target, body) = match split_directed(text) {
            Some((target, body)) => (Some(target), body),
            None => (None, text.to_string()),
        };
        Self {
            source: source.into(),
            target,
            sender: sender.into(),
            body,
        }
    }
}

impl fmt::Display for InboundMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            Some(target) => write!(
                f,
                "[{}] {} -> {}: {}",
                self.source, self.sender, target, self.body
            ),
            None => write!(f, "[{}] {}: {}", self.source, self.sender, self.body),
        }
    }
}

/// A message ready to hand to a network's send operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub destination: String,
    pub text: String,
}

impl OutboundMessage {
    pub fn new(destination: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            text: text.into(),
        }
    }
}

/// Split `"name: text"` into its target and body.
///
/// Returns `None` when the text does not carry a directed prefix.
pub fn split_directed(text: &str) -> Option<(String, String)> {
    match DIRECTED_PREFIX.captures(text.trim()) {
        Ok(Some(caps)) => {
            let target = caps.get(1)?.as_str().to_string();
            let body = caps.get(2)?.as_str().to_string();
            Some((target, body))
        }
        Ok(None) => None,
        Err(e) => {
            warn!("Directed prefix match error: {}", e);
            None
        }
    }
}

/// Split a multi-line body into the lines to relay, in order.
///
/// The body is trimmed first. A bare CR ends a line just like LF does,
/// and blank lines are skipped.
pub fn relay_lines(body: &str) -> Vec<&str> {
    body.trim()
        .split(['\r', '\n'])
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .collect()
}
