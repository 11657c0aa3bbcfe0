//! Error types for the application.

use thiserror::Error;

/// Top-level application error.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {message}")]
    ParseError { message: String },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },

    #[error("Failed to write config backup '{path}': {source}")]
    BackupFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Wire-level errors from either network's framing.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Invalid line: {message}")]
    InvalidLine { message: String },

    #[error("Invalid frame: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Line codec error: {0}")]
    Codec(#[from] tokio_util::codec::LinesCodecError),
}

/// Connection-related errors. Any of these during startup is fatal to the bridge.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Failed to connect to {address}: {source}")]
    ConnectFailed {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Connection closed by remote")]
    ConnectionClosed,

    #[error("Timed out waiting for {identity} to become ready")]
    Timeout { identity: String },

    #[error("Authentication failed for {identity}: {reason}")]
    AuthFailed { identity: String, reason: String },

    #[error("Connection {identity} is not running")]
    NotRunning { identity: String },

    #[error("Connection {identity} was already started")]
    AlreadyStarted { identity: String },

    #[error("Connection {identity} failed: {reason}")]
    Failed { identity: String, reason: String },

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while routing a single inbound message.
///
/// None of these are fatal: the recovery wrapper logs them and the
/// message is dropped.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("{kind} '{key}' not found in contact list")]
    NotFound { kind: &'static str, key: String },

    #[error("Target not specified")]
    MissingTarget,

    #[error("Identifier '{target}' is neither a known contact nor a phone number")]
    UnknownTarget { target: String },

    #[error("Send failed: {0}")]
    Send(#[from] ConnectionError),
}

impl RouteError {
    pub fn contact(key: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "Contact",
            key: key.into(),
        }
    }

    pub fn channel(key: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "Channel",
            key: key.into(),
        }
    }
}

/// Result type alias for connection operations.
pub type ConnectionResult<T> = std::result::Result<T, ConnectionError>;

/// Result type alias for routing operations.
pub type RouteResult<T> = std::result::Result<T, RouteError>;
