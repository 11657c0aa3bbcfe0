//! Wire framing for both networks.

pub mod gateway;
pub mod irc;

use tokio::net::TcpStream;
use tracing::info;

use crate::common::error::{ConnectionError, ConnectionResult};

/// Longest line accepted from either peer.
pub const MAX_LINE_LENGTH: usize = 8 * 1024;

/// Open a TCP connection to `address` (`host:port`).
pub async fn connect(address: &str) -> ConnectionResult<TcpStream> {
    info!("Connecting to {}", address);
    TcpStream::connect(address)
        .await
        .map_err(|e| ConnectionError::ConnectFailed {
            address: address.to_string(),
            source: e,
        })
}
