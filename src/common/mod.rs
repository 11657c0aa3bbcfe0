//! Common utilities and types shared across the application.

pub mod error;
pub mod messages;
pub mod session;
pub mod store;

#[cfg(test)]
pub mod testing;

pub use messages::{InboundMessage, Network};
pub use session::{ChatClient, ConnectionState, EventSink};
pub use store::MessageLog;
