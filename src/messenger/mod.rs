//! Network B: messenger accounts behind the gateway.

pub mod client;
pub mod pool;
pub mod rotation;

pub use client::MessengerSession;
pub use pool::WorkerPool;
