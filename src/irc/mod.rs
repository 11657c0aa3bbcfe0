//! Network A: the IRC side of the bridge.

pub mod client;

pub use client::{IrcClient, IrcSettings};
