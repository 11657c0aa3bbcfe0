//! Event sinks handed to the network clients.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::bridge::recovery::RecoveringHandler;
use crate::common::{EventSink, InboundMessage};

/// Shared run flag. Clearing it asks the orchestrator to shut down.
pub type RunFlag = tokio::sync::watch::Sender<bool>;

/// Relays messages into a recovering handler; a lost connection stops the bridge.
pub struct RelayEvents {
    handler: RecoveringHandler,
    run: Arc<RunFlag>,
}

impl RelayEvents {
    pub fn new(handler: RecoveringHandler, run: Arc<RunFlag>) -> Self {
        Self { handler, run }
    }
}

impl EventSink for RelayEvents {
    fn on_message(&self, msg: InboundMessage) {
        (self.handler)(msg);
    }

    fn on_disconnect(&self, identity: &str, reason: &str) {
        request_stop(&self.run, identity, reason);
    }
}

/// Sink for secondary messenger workers: inbound traffic is ignored, but a
/// lost worker still stops the bridge.
pub struct IgnoredEvents {
    run: Arc<RunFlag>,
}

impl IgnoredEvents {
    pub fn new(run: Arc<RunFlag>) -> Self {
        Self { run }
    }
}

impl EventSink for IgnoredEvents {
    fn on_message(&self, msg: InboundMessage) {
        debug!("Ignoring message on secondary worker: {}", msg);
    }

    fn on_disconnect(&self, identity: &str, reason: &str) {
        request_stop(&self.run, identity, reason);
    }
}

fn request_stop(run: &RunFlag, identity: &str, reason: &str) {
    warn!(identity, "Connection lost: {}", reason);
    run.send_replace(false);
}
