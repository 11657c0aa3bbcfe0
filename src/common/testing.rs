//! Test doubles for the connection seam.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::common::error::{ConnectionError, ConnectionResult};
use crate::common::messages::{InboundMessage, OutboundMessage};
use crate::common::session::{ChatClient, ConnectionState, EventSink};

/// A `ChatClient` that records everything it is asked to do.
pub struct RecordingClient {
    identity: String,
    fail_connect: bool,
    fail_stop: bool,
    fail_send: bool,
    state: Mutex<ConnectionState>,
    pub sent: Mutex<Vec<OutboundMessage>>,
    pub sink: Mutex<Option<Arc<dyn EventSink>>>,
    pub stop_calls: Mutex<usize>,
}

impl RecordingClient {
    pub fn new(identity: &str) -> Arc<Self> {
        Arc::new(Self::build(identity, false, false, false))
    }

    /// A client whose `wait_connected` always fails.
    pub fn failing(identity: &str) -> Arc<Self> {
        Arc::new(Self::build(identity, true, false, false))
    }

    /// A client whose `stop` always fails.
    pub fn failing_stop(identity: &str) -> Arc<Self> {
        Arc::new(Self::build(identity, false, true, false))
    }

    /// A client that records every send attempt and then rejects it.
    pub fn failing_send(identity: &str) -> Arc<Self> {
        Arc::new(Self::build(identity, false, false, true))
    }

    fn build(identity: &str, fail_connect: bool, fail_stop: bool, fail_send: bool) -> Self {
        Self {
            identity: identity.to_string(),
            fail_connect,
            fail_stop,
            fail_send,
            state: Mutex::new(ConnectionState::Stopped),
            sent: Mutex::new(Vec::new()),
            sink: Mutex::new(None),
            stop_calls: Mutex::new(0),
        }
    }

    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().clone()
    }

    pub fn stop_calls(&self) -> usize {
        *self.stop_calls.lock()
    }

    /// Deliver a message through the sink registered on start.
    pub fn deliver(&self, msg: InboundMessage) {
        let sink = self.sink.lock().clone();
        if let Some(sink) = sink {
            sink.on_message(msg);
        }
    }

    /// Report a lost connection through the sink registered on start.
    pub fn disconnect(&self, reason: &str) {
        let sink = self.sink.lock().clone();
        if let Some(sink) = sink {
            sink.on_disconnect(&self.identity, reason);
        }
    }
}

#[async_trait]
impl ChatClient for RecordingClient {
    fn identity(&self) -> &str {
        &self.identity
    }

    fn start(&self, sink: Arc<dyn EventSink>) -> ConnectionResult<()> {
        *self.sink.lock() = Some(sink);
        *self.state.lock() = if self.fail_connect {
            ConnectionState::Failed("refused".to_string())
        } else {
            ConnectionState::Ready
        };
        Ok(())
    }

    async fn wait_connected(&self) -> ConnectionResult<()> {
        match self.state() {
            ConnectionState::Ready => Ok(()),
            ConnectionState::Failed(reason) => Err(ConnectionError::Failed {
                identity: self.identity.clone(),
                reason,
            }),
            _ => Err(ConnectionError::NotRunning {
                identity: self.identity.clone(),
            }),
        }
    }

    fn send(&self, target: &str, text: &str) -> ConnectionResult<()> {
        self.sent.lock().push(OutboundMessage::new(target, text));
        if self.fail_send {
            return Err(ConnectionError::NotRunning {
                identity: self.identity.clone(),
            });
        }
        Ok(())
    }

    fn stop(&self) -> ConnectionResult<()> {
        *self.stop_calls.lock() += 1;
        *self.state.lock() = ConnectionState::Stopped;
        if self.fail_stop {
            return Err(ConnectionError::ConnectionClosed);
        }
        Ok(())
    }

    fn state(&self) -> ConnectionState {
        self.state.lock().clone()
    }
}

/// An `EventSink` that keeps what it receives.
#[derive(Default)]
pub struct CollectingSink {
    pub messages: Mutex<Vec<InboundMessage>>,
    pub disconnects: Mutex<Vec<String>>,
}

impl EventSink for CollectingSink {
    fn on_message(&self, msg: InboundMessage) {
        self.messages.lock().push(msg);
    }

    fn on_disconnect(&self, identity: &str, _reason: &str) {
        self.disconnects.lock().push(identity.to_string());
    }
}
