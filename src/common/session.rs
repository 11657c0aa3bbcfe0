//! Connection seam shared by both networks.
//!
//! Every connection, IRC or messenger, is driven by its own task and
//! exposed to the rest of the bridge through [`ChatClient`]. Inbound
//! traffic is delivered on that task through an [`EventSink`].

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info};

use crate::common::error::{ConnectionError, ConnectionResult};
use crate::common::messages::{InboundMessage, OutboundMessage};

/// Lifecycle of a single connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Stopped,
    Connecting,
    Ready,
    Failed(String),
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => f.write_str("stopped"),
            Self::Connecting => f.write_str("connecting"),
            Self::Ready => f.write_str("ready"),
            Self::Failed(reason) => write!(f, "failed ({})", reason),
        }
    }
}

/// Receiver for events fired by a connection task.
pub trait EventSink: Send + Sync {
    /// A message arrived on the connection.
    fn on_message(&self, msg: InboundMessage);

    /// The connection was lost after it had become ready.
    fn on_disconnect(&self, identity: &str, reason: &str);
}

/// One connection to either network.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Our own identity on the network (IRC nick or account id).
    fn identity(&self) -> &str;

    /// Spawn the connection task. Does not wait for the connection.
    fn start(&self, sink: Arc<dyn EventSink>) -> ConnectionResult<()>;

    /// Wait until the connection is ready, or report why it never will be.
    async fn wait_connected(&self) -> ConnectionResult<()>;

    /// Queue a message for delivery. Never blocks.
    fn send(&self, target: &str, text: &str) -> ConnectionResult<()>;

    /// Ask the connection task to stop. Safe to call repeatedly.
    fn stop(&self) -> ConnectionResult<()>;

    /// Current lifecycle state.
    fn state(&self) -> ConnectionState;
}

/// Handles owned by a running connection task.
pub struct SessionTask {
    pub state_tx: watch::Sender<ConnectionState>,
    pub outgoing_rx: mpsc::UnboundedReceiver<OutboundMessage>,
    pub shutdown_rx: watch::Receiver<bool>,
}

impl SessionTask {
    pub fn mark_ready(&self) {
        self.state_tx.send_replace(ConnectionState::Ready);
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.state_tx.borrow(), ConnectionState::Ready)
    }

    /// Record how the connection task ended.
    ///
    /// Losing a ready connection is reported to the sink; failing before
    /// ready is reported to whoever waits in `wait_connected`.
    pub fn finish(&self, identity: &str, result: ConnectionResult<()>, sink: &dyn EventSink) {
        let was_ready = self.is_ready();
        match result {
            Ok(()) => {
                info!(identity, "Connection closed");
                self.state_tx.send_replace(ConnectionState::Stopped);
            }
            Err(e) if was_ready => {
                self.state_tx.send_replace(ConnectionState::Stopped);
                sink.on_disconnect(identity, &e.to_string());
            }
            Err(e) => {
                error!(identity, "Connection failed: {}", e);
                self.state_tx.send_replace(ConnectionState::Failed(e.to_string()));
            }
        }
    }
}

/// Lifecycle plumbing shared by the concrete clients.
///
/// Holds the outgoing queue, the state watch and the shutdown watch; the
/// receiving halves are handed to the connection task once, on start.
pub struct SessionControl {
    identity: String,
    state_tx: watch::Sender<ConnectionState>,
    outgoing_tx: mpsc::UnboundedSender<OutboundMessage>,
    pending: Mutex<Option<(mpsc::UnboundedReceiver<OutboundMessage>, watch::Receiver<bool>)>>,
    shutdown_tx: watch::Sender<bool>,
}

impl SessionControl {
    pub fn new(identity: impl Into<String>) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Stopped);
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            identity: identity.into(),
            state_tx,
            outgoing_tx,
            pending: Mutex::new(Some((outgoing_rx, shutdown_rx))),
            shutdown_tx,
        }
    }

    /// Take the task-side handles. Fails if the session was started before.
    pub fn begin(&self) -> ConnectionResult<SessionTask> {
        let (outgoing_rx, shutdown_rx) = self.pending.lock().take().ok_or_else(|| {
            ConnectionError::AlreadyStarted {
                identity: self.identity.clone(),
            }
        })?;
        self.state_tx.send_replace(ConnectionState::Connecting);
        Ok(SessionTask {
            state_tx: self.state_tx.clone(),
            outgoing_rx,
            shutdown_rx,
        })
    }

    pub async fn wait_connected(&self) -> ConnectionResult<()> {
        let mut state_rx = self.state_tx.subscribe();
        let state = state_rx
            .wait_for(|state| !matches!(state, ConnectionState::Connecting))
            .await
            .map_err(|_| ConnectionError::NotRunning {
                identity: self.identity.clone(),
            })?
            .clone();

        match state {
            ConnectionState::Ready => Ok(()),
            ConnectionState::Failed(reason) => Err(ConnectionError::Failed {
                identity: self.identity.clone(),
                reason,
            }),
            ConnectionState::Stopped | ConnectionState::Connecting => {
                Err(ConnectionError::NotRunning {
                    identity: self.identity.clone(),
                })
            }
        }
    }

    pub fn send(&self, target: &str, text: &str) -> ConnectionResult<()> {
        if !matches!(self.state(), ConnectionState::Ready) {
            return Err(ConnectionError::NotRunning {
                identity: self.identity.clone(),
            });
        }
        self.outgoing_tx
            .send(OutboundMessage::new(target, text))
            .map_err(|_| ConnectionError::NotRunning {
                identity: self.identity.clone(),
            })
    }

    pub fn stop(&self) {
        if !self.shutdown_tx.send_replace(true) {
            debug!(identity = %self.identity, "Stop requested");
        }
        // A session that never started has no task to report the transition.
        if self.pending.lock().take().is_some() {
            self.state_tx.send_replace(ConnectionState::Stopped);
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state_tx.borrow().clone()
    }
}
