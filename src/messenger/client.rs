//! One messenger account session over the gateway.

use std::sync::Arc;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{Framed, LinesCodec};
use tracing::{debug, info, warn};

use crate::common::error::{ConnectionError, ConnectionResult, ProtocolError};
use crate::common::session::{SessionControl, SessionTask};
use crate::common::{ChatClient, ConnectionState, EventSink, InboundMessage};
use crate::config::AccountConfig;
use crate::protocol::gateway::{ClientFrame, GatewayFrame};
use crate::protocol::{connect, MAX_LINE_LENGTH};

pub struct MessengerSession {
    gateway: String,
    account: AccountConfig,
    control: SessionControl,
}

impl MessengerSession {
    pub fn new(gateway: impl Into<String>, account: AccountConfig) -> Self {
        let control = SessionControl::new(account.identifier.clone());
        Self {
            gateway: gateway.into(),
            account,
            control,
        }
    }
}

#[async_trait]
impl ChatClient for MessengerSession {
    fn identity(&self) -> &str {
        &self.account.identifier
    }

    fn start(&self, sink: Arc<dyn EventSink>) -> ConnectionResult<()> {
        let mut task = self.control.begin()?;
        let gateway = self.gateway.clone();
        let account = self.account.clone();
        tokio::spawn(async move {
            let result = match connect(&gateway).await {
                Ok(stream) => run_session(stream, &account, &mut task, sink.as_ref()).await,
                Err(e) => Err(e),
            };
            task.finish(&account.identifier, result, sink.as_ref());
        });
        Ok(())
    }

    async fn wait_connected(&self) -> ConnectionResult<()> {
        self.control.wait_connected().await
    }

    fn send(&self, target: &str, text: &str) -> ConnectionResult<()> {
        self.control.send(target, text)
    }

    fn stop(&self) -> ConnectionResult<()> {
        self.control.stop();
        Ok(())
    }

    fn state(&self) -> ConnectionState {
        self.control.state()
    }
}

/// Log in and relay frames until shutdown or connection loss.
pub async fn run_session<S>(
    stream: S,
    account: &AccountConfig,
    task: &mut SessionTask,
    sink: &dyn EventSink,
) -> ConnectionResult<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut connection = Framed::new(stream, LinesCodec::new_with_max_length(MAX_LINE_LENGTH));
    let identity = account.identifier.as_str();

    send_frame(
        &mut connection,
        &ClientFrame::Login {
            account: identity,
            credential: &account.credential,
        },
    )
    .await?;

    loop {
        tokio::select! {
            line = connection.next() => {
                let line = match line {
                    Some(Ok(line)) => line,
                    Some(Err(e)) => return Err(ProtocolError::from(e).into()),
                    None => return Err(ConnectionError::ConnectionClosed),
                };
                let frame = match GatewayFrame::decode(&line) {
                    Ok(frame) => frame,
                    Err(e) => {
                        warn!(identity, "Ignoring gateway frame: {}", e);
                        continue;
                    }
                };
                match frame {
                    GatewayFrame::Ready => {
                        info!(identity, "Messenger account logged in");
                        task.mark_ready();
                    }
                    GatewayFrame::AuthFailed { reason } => {
                        return Err(ConnectionError::AuthFailed {
                            identity: identity.to_string(),
                            reason,
                        });
                    }
                    GatewayFrame::Message { group: Some(group), from, text } => {
                        sink.on_message(InboundMessage::new(group, from, text));
                    }
                    GatewayFrame::Message { group: None, from, text } => {
                        sink.on_message(InboundMessage::directed(identity, from, &text));
                    }
                    GatewayFrame::Ping => send_frame(&mut connection, &ClientFrame::Pong).await?,
                    GatewayFrame::Error { message } => {
                        warn!(identity, "Gateway error: {}", message);
                    }
                }
            }

            Some(outgoing) = task.outgoing_rx.recv() => {
                debug!(identity, to = %outgoing.destination, "Sending");
                send_frame(
                    &mut connection,
                    &ClientFrame::Send {
                        to: &outgoing.destination,
                        text: &outgoing.text,
                    },
                )
                .await?;
            }

            changed = task.shutdown_rx.changed() => {
                if changed.is_err() || *task.shutdown_rx.borrow() {
                    info!(identity, "Messenger account logging out");
                    if let Err(e) = send_frame(&mut connection, &ClientFrame::Logout).await {
                        debug!(identity, "Logout not delivered: {}", e);
                    }
                    return Ok(());
                }
            }
        }
    }
}

async fn send_frame<S>(
    connection: &mut Framed<S, LinesCodec>,
    frame: &ClientFrame<'_>,
) -> ConnectionResult<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let line = frame.encode()?;
    connection
        .send(line)
        .await
        .map_err(|e| ConnectionError::Protocol(e.into()))
}
