//! IRC client: one connection, driven by its own task.

use std::sync::Arc;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{Framed, LinesCodec};
use tracing::{debug, info, warn};

use crate::common::error::{ConnectionError, ConnectionResult, ProtocolError};
use crate::common::session::{SessionControl, SessionTask};
use crate::common::{ChatClient, ConnectionState, EventSink, InboundMessage};
use crate::protocol::irc::{self, IrcLine};
use crate::protocol::{connect, MAX_LINE_LENGTH};

/// Real name sent on registration.
const REALNAME: &str = "palaver bridge";

/// Connection settings for the IRC side.
#[derive(Debug, Clone)]
pub struct IrcSettings {
    pub server: String,
    pub port: u16,
    pub nick: String,
    /// Channels joined once registration completes.
    pub channels: Vec<String>,
}

pub struct IrcClient {
    settings: IrcSettings,
    control: SessionControl,
}

impl IrcClient {
    pub fn new(settings: IrcSettings) -> Self {
        let control = SessionControl::new(settings.nick.clone());
        Self { settings, control }
    }
}

#[async_trait]
impl ChatClient for IrcClient {
    fn identity(&self) -> &str {
        &self.settings.nick
    }

    fn start(&self, sink: Arc<dyn EventSink>) -> ConnectionResult<()> {
        let mut task = self.control.begin()?;
        let settings = self.settings.clone();
        tokio::spawn(async move {
            let address = format!("{}:{}", settings.server, settings.port);
            let result = match connect(&address).await {
                Ok(stream) => run_session(stream, &settings, &mut task, sink.as_ref()).await,
                Err(e) => Err(e),
            };
            task.finish(&settings.nick, result, sink.as_ref());
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

/// Drive one registered IRC session until shutdown or connection loss.
pub async fn run_session<S>(
    stream: S,
    settings: &IrcSettings,
    task: &mut SessionTask,
    sink: &dyn EventSink,
) -> ConnectionResult<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut connection = Framed::new(stream, LinesCodec::new_with_max_length(MAX_LINE_LENGTH));

    send_line(&mut connection, irc::nick(&settings.nick)).await?;
    send_line(&mut connection, irc::user(&settings.nick, REALNAME)).await?;

    loop {
        tokio::select! {
            line = connection.next() => {
                match line {
                    Some(Ok(line)) => {
                        handle_line(&mut connection, settings, task, sink, &line).await?;
                    }
                    Some(Err(e)) => return Err(ProtocolError::from(e).into()),
                    None => return Err(ConnectionError::ConnectionClosed),
                }
            }

            Some(outgoing) = task.outgoing_rx.recv() => {
                for line in irc::privmsg(&outgoing.destination, &outgoing.text) {
                    debug!(">>> {}", line);
                    send_line(&mut connection, line).await?;
                }
            }

            changed = task.shutdown_rx.changed() => {
                if changed.is_err() || *task.shutdown_rx.borrow() {
                    info!("IRC client stopping");
                    // Best effort: the server may already be gone.
                    if let Err(e) = send_line(&mut connection, irc::quit("Bridge stopping")).await {
                        debug!("QUIT not delivered: {}", e);
                    }
                    return Ok(());
                }
            }
        }
    }
}

async fn handle_line<S>(
    connection: &mut Framed<S, LinesCodec>,
    settings: &IrcSettings,
    task: &SessionTask,
    sink: &dyn EventSink,
    raw: &str,
) -> ConnectionResult<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let line = match IrcLine::parse(raw) {
        Ok(line) => line,
        Err(e) => {
            warn!("Ignoring unparsable IRC line: {}", e);
            return Ok(());
        }
    };

    match line.command.as_str() {
        "PING" => {
            send_line(connection, irc::pong(line.param(0).unwrap_or_default())).await?;
        }
        "001" => {
            for channel in &settings.channels {
                info!("Joining {}", channel);
                send_line(connection, irc::join(channel)).await?;
            }
            info!("IRC client registered as {}", settings.nick);
            task.mark_ready();
        }
        "433" => {
            return Err(ConnectionError::Failed {
                identity: settings.nick.clone(),
                reason: "nickname is already in use".to_string(),
            });
        }
        "ERROR" => {
            return Err(ConnectionError::Failed {
                identity: settings.nick.clone(),
                reason: line.param(0).unwrap_or("server closed the link").to_string(),
            });
        }
        "PRIVMSG" => {
            if let Some(msg) = inbound_privmsg(&line, &settings.nick) {
                sink.on_message(msg);
            }
        }
        _ => debug!("<<< {}", raw),
    }
    Ok(())
}

/// Turn a PRIVMSG into an inbound message.
///
/// Messages addressed to our own nick are private and may carry a
/// directed target; everything else belongs to the channel it names.
fn inbound_privmsg(line: &IrcLine, own_nick: &str) -> Option<InboundMessage> {
    let sender = line.nick()?;
    let target = line.param(0)?;
    let text = line.param(1)?;

    if target.eq_ignore_ascii_case(own_nick) {
        Some(InboundMessage::directed(own_nick, sender, text))
    } else {
        Some(InboundMessage::new(target, sender, text))
    }
}

async fn send_line<S>(connection: &mut Framed<S, LinesCodec>, line: String) -> ConnectionResult<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    connection
        .send(line)
        .await
        .map_err(|e| ConnectionError::Protocol(e.into()))
}
