//! Message routing between IRC and the messenger network.
//!
//! Each inbound message is handled on its own: it is logged, its
//! recipient is resolved through the contact directory, the text is
//! reformatted, and the result is handed to the other network.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::bridge::ContactDirectory;
use crate::common::error::{RouteError, RouteResult};
use crate::common::messages::relay_lines;
use crate::common::{ChatClient, InboundMessage, MessageLog, Network};
use crate::messenger::WorkerPool;

/// Reply sent to IRC users who message the bridge without a target.
pub const MISSING_TARGET_HELP: &str = "Target not specified. Please prefix your private messages \
with a nickname (e.g. 'person1: hello') or phone number (e.g. '34555555373: hello')";

/// Line prefixes that mark a bot command; such lines are relayed verbatim.
const COMMAND_PREFIXES: [char; 2] = ['!', '.'];

/// Static routing settings.
#[derive(Debug, Clone)]
pub struct RouterSettings {
    /// The bridge's own IRC nick.
    pub irc_nick: String,
    /// IRC nick that receives private messenger traffic.
    pub owner_nick: String,
    /// Suffix appended to resolved private messenger targets.
    pub domain_suffix: String,
}

pub struct MessageRouter {
    directory: Arc<ContactDirectory>,
    irc: Arc<dyn ChatClient>,
    pool: Arc<WorkerPool>,
    log: MessageLog,
    settings: RouterSettings,
}

impl MessageRouter {
    pub fn new(
        directory: Arc<ContactDirectory>,
        irc: Arc<dyn ChatClient>,
        pool: Arc<WorkerPool>,
        log: MessageLog,
        settings: RouterSettings,
    ) -> Self {
        Self {
            directory,
            irc,
            pool,
            log,
            settings,
        }
    }

    /// Relay a message received on IRC to the messenger network.
    pub fn on_inbound_from_irc(&self, msg: &InboundMessage) -> RouteResult<()> {
        self.log.store(Network::Irc, msg);
        info!(" <<< {} {}", Network::Irc, msg);

        let text = format!("<{}> {}", msg.sender, msg.body);

        if msg.source == self.settings.irc_nick {
            let Some(target) = msg.target.as_deref() else {
                if let Err(e) = self.irc.send(&msg.sender, MISSING_TARGET_HELP) {
                    warn!("Couldn't tell {} about the missing target: {}", msg.sender, e);
                }
                return Err(RouteError::MissingTarget);
            };

            let id = self.resolve_private_target(target)?;
            let destination = format!("{}{}", id, self.settings.domain_suffix);
            debug!(destination, "IRC private -> messenger");
            self.pool.send(&destination, &text)?;
            return Ok(());
        }

        let group = match self.directory.lookup_id_by_name(&msg.source) {
            Ok(group) => group,
            Err(e) => {
                error!("Cannot send message to channel {}: {}", msg.source, e);
                return Ok(());
            }
        };
        self.pool.send(group, &text)?;
        Ok(())
    }

    /// Relay a message received by the primary messenger account to IRC.
    pub fn on_inbound_from_messenger(&self, msg: &InboundMessage) -> RouteResult<()> {
        self.log.store(Network::Messenger, msg);
        info!(" <<< {} {}", Network::Messenger, msg);

        let lines = relay_lines(&msg.body);
        let sender = bare_id(&msg.sender);

        if msg.source == self.pool.primary_identity() {
            return self.relay_private(msg, sender, &lines);
        }

        for line in lines {
            let text = if is_command(line) {
                line.to_string()
            } else {
                let name = self.directory.lookup_name_by_id(sender).unwrap_or_else(|_| {
                    warn!("Contact {} not recognized", sender);
                    sender
                });
                format!("[{}] {}", name, line)
            };

            match self.directory.lookup_name_by_id(&msg.source) {
                Ok(channel) => self.relay_line(channel, &text),
                Err(_) => warn!("{}", RouteError::channel(&msg.source)),
            }
        }
        Ok(())
    }

    /// Private messenger message: to the operator, or to an explicit IRC nick.
    fn relay_private(&self, msg: &InboundMessage, sender: &str, lines: &[&str]) -> RouteResult<()> {
        let name = self.directory.lookup_name_by_id(sender)?;
        let destination = msg
            .target
            .as_deref()
            .unwrap_or(self.settings.owner_nick.as_str());

        for line in lines {
            self.relay_line(destination, &format!("[{}] {}", name, line));
        }
        Ok(())
    }

    /// Hand one line to IRC. A failed line is logged and the rest still go out.
    fn relay_line(&self, destination: &str, text: &str) {
        if let Err(e) = self.irc.send(destination, text) {
            warn!("Couldn't relay line to {}: {}", destination, e);
        }
    }

    /// Resolve the target of a private IRC message to a messenger id.
    ///
    /// Known ids pass through, names are looked up, and unknown purely
    /// numeric targets are tried as phone numbers.
    fn resolve_private_target<'a>(&'a self, target: &'a str) -> RouteResult<&'a str> {
        if self.directory.contains_id(target) {
            return Ok(target);
        }
        if let Ok(id) = self.directory.lookup_id_by_name(target) {
            return Ok(id);
        }
        if target.chars().all(|c| c.is_ascii_digit()) {
            warn!("Phone number '{}' not found in contact list. Trying to send anyway...", target);
            return Ok(target);
        }
        Err(RouteError::UnknownTarget {
            target: target.to_string(),
        })
    }
}

fn is_command(line: &str) -> bool {
    line.starts_with(COMMAND_PREFIXES)
}

/// Strip a `@domain` suffix from a messenger id.
fn bare_id(id: &str) -> &str {
    id.split('@').next().unwrap_or(id)
}
