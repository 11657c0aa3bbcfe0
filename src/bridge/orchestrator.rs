//! Bridge orchestrator.
//!
//! Owns both sides of the bridge, brings them up in order and tears
//! everything down when either side is lost or the user asks to stop.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::bridge::events::{IgnoredEvents, RelayEvents, RunFlag};
use crate::bridge::recovery::with_recovery;
use crate::bridge::{ContactDirectory, MessageRouter, RouterSettings};
use crate::common::error::{AppError, ConnectionError, ConnectionResult};
use crate::common::{ChatClient, MessageLog};
use crate::config::Config;
use crate::irc::{IrcClient, IrcSettings};
use crate::messenger::rotation::SystemClock;
use crate::messenger::{MessengerSession, WorkerPool};

/// How often `run` checks the run flag.
const POLL_INTERVAL: Duration = Duration::from_millis(500);

pub struct Bridge {
    irc: Arc<dyn ChatClient>,
    pool: Arc<WorkerPool>,
    router: Arc<MessageRouter>,
    run: Arc<RunFlag>,
    stopped: AtomicBool,
    connect_timeout: Duration,
}

impl Bridge {
    pub fn new(
        irc: Arc<dyn ChatClient>,
        pool: Arc<WorkerPool>,
        router: Arc<MessageRouter>,
        connect_timeout: Duration,
    ) -> Self {
        let (run, _) = watch::channel(false);
        Self {
            irc,
            pool,
            router,
            run: Arc::new(run),
            stopped: AtomicBool::new(false),
            connect_timeout,
        }
    }

    /// Wire up the directory, both networks and the router from configuration.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let directory = Arc::new(ContactDirectory::new(&config.contacts));
        if directory.is_empty() {
            warn!("No contacts configured; only numeric private targets can be reached");
        } else {
            info!(
                "Contact directory: {} entries, {} channels",
                directory.len(),
                directory.channel_ids().len()
            );
        }

        let irc: Arc<dyn ChatClient> = Arc::new(IrcClient::new(IrcSettings {
            server: config.irc.server.clone(),
            port: config.irc.port,
            nick: config.irc.nick.clone(),
            channels: directory.channels_to_join().into_iter().map(str::to_string).collect(),
        }));

        let workers = config
            .messenger
            .accounts
            .iter()
            .map(|account| {
                let session = MessengerSession::new(&config.messenger.gateway, account.clone());
                Arc::new(session) as Arc<dyn ChatClient>
            })
            .collect();
        let pool = Arc::new(WorkerPool::new(workers, Arc::new(SystemClock))?);

        let router = Arc::new(MessageRouter::new(
            directory,
            Arc::clone(&irc),
            Arc::clone(&pool),
            MessageLog::new(&config.log_file),
            RouterSettings {
                irc_nick: config.irc.nick.clone(),
                owner_nick: config.irc.owner_nick.clone(),
                domain_suffix: config.messenger.domain_suffix.clone(),
            },
        ));

        Ok(Self::new(
            irc,
            pool,
            router,
            Duration::from_secs(config.connect_timeout_secs),
        ))
    }

    /// Bring up IRC, then every messenger worker. On any failure the
    /// whole bridge is stopped.
    pub async fn start(&self) -> ConnectionResult<()> {
        self.run.send_replace(true);

        if let Err(e) = self.connect_all().await {
            self.stop();
            return Err(e);
        }

        info!("Bridge ready.");
        Ok(())
    }

    async fn connect_all(&self) -> ConnectionResult<()> {
        let irc_events = {
            let router = Arc::clone(&self.router);
            RelayEvents::new(
                with_recovery("irc", move |msg| router.on_inbound_from_irc(msg)),
                Arc::clone(&self.run),
            )
        };
        let messenger_events = {
            let router = Arc::clone(&self.router);
            RelayEvents::new(
                with_recovery("messenger", move |msg| router.on_inbound_from_messenger(msg)),
                Arc::clone(&self.run),
            )
        };
        let ignored_events = IgnoredEvents::new(Arc::clone(&self.run));

        info!("Starting IRC client {}...", self.irc.identity());
        self.irc.start(Arc::new(irc_events))?;
        self.bounded(self.irc.identity(), self.irc.wait_connected()).await?;

        info!("Starting {} messenger workers...", self.pool.len());
        self.pool.start(Arc::new(messenger_events), Arc::new(ignored_events))?;
        self.bounded(self.pool.primary_identity(), self.pool.wait_ready()).await?;

        Ok(())
    }

    async fn bounded<F>(&self, identity: &str, wait: F) -> ConnectionResult<()>
    where
        F: Future<Output = ConnectionResult<()>>,
    {
        tokio::time::timeout(self.connect_timeout, wait)
            .await
            .map_err(|_| ConnectionError::Timeout {
                identity: identity.to_string(),
            })?
    }

    /// Stop both sides. Never blocks; repeated calls are no-ops.
    pub fn stop(&self) {
        self.run.send_replace(false);
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }

        info!(irc = %self.irc.state(), "Stopping bridge");
        if let Err(e) = self.irc.stop() {
            warn!("Failed to stop IRC client: {}", e);
        }
        self.pool.stop();
        info!("Bridge stopped.");
    }

    pub fn is_running(&self) -> bool {
        *self.run.borrow()
    }

    /// Start the bridge and keep it up until a connection is lost or
    /// `shutdown` resolves.
    pub async fn run<F>(&self, shutdown: F) -> ConnectionResult<()>
    where
        F: Future<Output = ()>,
    {
        self.start().await?;

        tokio::pin!(shutdown);
        let mut poll = tokio::time::interval(POLL_INTERVAL);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    warn!("User wants to stop");
                    break;
                }
                _ = poll.tick() => {
                    if !self.is_running() {
                        info!("Run flag cleared, shutting down");
                        break;
                    }
                }
            }
        }

        self.stop();
        Ok(())
    }
}
