//! A pool of messenger accounts presented as one outbound channel.
//!
//! Outbound sends rotate across accounts on a five-minute cadence. Only
//! the first account (the primary) relays inbound messages to the
//! bridge; the others are send-only workers.

use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{debug, info, warn};

use crate::common::error::{ConfigError, ConnectionResult};
use crate::common::{ChatClient, EventSink};
use crate::messenger::rotation::{rotation_index, Clock};

pub struct WorkerPool {
    /// Fixed after construction. Index 0 is the primary.
    workers: Vec<Arc<dyn ChatClient>>,
    clock: Arc<dyn Clock>,
}

impl WorkerPool {
    pub fn new(
        workers: Vec<Arc<dyn ChatClient>>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        if workers.is_empty() {
            return Err(ConfigError::ValidationError {
                message: "worker pool needs at least one messenger account".to_string(),
            });
        }
        Ok(Self { workers, clock })
    }

    /// Start every worker. The primary reports to `primary`, the rest to
    /// `secondary`.
    pub fn start(
        &self,
        primary: Arc<dyn EventSink>,
        secondary: Arc<dyn EventSink>,
    ) -> ConnectionResult<()> {
        for (i, worker) in self.workers.iter().enumerate() {
            let sink = if i == 0 {
                Arc::clone(&primary)
            } else {
                Arc::clone(&secondary)
            };
            debug!(identity = worker.identity(), primary = i == 0, "Starting messenger worker");
            worker.start(sink)?;
        }
        Ok(())
    }

    /// Resolve once every worker is ready; the first failure wins.
    pub async fn wait_ready(&self) -> ConnectionResult<()> {
        try_join_all(self.workers.iter().map(|w| w.wait_connected())).await?;
        info!("All {} messenger workers ready", self.workers.len());
        Ok(())
    }

    /// Stop every worker. Failures are logged, not raised.
    pub fn stop(&self) {
        for worker in &self.workers {
            debug!(
                identity = worker.identity(),
                state = %worker.state(),
                "Stopping messenger worker"
            );
            if let Err(e) = worker.stop() {
                warn!(identity = worker.identity(), "Failed to stop messenger worker: {}", e);
            }
        }
    }

    /// Send through the worker selected for the current rotation window.
    pub fn send(&self, destination: &str, text: &str) -> ConnectionResult<()> {
        let worker = self.select();
        debug!(worker = worker.identity(), destination, "Messenger send");
        worker.send(destination, text)
    }

    /// The bridge's own messenger identity.
    pub fn primary_identity(&self) -> &str {
        self.workers[0].identity()
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    fn select(&self) -> &Arc<dyn ChatClient> {
        let index = rotation_index(self.clock.epoch_seconds(), self.workers.len());
        &self.workers[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::testing::{CollectingSink, RecordingClient};
    use crate::common::InboundMessage;
    use crate::messenger::rotation::tests::FixedClock;

    fn make_pool(
        clients: &[Arc<RecordingClient>],
        clock: Arc<FixedClock>,
    ) -> WorkerPool {
        let workers = clients
            .iter()
            .map(|c| Arc::clone(c) as Arc<dyn ChatClient>)
            .collect();
        WorkerPool::new(workers, clock).unwrap()
    }

    #[test]
    fn test_empty_pool_rejected() {
        assert!(WorkerPool::new(Vec::new(), Arc::new(FixedClock::at(0))).is_err());
    }

    #[test]
    fn test_send_rotates_by_window() {
        let clients = vec![
            RecordingClient::new("a"),
            RecordingClient::new("b"),
            RecordingClient::new("c"),
        ];
        let clock = Arc::new(FixedClock::at(0));
        let pool = make_pool(&clients, Arc::clone(&clock));

        pool.send("x", "first").unwrap();
        clock.set(299);
        pool.send("x", "same window").unwrap();
        clock.set(300);
        pool.send("x", "second").unwrap();
        clock.set(600);
        pool.send("x", "third").unwrap();
        clock.set(900);
        pool.send("x", "wraps").unwrap();

        let a: Vec<String> = clients[0].sent().into_iter().map(|m| m.text).collect();
        assert_eq!(a, vec!["first", "same window", "wraps"]);
        assert_eq!(clients[1].sent()[0].text, "second");
        assert_eq!(clients[2].sent()[0].text, "third");
    }

    #[test]
    fn test_single_worker_gets_everything() {
        let clients = vec![RecordingClient::new("solo")];
        let clock = Arc::new(FixedClock::at(1_700_000_000));
        let pool = make_pool(&clients, Arc::clone(&clock));

        pool.send("x", "one").unwrap();
        clock.set(1_700_009_999);
        pool.send("x", "two").unwrap();

        assert_eq!(clients[0].sent().len(), 2);
    }

    #[test]
    fn test_only_primary_gets_primary_sink() {
        let clients = vec![RecordingClient::new("primary"), RecordingClient::new("worker")];
        let pool = make_pool(&clients, Arc::new(FixedClock::at(0)));
        let primary = Arc::new(CollectingSink::default());
        let secondary = Arc::new(CollectingSink::default());

        pool.start(primary.clone(), secondary.clone()).unwrap();
        clients[0].deliver(InboundMessage::new("#dev", "123", "to primary"));
        clients[1].deliver(InboundMessage::new("#dev", "123", "to worker"));

        assert_eq!(primary.messages.lock().len(), 1);
        assert_eq!(primary.messages.lock()[0].body, "to primary");
        assert_eq!(secondary.messages.lock()[0].body, "to worker");
        assert_eq!(pool.primary_identity(), "primary");
    }

    #[tokio::test]
    async fn test_wait_ready_fails_if_any_worker_fails() {
        let clients = vec![RecordingClient::new("ok"), RecordingClient::failing("broken")];
        let pool = make_pool(&clients, Arc::new(FixedClock::at(0)));
        let sink = Arc::new(CollectingSink::default());

        pool.start(sink.clone(), sink).unwrap();
        assert!(pool.wait_ready().await.is_err());
    }

    #[tokio::test]
    async fn test_wait_ready_all_ok() {
        let clients = vec![RecordingClient::new("a"), RecordingClient::new("b")];
        let pool = make_pool(&clients, Arc::new(FixedClock::at(0)));
        let sink = Arc::new(CollectingSink::default());

        pool.start(sink.clone(), sink).unwrap();
        tokio_test::assert_ok!(pool.wait_ready().await);
    }

    #[test]
    fn test_stop_is_idempotent_and_tolerates_failures() {
        let clients = vec![RecordingClient::failing_stop("a"), RecordingClient::new("b")];
        let pool = make_pool(&clients, Arc::new(FixedClock::at(0)));

        pool.stop();
        pool.stop();

        assert_eq!(clients[0].stop_calls(), 2);
        assert_eq!(clients[1].stop_calls(), 2);
    }
}
