// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The periodic HTTP pull transport.
//!
//! A passive replica polls the authority's snapshot endpoint on a fixed
//! interval and overwrites its local state with whatever it receives.
//! There is no incremental protocol; the whole snapshot travels every
//! time, which keeps a replica that missed any number of polls exactly
//! one successful poll away from current.

use crate::announce::{AnnouncementGate, CallAnnouncer};
use crate::error::SyncError;
use crate::sink::ReplicationSink;
use fila::QueueState;
use fila_api::{CallRecordWire, QueueSnapshot};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// How often a passive replica polls its upstream.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Where and how often to pull.
#[derive(Debug, Clone)]
pub struct PullReplicaConfig {
    /// Base URL of the authoritative replica, e.g. `http://host:3000`.
    pub upstream_url: String,
    /// Delay between polls.
    pub poll_interval: Duration,
}

impl PullReplicaConfig {
    /// Creates a config with the default poll interval.
    #[must_use]
    pub fn new(upstream_url: String) -> Self {
        Self {
            upstream_url,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// The polling loop of a passive replica.
///
/// Each successful poll overwrites the shared state, republishes the
/// snapshot to local observers, and alerts for a freshly called ticket.
/// Failures flip the connectivity flag and are retried on the next
/// tick; the loop itself never exits.
pub struct PullReplica {
    config: PullReplicaConfig,
    client: reqwest::Client,
    state: Arc<Mutex<QueueState>>,
    sink: Arc<dyn ReplicationSink>,
    announcer: Arc<dyn CallAnnouncer>,
    gate: AnnouncementGate,
    connected: Arc<AtomicBool>,
}

impl PullReplica {
    /// Creates the polling loop.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(
        config: PullReplicaConfig,
        state: Arc<Mutex<QueueState>>,
        sink: Arc<dyn ReplicationSink>,
        announcer: Arc<dyn CallAnnouncer>,
    ) -> Result<Self, SyncError> {
        let client: reqwest::Client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            config,
            client,
            state,
            sink,
            announcer,
            gate: AnnouncementGate::new(),
            connected: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Flag that is true while the most recent poll succeeded.
    #[must_use]
    pub fn connected_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.connected)
    }

    /// Runs the polling loop forever. Spawn this on the runtime and
    /// abort the task to stop replication.
    pub async fn run(mut self) {
        info!(
            "Pulling snapshots from {} every {:?}",
            self.config.upstream_url, self.config.poll_interval
        );
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.poll_cycle().await;
        }
    }

    /// One poll attempt, with the failure bookkeeping of the loop.
    async fn poll_cycle(&mut self) {
        if let Err(error) = self.poll_once().await {
            if self.connected.swap(false, Ordering::SeqCst) {
                warn!("Lost upstream: {error}");
            } else {
                debug!("Upstream still unreachable: {error}");
            }
        }
    }

    async fn poll_once(&mut self) -> Result<(), SyncError> {
        let url: String = format!(
            "{}/api/queue-sync",
            self.config.upstream_url.trim_end_matches('/')
        );
        let body: String = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let snapshot: QueueSnapshot = serde_json::from_str(&body)?;

        let fresh: Option<CallRecordWire> = self.gate.fresh_call(&snapshot).cloned();
        {
            let mut state = self.state.lock().await;
            *state = snapshot.restore();
        }
        if !self.connected.swap(true, Ordering::SeqCst) {
            info!("Upstream reachable, state synchronized");
        }
        self.sink.publish(&snapshot);
        if let Some(record) = fresh {
            self.announcer.announce(&record);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used)]

    use super::*;
    use crate::announce::CallAnnouncer;
    use crate::sink::SnapshotBroadcaster;
    use fila::{Command, apply};
    use fila_domain::{PositionId, ServiceClass};
    use std::sync::Mutex as StdMutex;
    use time::macros::datetime;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[derive(Default)]
    struct RecordingAnnouncer {
        calls: StdMutex<Vec<String>>,
    }

    impl CallAnnouncer for RecordingAnnouncer {
        fn announce(&self, record: &CallRecordWire) {
            self.calls.lock().unwrap().push(record.display_code.clone());
        }
    }

    /// A state with one ticket called to position 1.
    fn upstream_state() -> QueueState {
        let state: QueueState = QueueState::default();
        let state: QueueState = apply(
            &state,
            Command::IssueTicket {
                service_class: ServiceClass::Standard,
            },
            datetime!(2026-03-01 09:00 UTC),
        )
        .unwrap()
        .new_state;
        apply(
            &state,
            Command::CallNext {
                position: PositionId::new(1),
            },
            datetime!(2026-03-01 09:05 UTC),
        )
        .unwrap()
        .new_state
    }

    /// Accepts one connection, reads the request headers, and writes the
    /// canned response.
    async fn serve_once(listener: &TcpListener, response: String) {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf: [u8; 1024] = [0; 1024];
        let mut request: Vec<u8> = Vec::new();
        loop {
            let n: usize = socket.read(&mut buf).await.unwrap();
            request.extend_from_slice(&buf[..n]);
            if n == 0 || request.windows(4).any(|w| w == b"\r\n\r\n") {
                break;
            }
        }
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
    }

    fn http_500() -> String {
        String::from(
            "HTTP/1.1 500 Internal Server Error\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
        )
    }

    fn http_200(body: &str) -> String {
        format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    #[tokio::test]
    async fn test_failed_polls_flip_the_flag_and_success_recovers() {
        let listener: TcpListener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let snapshot_json: String =
            serde_json::to_string(&QueueSnapshot::capture(&upstream_state())).unwrap();

        // First poll gets a server error, second a valid snapshot, then
        // the listener goes away entirely.
        tokio::spawn(async move {
            serve_once(&listener, http_500()).await;
            serve_once(&listener, http_200(&snapshot_json)).await;
        });

        let state: Arc<Mutex<QueueState>> = Arc::new(Mutex::new(QueueState::default()));
        let broadcaster: Arc<SnapshotBroadcaster> = Arc::new(SnapshotBroadcaster::new());
        let mut observer = broadcaster.subscribe();
        let announcer: Arc<RecordingAnnouncer> = Arc::new(RecordingAnnouncer::default());
        let mut replica: PullReplica = PullReplica::new(
            PullReplicaConfig::new(format!("http://{addr}")),
            Arc::clone(&state),
            Arc::clone(&broadcaster) as Arc<dyn ReplicationSink>,
            Arc::clone(&announcer) as Arc<dyn CallAnnouncer>,
        )
        .unwrap();
        let connected: Arc<AtomicBool> = replica.connected_flag();
        assert!(!connected.load(Ordering::SeqCst));

        // Server error: still disconnected, local state untouched.
        replica.poll_cycle().await;
        assert!(!connected.load(Ordering::SeqCst));
        assert_eq!(state.lock().await.tickets.len(), 0);

        // Valid snapshot: connected, state overwritten, snapshot
        // republished to local observers, fresh call announced.
        replica.poll_cycle().await;
        assert!(connected.load(Ordering::SeqCst));
        assert_eq!(state.lock().await.tickets.len(), 1);
        let republished: QueueSnapshot = observer.recv().await.unwrap();
        assert_eq!(republished.queue.len(), 1);
        assert_eq!(
            announcer.calls.lock().unwrap().as_slice(),
            ["N001".to_string()]
        );

        // Upstream gone again: flag drops, loop keeps going, last good
        // state survives.
        replica.poll_cycle().await;
        assert!(!connected.load(Ordering::SeqCst));
        assert_eq!(state.lock().await.tickets.len(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_upstream_never_panics() {
        // Bind then drop to get a port with nothing listening.
        let listener: TcpListener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut replica: PullReplica = PullReplica::new(
            PullReplicaConfig::new(format!("http://{addr}")),
            Arc::new(Mutex::new(QueueState::default())),
            Arc::new(SnapshotBroadcaster::new()) as Arc<dyn ReplicationSink>,
            Arc::new(RecordingAnnouncer::default()) as Arc<dyn CallAnnouncer>,
        )
        .unwrap();
        let connected: Arc<AtomicBool> = replica.connected_flag();

        replica.poll_cycle().await;
        replica.poll_cycle().await;
        assert!(!connected.load(Ordering::SeqCst));
    }
}
