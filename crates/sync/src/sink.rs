// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The in-process replication transport.
//!
//! Both transports deliver whole snapshots and both end in a
//! [`ReplicationSink`]: the authoritative process publishes into a
//! [`SnapshotBroadcaster`] that fans out to live observers, and the
//! periodic HTTP pull publishes into the same sink type after it has
//! overwritten local state, so observers of a passive replica see the
//! same stream they would see on the authority.

use fila_api::QueueSnapshot;
use tokio::sync::broadcast;
use tracing::debug;

/// How many snapshots to buffer per subscriber before lagging ones
/// start losing the oldest entries.
const SNAPSHOT_BUFFER_SIZE: usize = 100;

/// A destination for replicated snapshots.
///
/// Implementations must tolerate having no consumers; publishing is
/// fire-and-forget.
pub trait ReplicationSink: Send + Sync {
    /// Delivers one full snapshot.
    fn publish(&self, snapshot: &QueueSnapshot);
}

/// Fan-out of snapshots to in-process subscribers.
///
/// Wraps a [`tokio::sync::broadcast`] channel. Slow subscribers lag and
/// lose the oldest buffered snapshots rather than blocking the publisher;
/// since every snapshot is the whole state, a lagging subscriber catches
/// up completely on the next one it receives.
#[derive(Debug, Clone)]
pub struct SnapshotBroadcaster {
    sender: broadcast::Sender<QueueSnapshot>,
}

impl SnapshotBroadcaster {
    /// Creates a broadcaster with the default buffer size.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(SNAPSHOT_BUFFER_SIZE);
        Self { sender }
    }

    /// Subscribes to all snapshots published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<QueueSnapshot> {
        self.sender.subscribe()
    }

    /// Number of current subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for SnapshotBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplicationSink for SnapshotBroadcaster {
    fn publish(&self, snapshot: &QueueSnapshot) {
        // send only fails when there are no subscribers, which is fine.
        match self.sender.send(snapshot.clone()) {
            Ok(count) => debug!("Published snapshot to {count} subscribers"),
            Err(_) => debug!("No snapshot subscribers, dropping"),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used)]

    use super::*;
    use fila::QueueState;

    #[tokio::test]
    async fn test_subscribers_receive_published_snapshots() {
        let broadcaster: SnapshotBroadcaster = SnapshotBroadcaster::new();
        let mut receiver = broadcaster.subscribe();

        let snapshot: QueueSnapshot = QueueSnapshot::capture(&QueueState::default());
        broadcaster.publish(&snapshot);

        let received: QueueSnapshot = receiver.recv().await.unwrap();
        assert_eq!(received, snapshot);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_does_not_panic() {
        let broadcaster: SnapshotBroadcaster = SnapshotBroadcaster::new();
        assert_eq!(broadcaster.subscriber_count(), 0);
        broadcaster.publish(&QueueSnapshot::capture(&QueueState::default()));
    }
}
