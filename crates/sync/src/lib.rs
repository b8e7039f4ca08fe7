// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod announce;
mod error;
mod pull;
mod sink;

pub use announce::{
    AnnouncementGate, CallAnnouncer, DualChime, LogTone, SECOND_TONE_DELAY, TonePlayer,
};
pub use error::SyncError;
pub use pull::{DEFAULT_POLL_INTERVAL, PullReplica, PullReplicaConfig};
pub use sink::{ReplicationSink, SnapshotBroadcaster};
