// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Call alerting on passive replicas.
//!
//! A passive replica receives whole snapshots, so "a new ticket was
//! called" has to be detected by diffing the most recent announcement
//! against the one already alerted. The gate does that dedup; the
//! [`DualChime`] turns each fresh announcement into two audible tones.

use fila_api::{CallRecordWire, QueueSnapshot};
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use tracing::info;

/// Pause between the two tones of an announcement.
pub const SECOND_TONE_DELAY: Duration = Duration::from_millis(1500);

/// Something that can produce one attention tone.
pub trait TonePlayer: Send + Sync {
    /// Plays the tone once.
    fn play(&self);
}

/// A tone player that only logs. Deployments wire a real audio device
/// or display cue behind [`TonePlayer`] instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTone;

impl TonePlayer for LogTone {
    fn play(&self) {
        info!("chime");
    }
}

/// Something that reacts to a freshly called ticket.
pub trait CallAnnouncer: Send + Sync {
    /// Alerts for one announcement.
    fn announce(&self, record: &CallRecordWire);
}

/// Plays two tones per announcement, the second after a fixed pause.
///
/// The second tone is scheduled on the runtime so announcing never
/// blocks the replication loop.
pub struct DualChime {
    player: Arc<dyn TonePlayer>,
    delay: Duration,
}

impl DualChime {
    /// Creates a chime with the default pause between tones.
    #[must_use]
    pub fn new(player: Arc<dyn TonePlayer>) -> Self {
        Self {
            player,
            delay: SECOND_TONE_DELAY,
        }
    }

    /// Creates a chime with a custom pause between tones.
    #[must_use]
    pub fn with_delay(player: Arc<dyn TonePlayer>, delay: Duration) -> Self {
        Self { player, delay }
    }
}

impl CallAnnouncer for DualChime {
    fn announce(&self, record: &CallRecordWire) {
        info!(
            "Announcing {} at position {}",
            record.display_code, record.attendant
        );
        self.player.play();

        let player: Arc<dyn TonePlayer> = Arc::clone(&self.player);
        let delay: Duration = self.delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            player.play();
        });
    }
}

/// Tracks which announcement was alerted last so each one fires once.
///
/// A re-announcement of the same ticket carries a new timestamp, so the
/// (code, time) pair distinguishes it from the snapshot simply arriving
/// again on the next poll.
#[derive(Debug, Default)]
pub struct AnnouncementGate {
    last: Option<(String, OffsetDateTime)>,
}

impl AnnouncementGate {
    /// Creates a gate that treats the first announcement it sees as fresh.
    #[must_use]
    pub const fn new() -> Self {
        Self { last: None }
    }

    /// Returns the snapshot's most recent announcement if it has not been
    /// alerted yet, and marks it alerted.
    pub fn fresh_call<'snapshot>(
        &mut self,
        snapshot: &'snapshot QueueSnapshot,
    ) -> Option<&'snapshot CallRecordWire> {
        let record: &CallRecordWire = snapshot.current_called.as_ref()?;
        let key: (String, OffsetDateTime) = (record.display_code.clone(), record.announced_at);
        if self.last.as_ref() == Some(&key) {
            return None;
        }
        self.last = Some(key);
        Some(record)
    }
}
