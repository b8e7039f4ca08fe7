// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The JSON wire snapshot and the partial-snapshot merge.
//!
//! Snapshots are the unit of replication between replicas. Field names are
//! camelCase and timestamps travel as RFC 3339 text; both directions of the
//! conversion live here so the synchronization layer, not its consumers,
//! owns timestamp reconstruction.

use fila::QueueState;
use fila_domain::{
    Availability, CallRecord, DisplayCode, PositionId, PositionStatus, ServiceClass, Ticket,
    TicketId, TicketState,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::OffsetDateTime;

/// Wire form of one ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketWire {
    /// Opaque unique identifier.
    pub id: TicketId,
    /// Per-class sequence number.
    pub sequence_number: u32,
    /// The human-shown label.
    pub display_code: String,
    /// The priority class.
    pub service_class: ServiceClass,
    /// Current lifecycle state.
    pub state: TicketState,
    /// When the ticket was drawn.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the ticket was most recently called.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub called_at: Option<OffsetDateTime>,
    /// When service finished.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
    /// Derived service duration in whole minutes.
    #[serde(default)]
    pub service_minutes: Option<i64>,
    /// The position that called this ticket.
    #[serde(default)]
    pub assigned_position: Option<u8>,
}

impl From<&Ticket> for TicketWire {
    fn from(ticket: &Ticket) -> Self {
        Self {
            id: ticket.id,
            sequence_number: ticket.sequence_number,
            display_code: ticket.display_code.as_str().to_string(),
            service_class: ticket.service_class,
            state: ticket.state,
            created_at: ticket.created_at,
            called_at: ticket.called_at,
            completed_at: ticket.completed_at,
            service_minutes: ticket.service_minutes,
            assigned_position: ticket.assigned_position.map(PositionId::value),
        }
    }
}

impl From<TicketWire> for Ticket {
    fn from(wire: TicketWire) -> Self {
        Self {
            id: wire.id,
            sequence_number: wire.sequence_number,
            display_code: DisplayCode::from_raw(wire.display_code),
            service_class: wire.service_class,
            state: wire.state,
            created_at: wire.created_at,
            called_at: wire.called_at,
            completed_at: wire.completed_at,
            service_minutes: wire.service_minutes,
            assigned_position: wire.assigned_position.map(PositionId::new),
        }
    }
}

/// Wire form of one announcement record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRecordWire {
    /// The announced ticket's display code.
    pub display_code: String,
    /// The announced ticket's service class.
    pub service_class: ServiceClass,
    /// The position the ticket was called to.
    pub attendant: u8,
    /// When this announcement was made.
    #[serde(with = "time::serde::rfc3339")]
    pub announced_at: OffsetDateTime,
}

impl From<&CallRecord> for CallRecordWire {
    fn from(record: &CallRecord) -> Self {
        Self {
            display_code: record.display_code.as_str().to_string(),
            service_class: record.service_class,
            attendant: record.position.value(),
            announced_at: record.announced_at,
        }
    }
}

impl From<CallRecordWire> for CallRecord {
    fn from(wire: CallRecordWire) -> Self {
        Self {
            display_code: DisplayCode::from_raw(wire.display_code),
            service_class: wire.service_class,
            position: PositionId::new(wire.attendant),
            announced_at: wire.announced_at,
        }
    }
}

/// Wire form of the per-class next-sequence counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextNumbersWire {
    /// Next standard sequence number.
    pub standard: u32,
    /// Next expectant sequence number.
    pub expectant: u32,
    /// Next senior sequence number.
    pub senior: u32,
}

impl NextNumbersWire {
    fn capture(next_numbers: &BTreeMap<ServiceClass, u32>) -> Self {
        let next = |class: ServiceClass| next_numbers.get(&class).copied().unwrap_or(1);
        Self {
            standard: next(ServiceClass::Standard),
            expectant: next(ServiceClass::Expectant),
            senior: next(ServiceClass::Senior),
        }
    }

    fn restore(self) -> BTreeMap<ServiceClass, u32> {
        BTreeMap::from([
            (ServiceClass::Standard, self.standard),
            (ServiceClass::Expectant, self.expectant),
            (ServiceClass::Senior, self.senior),
        ])
    }
}

/// The full wire snapshot of a replica's state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueSnapshot {
    /// Every ticket ever issued.
    pub queue: Vec<TicketWire>,
    /// Display code currently at each position, or null.
    pub current_numbers: BTreeMap<u8, Option<String>>,
    /// Availability of each position.
    pub attendant_status: BTreeMap<u8, Availability>,
    /// Per-class next-sequence counters.
    pub next_numbers: NextNumbersWire,
    /// Every announcement ever made.
    pub called_tickets: Vec<CallRecordWire>,
    /// The most recent announcement, or null.
    pub current_called: Option<CallRecordWire>,
    /// Most recent announcement per position, or null.
    pub last_called_by_attendant: BTreeMap<u8, Option<CallRecordWire>>,
}

impl QueueSnapshot {
    /// Captures the wire snapshot of an aggregate.
    #[must_use]
    pub fn capture(state: &QueueState) -> Self {
        Self {
            queue: state.tickets.iter().map(TicketWire::from).collect(),
            current_numbers: state
                .positions
                .iter()
                .map(|(id, status)| {
                    (
                        id.value(),
                        status
                            .current_ticket
                            .as_ref()
                            .map(|code| code.as_str().to_string()),
                    )
                })
                .collect(),
            attendant_status: state
                .positions
                .iter()
                .map(|(id, status)| (id.value(), status.availability))
                .collect(),
            next_numbers: NextNumbersWire::capture(&state.next_numbers),
            called_tickets: state.call_log.iter().map(CallRecordWire::from).collect(),
            current_called: state.current_called.as_ref().map(CallRecordWire::from),
            last_called_by_attendant: state
                .positions
                .iter()
                .map(|(id, status)| (id.value(), status.last_call.as_ref().map(CallRecordWire::from)))
                .collect(),
        }
    }

    /// Rebuilds an aggregate from this snapshot.
    ///
    /// This is the full-state overwrite a passive replica performs on each
    /// received snapshot; all timestamps are reconstructed from their wire
    /// text by the deserializer before this runs.
    #[must_use]
    pub fn restore(&self) -> QueueState {
        let positions: BTreeMap<PositionId, PositionStatus> = self
            .attendant_status
            .iter()
            .map(|(&id, &availability)| {
                let status: PositionStatus = PositionStatus {
                    availability,
                    current_ticket: self
                        .current_numbers
                        .get(&id)
                        .cloned()
                        .flatten()
                        .map(DisplayCode::from_raw),
                    last_call: self
                        .last_called_by_attendant
                        .get(&id)
                        .cloned()
                        .flatten()
                        .map(CallRecord::from),
                };
                (PositionId::new(id), status)
            })
            .collect();

        QueueState {
            tickets: self.queue.iter().cloned().map(Ticket::from).collect(),
            next_numbers: self.next_numbers.restore(),
            positions,
            call_log: self
                .called_tickets
                .iter()
                .cloned()
                .map(CallRecord::from)
                .collect(),
            current_called: self.current_called.clone().map(CallRecord::from),
        }
    }
}

/// A partial snapshot: every field optional.
///
/// This is the typed replacement for a duck-typed merge. Absent fields
/// leave the prior local state untouched, so a malformed or truncated
/// payload degrades to a stale-but-consistent merge instead of silently
/// corrupting state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SnapshotPatch {
    /// Replacement ticket collection, if present.
    pub queue: Option<Vec<TicketWire>>,
    /// Replacement per-position current display codes, if present.
    pub current_numbers: Option<BTreeMap<u8, Option<String>>>,
    /// Replacement per-position availability, if present.
    pub attendant_status: Option<BTreeMap<u8, Availability>>,
    /// Replacement next-sequence counters, if present.
    pub next_numbers: Option<NextNumbersWire>,
    /// Replacement announcement log, if present.
    pub called_tickets: Option<Vec<CallRecordWire>>,
    /// Replacement most-recent announcement, if present.
    pub current_called: Option<CallRecordWire>,
    /// Replacement per-position last announcements, if present.
    pub last_called_by_attendant: Option<BTreeMap<u8, Option<CallRecordWire>>>,
}

/// Merges a partial snapshot into an aggregate, field by field.
///
/// Last-writer-wins at field granularity: each present field overwrites
/// its counterpart wholesale, each absent field is left alone. Position
/// entries named by the patch are created if the local replica does not
/// know them yet.
#[must_use]
pub fn merge_patch(state: &QueueState, patch: SnapshotPatch) -> QueueState {
    let mut merged: QueueState = state.clone();

    if let Some(queue) = patch.queue {
        merged.tickets = queue.into_iter().map(Ticket::from).collect();
    }
    if let Some(next_numbers) = patch.next_numbers {
        merged.next_numbers = next_numbers.restore();
    }
    if let Some(current_numbers) = patch.current_numbers {
        for (id, code) in current_numbers {
            let status: &mut PositionStatus =
                merged.positions.entry(PositionId::new(id)).or_default();
            status.current_ticket = code.map(DisplayCode::from_raw);
        }
    }
    if let Some(attendant_status) = patch.attendant_status {
        for (id, availability) in attendant_status {
            let status: &mut PositionStatus =
                merged.positions.entry(PositionId::new(id)).or_default();
            status.availability = availability;
        }
    }
    if let Some(last_called) = patch.last_called_by_attendant {
        for (id, record) in last_called {
            let status: &mut PositionStatus =
                merged.positions.entry(PositionId::new(id)).or_default();
            status.last_call = record.map(CallRecord::from);
        }
    }
    if let Some(called_tickets) = patch.called_tickets {
        merged.call_log = called_tickets.into_iter().map(CallRecord::from).collect();
    }
    if let Some(current_called) = patch.current_called {
        merged.current_called = Some(CallRecord::from(current_called));
    }

    merged
}
