// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use fila_domain::{
    CallRecord, DisplayCode, DomainError, PositionId, PositionStatus, ServiceClass, Ticket,
};
use std::collections::BTreeMap;

/// Number of attendant positions when none is configured.
pub const DEFAULT_POSITION_COUNT: u8 = 3;

/// The full replicated queue state.
///
/// This is the unit of replication: one authoritative replica mutates it
/// through [`crate::apply`], passive replicas overwrite their copy with
/// received snapshots. Tickets and call records are append-only; ticket
/// status is mutated in place. The aggregate lives in volatile memory for
/// the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueState {
    /// Every ticket ever issued, in issue order.
    pub tickets: Vec<Ticket>,
    /// Next sequence number per service class. Starts at 1.
    pub next_numbers: BTreeMap<ServiceClass, u32>,
    /// Status of each configured attendant position.
    pub positions: BTreeMap<PositionId, PositionStatus>,
    /// Every announcement ever made, in announcement order.
    pub call_log: Vec<CallRecord>,
    /// The most recent announcement, driving ephemeral observer alerts.
    pub current_called: Option<CallRecord>,
}

impl QueueState {
    /// Creates an empty aggregate with positions `1..=position_count`,
    /// all available, and every class counter at 1.
    #[must_use]
    pub fn new(position_count: u8) -> Self {
        let next_numbers: BTreeMap<ServiceClass, u32> = ServiceClass::ALL
            .into_iter()
            .map(|class| (class, 1))
            .collect();
        let positions: BTreeMap<PositionId, PositionStatus> = (1..=position_count)
            .map(|id| (PositionId::new(id), PositionStatus::idle()))
            .collect();
        Self {
            tickets: Vec::new(),
            next_numbers,
            positions,
            call_log: Vec::new(),
            current_called: None,
        }
    }

    /// Returns the status of a configured position.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::UnknownPosition`] if the position is outside
    /// the configured set.
    pub fn position(&self, id: PositionId) -> Result<&PositionStatus, DomainError> {
        self.positions.get(&id).ok_or(DomainError::UnknownPosition {
            position: id.value(),
            max: self.position_count(),
        })
    }

    /// Returns the number of configured positions.
    #[must_use]
    pub fn position_count(&self) -> u8 {
        self.positions
            .keys()
            .last()
            .map_or(0, |id| id.value())
    }

    /// Returns the next sequence number that issuing a ticket in this
    /// class would consume.
    #[must_use]
    pub fn next_number(&self, service_class: ServiceClass) -> u32 {
        self.next_numbers.get(&service_class).copied().unwrap_or(1)
    }
}

impl Default for QueueState {
    fn default() -> Self {
        Self::new(DEFAULT_POSITION_COUNT)
    }
}

/// What a successful transition did, for the caller and for observers.
///
/// The benign no-op cases (`QueueEmpty`, `NothingToRepeat`,
/// `NoActiveTicket`) are outcomes rather than errors: the aggregate is
/// left untouched and the caller gets a descriptive signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A ticket was issued into the queue.
    TicketIssued(Ticket),
    /// The head of the priority order was called to a position.
    TicketCalled(CallRecord),
    /// `CallNext` found no waiting tickets.
    QueueEmpty,
    /// A prior call was re-announced without touching the ticket.
    Reannounced(CallRecord),
    /// `CallAgain` found no prior call at the position.
    NothingToRepeat,
    /// The position's current ticket was completed.
    ServiceCompleted {
        /// The completed ticket's display code.
        display_code: DisplayCode,
        /// Derived service duration in whole minutes.
        service_minutes: i64,
    },
    /// `CompleteService` found no current ticket at the position.
    NoActiveTicket,
}

impl Outcome {
    /// Returns whether the transition actually changed the aggregate.
    #[must_use]
    pub const fn changed_state(&self) -> bool {
        !matches!(
            self,
            Self::QueueEmpty | Self::NothingToRepeat | Self::NoActiveTicket
        )
    }

    /// Returns the announcement this outcome published, if any.
    #[must_use]
    pub const fn announcement(&self) -> Option<&CallRecord> {
        match self {
            Self::TicketCalled(record) | Self::Reannounced(record) => Some(record),
            _ => None,
        }
    }
}

/// The result of a successful state transition.
///
/// Transitions are atomic: they either succeed completely or fail without
/// side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionResult {
    /// The new aggregate after the transition.
    pub new_state: QueueState,
    /// What the transition did.
    pub outcome: Outcome,
}
