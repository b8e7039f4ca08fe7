// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::OffsetDateTime;
use uuid::Uuid;

/// The priority class a ticket is drawn in.
///
/// Classes carry a fixed dispatch rank and a display prefix letter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum ServiceClass {
    /// Regular service, lowest priority. Prefix "N".
    #[default]
    Standard,
    /// Expectant customers, highest priority. Prefix "G".
    Expectant,
    /// Senior customers, between expectant and standard. Prefix "I".
    Senior,
}

impl ServiceClass {
    /// All service classes, in declaration order.
    pub const ALL: [Self; 3] = [Self::Standard, Self::Expectant, Self::Senior];

    /// Returns the display code prefix letter for this class.
    #[must_use]
    pub const fn prefix(self) -> char {
        match self {
            Self::Standard => 'N',
            Self::Expectant => 'G',
            Self::Senior => 'I',
        }
    }

    /// Returns the dispatch rank for this class. Lower ranks dispatch first.
    #[must_use]
    pub const fn priority_rank(self) -> u8 {
        match self {
            Self::Expectant => 1,
            Self::Senior => 2,
            Self::Standard => 3,
        }
    }

    /// Converts this class to its string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Expectant => "expectant",
            Self::Senior => "senior",
        }
    }
}

impl FromStr for ServiceClass {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(Self::Standard),
            "expectant" => Ok(Self::Expectant),
            "senior" => Ok(Self::Senior),
            _ => Err(DomainError::InvalidServiceClass(s.to_string())),
        }
    }
}

impl std::fmt::Display for ServiceClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The lifecycle state of a ticket.
///
/// A ticket only moves forward: Waiting → Called → Completed. `Serving` is
/// reserved on the wire and treated as `Called` by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TicketState {
    /// In the queue, not yet called.
    #[default]
    Waiting,
    /// Announced at an attendant position.
    Called,
    /// Reserved. Collapses into `Called` in practice.
    Serving,
    /// Service finished. Terminal.
    Completed,
}

impl TicketState {
    /// Converts this state to its string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Called => "called",
            Self::Serving => "serving",
            Self::Completed => "completed",
        }
    }

    /// Returns whether the ticket is still waiting to be dispatched.
    #[must_use]
    pub const fn is_waiting(self) -> bool {
        matches!(self, Self::Waiting)
    }

    /// Returns whether the ticket has finished service.
    #[must_use]
    pub const fn is_completed(self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl FromStr for TicketState {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(Self::Waiting),
            "called" => Ok(Self::Called),
            "serving" => Ok(Self::Serving),
            "completed" => Ok(Self::Completed),
            _ => Err(DomainError::InvalidTicketState(s.to_string())),
        }
    }
}

impl std::fmt::Display for TicketState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Opaque unique ticket identifier. Assigned at creation, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(Uuid);

impl TicketId {
    /// Allocates a fresh identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TicketId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TicketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The human-shown ticket label: class prefix plus the zero-padded
/// sequence number (e.g. `G007`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisplayCode(String);

impl DisplayCode {
    /// Formats the display code for a class and sequence number.
    #[must_use]
    pub fn new(service_class: ServiceClass, sequence_number: u32) -> Self {
        Self(format!("{}{sequence_number:03}", service_class.prefix()))
    }

    /// Wraps an already-formatted code (e.g. one read off the wire).
    #[must_use]
    pub fn from_raw(code: String) -> Self {
        Self(code)
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DisplayCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a staffed attendant position (counter).
///
/// Positions form a small fixed set (1..=N) configured at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositionId(u8);

impl PositionId {
    /// Creates a position identifier.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Returns the numeric value.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl std::fmt::Display for PositionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One customer's place in the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    /// Opaque unique identifier.
    pub id: TicketId,
    /// Per-class sequence number, starting at 1. Unique within the class only.
    pub sequence_number: u32,
    /// The human-shown label derived from class and sequence number.
    pub display_code: DisplayCode,
    /// The priority class this ticket was drawn in.
    pub service_class: ServiceClass,
    /// Current lifecycle state.
    pub state: TicketState,
    /// When the ticket was drawn.
    pub created_at: OffsetDateTime,
    /// When the ticket was most recently called. Absent while waiting.
    pub called_at: Option<OffsetDateTime>,
    /// When service finished. Absent until completed.
    pub completed_at: Option<OffsetDateTime>,
    /// Derived service duration in whole minutes. Absent until completed.
    pub service_minutes: Option<i64>,
    /// The position that called this ticket. Absent while waiting.
    pub assigned_position: Option<PositionId>,
}

impl Ticket {
    /// Creates a freshly issued, waiting ticket.
    ///
    /// # Arguments
    ///
    /// * `service_class` - The priority class the ticket is drawn in
    /// * `sequence_number` - The consumed per-class sequence number
    /// * `created_at` - The issue timestamp
    #[must_use]
    pub fn issue(
        service_class: ServiceClass,
        sequence_number: u32,
        created_at: OffsetDateTime,
    ) -> Self {
        Self {
            id: TicketId::new(),
            sequence_number,
            display_code: DisplayCode::new(service_class, sequence_number),
            service_class,
            state: TicketState::Waiting,
            created_at,
            called_at: None,
            completed_at: None,
            service_minutes: None,
            assigned_position: None,
        }
    }
}

/// An announcement event, distinct from the ticket itself.
///
/// Re-announcing a ticket appends a fresh record; it never mutates the
/// underlying ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRecord {
    /// The announced ticket's display code.
    pub display_code: DisplayCode,
    /// The announced ticket's service class.
    pub service_class: ServiceClass,
    /// The position the ticket was called to.
    pub position: PositionId,
    /// When this announcement was made.
    pub announced_at: OffsetDateTime,
}

impl CallRecord {
    /// Creates the announcement record for calling a ticket to a position.
    #[must_use]
    pub fn announce(ticket: &Ticket, position: PositionId, announced_at: OffsetDateTime) -> Self {
        Self {
            display_code: ticket.display_code.clone(),
            service_class: ticket.service_class,
            position,
            announced_at,
        }
    }

    /// Creates a fresh announcement of the same ticket at the same position.
    #[must_use]
    pub fn reannounce(&self, announced_at: OffsetDateTime) -> Self {
        Self {
            announced_at,
            ..self.clone()
        }
    }
}

/// Whether an attendant position can take the next ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    /// No ticket assigned.
    #[default]
    Available,
    /// Currently serving a ticket.
    Busy,
}

impl Availability {
    /// Converts this availability to its string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Busy => "busy",
        }
    }
}

impl FromStr for Availability {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(Self::Available),
            "busy" => Ok(Self::Busy),
            _ => Err(DomainError::InvalidAvailability(s.to_string())),
        }
    }
}

impl std::fmt::Display for Availability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The mutable status of one attendant position.
///
/// Invariant: `availability` is `Busy` exactly when `current_ticket` is
/// present. `last_call` survives past completion of earlier tickets and is
/// only cleared when the position completes its current one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PositionStatus {
    /// Whether the position can take the next ticket.
    pub availability: Availability,
    /// Display code of the ticket being served, if any.
    pub current_ticket: Option<DisplayCode>,
    /// Most recent announcement made at this position, if any.
    pub last_call: Option<CallRecord>,
}

impl PositionStatus {
    /// Creates an idle position with no assignment and no call history.
    #[must_use]
    pub const fn idle() -> Self {
        Self {
            availability: Availability::Available,
            current_ticket: None,
            last_call: None,
        }
    }

    /// Returns whether the position is currently serving a ticket.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        matches!(self.availability, Availability::Busy)
    }
}
