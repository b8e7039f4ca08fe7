// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Request and response types for the command, query, and sync surfaces.

use crate::snapshot::{CallRecordWire, QueueSnapshot, SnapshotPatch, TicketWire};
use fila::Outcome;
use fila_domain::Availability;
use serde::{Deserialize, Serialize};

/// Request to draw a ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueTicketRequest {
    /// The service class to draw in ("standard", "expectant", "senior").
    pub service_class: String,
}

/// Response to a successful ticket draw.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueTicketResponse {
    /// Success indicator.
    pub success: bool,
    /// The freshly issued ticket.
    pub ticket: TicketWire,
}

/// Response to a call or call-again command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallResponse {
    /// What the command did: "called", "reannounced", "queue_empty",
    /// or "nothing_to_repeat".
    pub outcome: String,
    /// The announcement that was published, if one was.
    pub record: Option<CallRecordWire>,
}

impl CallResponse {
    /// Builds the response for a call/call-again outcome.
    #[must_use]
    pub fn from_outcome(outcome: &Outcome) -> Self {
        match outcome {
            Outcome::TicketCalled(record) => Self {
                outcome: String::from("called"),
                record: Some(CallRecordWire::from(record)),
            },
            Outcome::Reannounced(record) => Self {
                outcome: String::from("reannounced"),
                record: Some(CallRecordWire::from(record)),
            },
            Outcome::QueueEmpty => Self {
                outcome: String::from("queue_empty"),
                record: None,
            },
            Outcome::NothingToRepeat => Self {
                outcome: String::from("nothing_to_repeat"),
                record: None,
            },
            // Not produced by call commands; surfaced rather than
            // misreported as a benign no-op.
            Outcome::TicketIssued(_)
            | Outcome::ServiceCompleted { .. }
            | Outcome::NoActiveTicket => Self {
                outcome: String::from("unsupported"),
                record: None,
            },
        }
    }
}

/// Response to a complete-service command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteResponse {
    /// What the command did: "completed" or "no_active_ticket".
    pub outcome: String,
    /// Display code of the completed ticket, if one was completed.
    pub display_code: Option<String>,
    /// Derived service duration in whole minutes, if one was completed.
    pub service_minutes: Option<i64>,
}

impl CompleteResponse {
    /// Builds the response for a complete-service outcome.
    #[must_use]
    pub fn from_outcome(outcome: &Outcome) -> Self {
        match outcome {
            Outcome::ServiceCompleted {
                display_code,
                service_minutes,
            } => Self {
                outcome: String::from("completed"),
                display_code: Some(display_code.as_str().to_string()),
                service_minutes: Some(*service_minutes),
            },
            Outcome::NoActiveTicket => Self {
                outcome: String::from("no_active_ticket"),
                display_code: None,
                service_minutes: None,
            },
            // Not produced by the complete command; surfaced rather than
            // misreported as a benign no-op.
            Outcome::TicketIssued(_)
            | Outcome::TicketCalled(_)
            | Outcome::QueueEmpty
            | Outcome::Reannounced(_)
            | Outcome::NothingToRepeat => Self {
                outcome: String::from("unsupported"),
                display_code: None,
                service_minutes: None,
            },
        }
    }
}

/// The priority-ordered waiting list with per-class counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitingOverviewResponse {
    /// Waiting tickets across all classes.
    pub total: usize,
    /// Waiting standard tickets.
    pub standard: usize,
    /// Waiting expectant tickets.
    pub expectant: usize,
    /// Waiting senior tickets.
    pub senior: usize,
    /// The waiting tickets in dispatch order.
    pub tickets: Vec<TicketWire>,
}

/// Query parameters for the completed-tickets report.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompletedQuery {
    /// Inclusive first completion day, `YYYY-MM-DD`.
    pub from: Option<String>,
    /// Inclusive last completion day, `YYYY-MM-DD`.
    pub to: Option<String>,
    /// Restrict to one service class.
    pub service_class: Option<String>,
}

/// The completed-tickets report, most recent completion first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedReportResponse {
    /// Number of tickets in the report.
    pub total: usize,
    /// The completed tickets with derived metrics.
    pub tickets: Vec<TicketWire>,
}

/// Aggregate counters for dashboards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    /// Waiting tickets across all classes.
    pub waiting_total: usize,
    /// Waiting standard tickets.
    pub waiting_standard: usize,
    /// Waiting expectant tickets.
    pub waiting_expectant: usize,
    /// Waiting senior tickets.
    pub waiting_senior: usize,
    /// Tickets completed today.
    pub completed_today: usize,
}

/// One attendant position's visible status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionView {
    /// The position identifier.
    pub id: u8,
    /// Whether the position can take the next ticket.
    pub availability: Availability,
    /// Display code being served, if any.
    pub current_ticket: Option<String>,
    /// Most recent announcement at this position, if any.
    pub last_call: Option<CallRecordWire>,
}

/// All attendant positions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionsResponse {
    /// Every configured position, in identifier order.
    pub positions: Vec<PositionView>,
}

/// Replica role and connectivity, for observability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    /// "authoritative" or "passive".
    pub role: String,
    /// Whether the last upstream poll succeeded. Always true on the
    /// authoritative replica.
    pub connected: bool,
}

/// A pushed sync command: an action name plus a partial snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncCommandRequest {
    /// The action name (e.g. `CALL_NEXT`).
    pub action: String,
    /// The partial snapshot to merge.
    pub data: SnapshotPatch,
}

/// Acknowledgement of a pushed sync command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncCommandResponse {
    /// Success indicator. True even for unrecognized actions, which are
    /// logged and ignored.
    pub success: bool,
    /// The snapshot after the merge.
    pub data: QueueSnapshot,
}
