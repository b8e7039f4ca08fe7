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

mod error;
mod request_response;
mod snapshot;

#[cfg(test)]
mod tests;

use fila::{Command, CompletedFilter, QueueState, TransitionResult, apply};
use fila_domain::{PositionId, ServiceClass};
use time::macros::format_description;
use time::{Date, OffsetDateTime};

pub use error::ApiError;
pub use request_response::{
    CallResponse, CompleteResponse, CompletedQuery, CompletedReportResponse, IssueTicketRequest,
    IssueTicketResponse, PositionView, PositionsResponse, StatsResponse, StatusResponse,
    SyncCommandRequest, SyncCommandResponse, WaitingOverviewResponse,
};
pub use snapshot::{
    CallRecordWire, NextNumbersWire, QueueSnapshot, SnapshotPatch, TicketWire, merge_patch,
};

/// Sync actions the push endpoint recognizes. Anything else is logged
/// and ignored without error.
pub const SYNC_ACTIONS: [&str; 4] = [
    "GENERATE_TICKET",
    "CALL_NEXT",
    "CALL_AGAIN",
    "COMPLETE_SERVICE",
];

/// Returns whether a pushed sync action is recognized.
#[must_use]
pub fn is_known_sync_action(action: &str) -> bool {
    SYNC_ACTIONS.contains(&action)
}

/// Issues a ticket in the requested service class.
///
/// # Errors
///
/// Returns an error if the service class string is not recognized.
pub fn issue_ticket(
    state: &QueueState,
    request: &IssueTicketRequest,
    now: OffsetDateTime,
) -> Result<TransitionResult, ApiError> {
    let service_class: ServiceClass = parse_service_class(&request.service_class)?;
    Ok(apply(state, Command::IssueTicket { service_class }, now)?)
}

/// Calls the highest-priority waiting ticket to a position.
///
/// # Errors
///
/// Returns an error if the position is outside the configured set.
pub fn call_next(
    state: &QueueState,
    position: u8,
    now: OffsetDateTime,
) -> Result<TransitionResult, ApiError> {
    Ok(apply(
        state,
        Command::CallNext {
            position: PositionId::new(position),
        },
        now,
    )?)
}

/// Re-announces a position's most recent call.
///
/// # Errors
///
/// Returns an error if the position is outside the configured set.
pub fn call_again(
    state: &QueueState,
    position: u8,
    now: OffsetDateTime,
) -> Result<TransitionResult, ApiError> {
    Ok(apply(
        state,
        Command::CallAgain {
            position: PositionId::new(position),
        },
        now,
    )?)
}

/// Completes the ticket currently assigned to a position.
///
/// # Errors
///
/// Returns an error if the position is outside the configured set.
pub fn complete_service(
    state: &QueueState,
    position: u8,
    now: OffsetDateTime,
) -> Result<TransitionResult, ApiError> {
    Ok(apply(
        state,
        Command::CompleteService {
            position: PositionId::new(position),
        },
        now,
    )?)
}

/// Returns the priority-ordered waiting list with per-class counts.
#[must_use]
pub fn waiting_overview(state: &QueueState) -> WaitingOverviewResponse {
    WaitingOverviewResponse {
        total: state.waiting_count(),
        standard: state.waiting_count_for(ServiceClass::Standard),
        expectant: state.waiting_count_for(ServiceClass::Expectant),
        senior: state.waiting_count_for(ServiceClass::Senior),
        tickets: state
            .waiting_in_priority_order()
            .into_iter()
            .map(TicketWire::from)
            .collect(),
    }
}

/// Returns completed tickets with metrics, most recent first.
///
/// # Errors
///
/// Returns an error if a date bound or the service class fails to parse.
pub fn completed_report(
    state: &QueueState,
    query: &CompletedQuery,
) -> Result<CompletedReportResponse, ApiError> {
    let filter: CompletedFilter = CompletedFilter {
        from: query.from.as_deref().map(|s| parse_date("from", s)).transpose()?,
        to: query.to.as_deref().map(|s| parse_date("to", s)).transpose()?,
        service_class: query
            .service_class
            .as_deref()
            .map(parse_service_class)
            .transpose()?,
    };
    let tickets: Vec<TicketWire> = state
        .completed_with_metrics(&filter)
        .into_iter()
        .map(TicketWire::from)
        .collect();
    Ok(CompletedReportResponse {
        total: tickets.len(),
        tickets,
    })
}

/// Returns the dashboard counters for the given day.
#[must_use]
pub fn stats(state: &QueueState, today: Date) -> StatsResponse {
    StatsResponse {
        waiting_total: state.waiting_count(),
        waiting_standard: state.waiting_count_for(ServiceClass::Standard),
        waiting_expectant: state.waiting_count_for(ServiceClass::Expectant),
        waiting_senior: state.waiting_count_for(ServiceClass::Senior),
        completed_today: state.completed_today(today),
    }
}

/// Returns every configured position's visible status.
#[must_use]
pub fn positions_overview(state: &QueueState) -> PositionsResponse {
    PositionsResponse {
        positions: state
            .positions
            .iter()
            .map(|(id, status)| PositionView {
                id: id.value(),
                availability: status.availability,
                current_ticket: status
                    .current_ticket
                    .as_ref()
                    .map(|code| code.as_str().to_string()),
                last_call: status.last_call.as_ref().map(CallRecordWire::from),
            })
            .collect(),
    }
}

fn parse_service_class(value: &str) -> Result<ServiceClass, ApiError> {
    value.parse().map_err(|_| ApiError::InvalidInput {
        field: String::from("service_class"),
        message: format!("'{value}' is not one of standard, expectant, senior"),
    })
}

fn parse_date(field: &str, value: &str) -> Result<Date, ApiError> {
    Date::parse(value, format_description!("[year]-[month]-[day]")).map_err(|_| {
        ApiError::InvalidInput {
            field: field.to_string(),
            message: format!("'{value}' is not a YYYY-MM-DD date"),
        }
    })
}
