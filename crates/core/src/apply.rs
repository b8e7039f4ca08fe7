// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::command::Command;
use crate::error::CoreError;
use crate::state::{Outcome, QueueState, TransitionResult};
use fila_domain::{
    Availability, CallRecord, PositionId, ServiceClass, Ticket, TicketState, next_in_line,
    service_minutes,
};
use time::OffsetDateTime;

/// Applies a command to the current state, producing a new state and an
/// outcome describing what happened.
///
/// The empty-queue, nothing-to-repeat, and no-active-ticket cases are
/// benign outcomes with an unchanged state, not errors. `now` is the
/// injected timestamp used for every clock read in the transition, which
/// keeps completion math and ordering deterministic under test.
///
/// # Arguments
///
/// * `state` - The current aggregate (immutable)
/// * `command` - The command to apply
/// * `now` - The timestamp of the transition
///
/// # Errors
///
/// Returns an error if the command names a position outside the
/// configured set.
pub fn apply(
    state: &QueueState,
    command: Command,
    now: OffsetDateTime,
) -> Result<TransitionResult, CoreError> {
    match command {
        Command::IssueTicket { service_class } => Ok(issue_ticket(state, service_class, now)),
        Command::CallNext { position } => call_next(state, position, now),
        Command::CallAgain { position } => call_again(state, position, now),
        Command::CompleteService { position } => complete_service(state, position, now),
    }
}

/// Consumes the class counter and appends a fresh waiting ticket.
fn issue_ticket(
    state: &QueueState,
    service_class: ServiceClass,
    now: OffsetDateTime,
) -> TransitionResult {
    let sequence_number: u32 = state.next_number(service_class);
    let ticket: Ticket = Ticket::issue(service_class, sequence_number, now);

    let mut new_state: QueueState = state.clone();
    new_state.tickets.push(ticket.clone());
    new_state
        .next_numbers
        .insert(service_class, sequence_number + 1);

    TransitionResult {
        new_state,
        outcome: Outcome::TicketIssued(ticket),
    }
}

/// Calls the head of the priority order to a position.
///
/// There is no availability precondition: calling while busy overwrites
/// the assignment, and the previously assigned ticket stays `Called`.
fn call_next(
    state: &QueueState,
    position: PositionId,
    now: OffsetDateTime,
) -> Result<TransitionResult, CoreError> {
    state.position(position)?;

    let Some(head) = next_in_line(&state.tickets) else {
        return Ok(TransitionResult {
            new_state: state.clone(),
            outcome: Outcome::QueueEmpty,
        });
    };
    let head_id = head.id;
    let record: CallRecord = CallRecord::announce(head, position, now);

    let mut new_state: QueueState = state.clone();
    if let Some(ticket) = new_state.tickets.iter_mut().find(|t| t.id == head_id) {
        ticket.state = TicketState::Called;
        ticket.called_at = Some(now);
        ticket.assigned_position = Some(position);
    }
    if let Some(status) = new_state.positions.get_mut(&position) {
        status.availability = Availability::Busy;
        status.current_ticket = Some(record.display_code.clone());
        status.last_call = Some(record.clone());
    }
    new_state.call_log.push(record.clone());
    new_state.current_called = Some(record.clone());

    Ok(TransitionResult {
        new_state,
        outcome: Outcome::TicketCalled(record),
    })
}

/// Re-announces the position's most recent call.
///
/// A pure re-announcement: the underlying ticket's `called_at` and state
/// are untouched, and the position's `last_call` keeps its original
/// announcement timestamp.
fn call_again(
    state: &QueueState,
    position: PositionId,
    now: OffsetDateTime,
) -> Result<TransitionResult, CoreError> {
    let Some(last_call) = state.position(position)?.last_call.clone() else {
        return Ok(TransitionResult {
            new_state: state.clone(),
            outcome: Outcome::NothingToRepeat,
        });
    };
    let record: CallRecord = last_call.reannounce(now);

    let mut new_state: QueueState = state.clone();
    new_state.call_log.push(record.clone());
    new_state.current_called = Some(record.clone());

    Ok(TransitionResult {
        new_state,
        outcome: Outcome::Reannounced(record),
    })
}

/// Completes the position's current ticket and frees the position.
///
/// Clears `last_call` as well, so a subsequent `CallAgain` reports
/// nothing-to-repeat.
fn complete_service(
    state: &QueueState,
    position: PositionId,
    now: OffsetDateTime,
) -> Result<TransitionResult, CoreError> {
    let Some(display_code) = state.position(position)?.current_ticket.clone() else {
        return Ok(TransitionResult {
            new_state: state.clone(),
            outcome: Outcome::NoActiveTicket,
        });
    };

    let mut new_state: QueueState = state.clone();
    let mut minutes: i64 = 0;
    if let Some(ticket) = new_state
        .tickets
        .iter_mut()
        .find(|t| t.display_code == display_code && t.assigned_position == Some(position))
    {
        minutes = service_minutes(ticket.called_at, now);
        ticket.state = TicketState::Completed;
        ticket.completed_at = Some(now);
        ticket.service_minutes = Some(minutes);
    }
    if let Some(status) = new_state.positions.get_mut(&position) {
        status.availability = Availability::Available;
        status.current_ticket = None;
        status.last_call = None;
    }

    Ok(TransitionResult {
        new_state,
        outcome: Outcome::ServiceCompleted {
            display_code,
            service_minutes: minutes,
        },
    })
}
