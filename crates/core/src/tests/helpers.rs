// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{Command, QueueState, TransitionResult, apply};
use fila_domain::ServiceClass;
use time::OffsetDateTime;

/// Applies a command that is expected to succeed and returns the result.
pub fn apply_ok(state: &QueueState, command: Command, now: OffsetDateTime) -> TransitionResult {
    apply(state, command, now).expect("command should apply")
}

/// Issues a ticket and returns the new state.
pub fn with_ticket(
    state: &QueueState,
    service_class: ServiceClass,
    now: OffsetDateTime,
) -> QueueState {
    apply_ok(state, Command::IssueTicket { service_class }, now).new_state
}
