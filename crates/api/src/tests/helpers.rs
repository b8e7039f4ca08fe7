// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{IssueTicketRequest, call_next, complete_service, issue_ticket};
use fila::QueueState;
use time::OffsetDateTime;
use time::macros::datetime;

pub fn issue(state: &QueueState, service_class: &str, now: OffsetDateTime) -> QueueState {
    let request: IssueTicketRequest = IssueTicketRequest {
        service_class: service_class.to_string(),
    };
    issue_ticket(state, &request, now)
        .expect("issue should succeed")
        .new_state
}

/// A state with one completed expectant ticket and one standard ticket
/// called and still being served at position 1.
pub fn busy_state() -> QueueState {
    let state: QueueState = QueueState::default();
    let state: QueueState = issue(&state, "expectant", datetime!(2026-03-01 09:00 UTC));
    let state: QueueState = issue(&state, "standard", datetime!(2026-03-01 09:01 UTC));
    let state: QueueState = call_next(&state, 1, datetime!(2026-03-01 09:05 UTC))
        .expect("call should succeed")
        .new_state;
    let state: QueueState = complete_service(&state, 1, datetime!(2026-03-01 09:12 UTC))
        .expect("complete should succeed")
        .new_state;
    call_next(&state, 1, datetime!(2026-03-01 09:15 UTC))
        .expect("call should succeed")
        .new_state
}
