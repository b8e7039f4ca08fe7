// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Priority ordering of waiting tickets.
//!
//! The order is recomputed from the full ticket collection on every call so
//! it always reflects the latest arrivals and completions; nothing here is
//! cached.

use crate::types::{Ticket, TicketState};

/// Returns the waiting tickets in dispatch order.
///
/// Tickets are filtered to `Waiting` and sorted by class priority rank,
/// then arrival time. The sort is stable, so two waiting tickets of the
/// same class keep their arrival order even when their timestamps tie.
#[must_use]
pub fn priority_order(tickets: &[Ticket]) -> Vec<&Ticket> {
    let mut waiting: Vec<&Ticket> = tickets
        .iter()
        .filter(|ticket| ticket.state == TicketState::Waiting)
        .collect();
    waiting.sort_by(|a, b| {
        a.service_class
            .priority_rank()
            .cmp(&b.service_class.priority_rank())
            .then_with(|| a.created_at.cmp(&b.created_at))
    });
    waiting
}

/// Returns the single ticket that `priority_order` would dispatch next.
#[must_use]
pub fn next_in_line(tickets: &[Ticket]) -> Option<&Ticket> {
    priority_order(tickets).into_iter().next()
}
