// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Read-only queries over the aggregate, consumed by rendering and
//! reporting collaborators. None of these mutate or cache anything.

use crate::state::QueueState;
use fila_domain::{ServiceClass, Ticket, priority_order};
use time::Date;

/// Filter for the completed-tickets report.
///
/// Date bounds are closed: a `from` of March 1 includes everything
/// completed from the start of March 1, a `to` of March 3 includes
/// everything through the end of March 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompletedFilter {
    /// Inclusive first day of completion, if bounded.
    pub from: Option<Date>,
    /// Inclusive last day of completion, if bounded.
    pub to: Option<Date>,
    /// Restrict to one service class, if set.
    pub service_class: Option<ServiceClass>,
}

impl QueueState {
    /// Returns the number of waiting tickets across all classes.
    #[must_use]
    pub fn waiting_count(&self) -> usize {
        self.tickets
            .iter()
            .filter(|ticket| ticket.state.is_waiting())
            .count()
    }

    /// Returns the number of waiting tickets in one class.
    #[must_use]
    pub fn waiting_count_for(&self, service_class: ServiceClass) -> usize {
        self.tickets
            .iter()
            .filter(|ticket| ticket.state.is_waiting() && ticket.service_class == service_class)
            .count()
    }

    /// Returns the number of tickets completed on the given day.
    #[must_use]
    pub fn completed_today(&self, today: Date) -> usize {
        self.tickets
            .iter()
            .filter(|ticket| {
                ticket.state.is_completed()
                    && ticket.completed_at.is_some_and(|at| at.date() == today)
            })
            .count()
    }

    /// Returns the waiting tickets in dispatch order.
    ///
    /// Recomputed from the ticket collection on every call; never cached.
    #[must_use]
    pub fn waiting_in_priority_order(&self) -> Vec<&Ticket> {
        priority_order(&self.tickets)
    }

    /// Returns completed tickets with derived metrics, most recent
    /// completion first, restricted by the filter.
    #[must_use]
    pub fn completed_with_metrics(&self, filter: &CompletedFilter) -> Vec<&Ticket> {
        let mut completed: Vec<&Ticket> = self
            .tickets
            .iter()
            .filter(|ticket| ticket.state.is_completed() && ticket.service_minutes.is_some())
            .filter(|ticket| {
                filter
                    .service_class
                    .is_none_or(|class| ticket.service_class == class)
            })
            .filter(|ticket| {
                ticket.completed_at.is_some_and(|at| {
                    let day: Date = at.date();
                    filter.from.is_none_or(|from| day >= from)
                        && filter.to.is_none_or(|to| day <= to)
                })
            })
            .collect();
        completed.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        completed
    }
}
