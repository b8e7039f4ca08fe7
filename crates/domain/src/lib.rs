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

mod dispatch;
mod error;
mod metrics;
mod types;

#[cfg(test)]
mod tests;

pub use dispatch::{next_in_line, priority_order};
pub use error::DomainError;
pub use metrics::service_minutes;
pub use types::{
    Availability, CallRecord, DisplayCode, PositionId, PositionStatus, ServiceClass, Ticket,
    TicketId, TicketState,
};
