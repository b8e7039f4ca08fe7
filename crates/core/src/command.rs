// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use fila_domain::{PositionId, ServiceClass};

/// A command represents caller intent as data only.
///
/// Commands are the only way to request state changes, and they are only
/// meaningful against the authoritative replica.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Draw the next ticket in a service class.
    IssueTicket {
        /// The priority class to draw in.
        service_class: ServiceClass,
    },
    /// Call the highest-priority waiting ticket to a position.
    CallNext {
        /// The position making the call.
        position: PositionId,
    },
    /// Re-announce the position's most recent call.
    CallAgain {
        /// The position repeating its call.
        position: PositionId,
    },
    /// Finish serving the position's current ticket.
    CompleteService {
        /// The position completing service.
        position: PositionId,
    },
}
