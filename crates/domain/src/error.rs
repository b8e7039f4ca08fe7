// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

/// Errors that can occur during domain validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The service class string is not one of the known classes.
    InvalidServiceClass(String),
    /// The ticket state string is not one of the known states.
    InvalidTicketState(String),
    /// The availability string is not one of the known values.
    InvalidAvailability(String),
    /// The attendant position is outside the configured set.
    UnknownPosition {
        /// The position that was requested.
        position: u8,
        /// The highest configured position.
        max: u8,
    },
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidServiceClass(value) => {
                write!(f, "Invalid service class: '{value}'")
            }
            Self::InvalidTicketState(value) => {
                write!(f, "Invalid ticket state: '{value}'")
            }
            Self::InvalidAvailability(value) => {
                write!(f, "Invalid availability: '{value}'")
            }
            Self::UnknownPosition { position, max } => {
                write!(f, "Unknown attendant position {position} (configured: 1..={max})")
            }
        }
    }
}

impl std::error::Error for DomainError {}
