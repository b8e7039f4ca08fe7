// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the API layer.

use fila::CoreError;

/// API-level errors.
///
/// These are distinct from domain/core errors and represent the API
/// contract. The benign dispatch signals (empty queue, nothing to repeat,
/// no active ticket) are not errors at all; they surface as outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Invalid input was provided.
    InvalidInput {
        /// The field that was invalid.
        field: String,
        /// A human-readable description of the error.
        message: String,
    },
    /// A domain rule was violated.
    DomainRuleViolation {
        /// A human-readable description of the violation.
        message: String,
    },
    /// A mutating operation reached a passive replica.
    NotAuthoritative,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput { field, message } => {
                write!(f, "Invalid input for field '{field}': {message}")
            }
            Self::DomainRuleViolation { message } => {
                write!(f, "Domain rule violation: {message}")
            }
            Self::NotAuthoritative => {
                write!(f, "This replica is passive; commands must go to the authoritative replica")
            }
        }
    }
}

impl std::error::Error for ApiError {}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        Self::DomainRuleViolation {
            message: err.to_string(),
        }
    }
}
