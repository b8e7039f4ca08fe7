// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use thiserror::Error;

/// Errors from one replication attempt.
///
/// None of these are fatal: the pull loop logs the failure, flips its
/// connectivity flag, and retries on the next tick. The worst case is
/// stale local state.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The upstream request failed (connectivity, timeout, HTTP status).
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The upstream body was not a valid snapshot.
    #[error("snapshot decode failed: {0}")]
    Decode(#[from] serde_json::Error),
}
