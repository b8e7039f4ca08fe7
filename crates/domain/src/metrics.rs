// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use time::OffsetDateTime;

/// Derives the elapsed service duration in whole minutes.
///
/// The duration from `called_at` to `completed_at` is rounded to the
/// nearest minute, halves rounding up (5m30s yields 6). A ticket that
/// somehow lacks a call timestamp yields 0 rather than failing.
#[must_use]
pub fn service_minutes(called_at: Option<OffsetDateTime>, completed_at: OffsetDateTime) -> i64 {
    called_at.map_or(0, |called_at| {
        let seconds: i64 = (completed_at - called_at).whole_seconds();
        (seconds + 30).div_euclid(60)
    })
}
