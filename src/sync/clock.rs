// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Completion-time source for `last_synced`.

use chrono::{DateTime, TimeDelta, Utc};

pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Timestamp to record for a cycle completing at `now`.
///
/// Never returns a value at or before `previous`: a clock that stalls or
/// steps backwards yields `previous + 1ns` instead.
pub fn completion_timestamp(
    previous: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    match previous {
        Some(prev) if now <= prev => prev + TimeDelta::nanoseconds(1),
        _ => now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_completion_uses_clock() {
        let now = Utc::now();
        assert_eq!(completion_timestamp(None, now), now);
    }

    #[test]
    fn advancing_clock_is_used_verbatim() {
        let prev = Utc::now();
        let now = prev + TimeDelta::milliseconds(250);
        assert_eq!(completion_timestamp(Some(prev), now), now);
    }

    #[test]
    fn stalled_or_backwards_clock_still_increases() {
        let prev = Utc::now();
        let same = completion_timestamp(Some(prev), prev);
        assert!(same > prev);

        let earlier = prev - TimeDelta::seconds(5);
        let stepped = completion_timestamp(Some(prev), earlier);
        assert!(stepped > prev);
    }
}
