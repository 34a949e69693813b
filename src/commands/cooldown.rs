//! Per-requester cooldown for on-demand requests
//!
//! Time is passed in explicitly so callers and tests control the clock.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::HashMap;

/// Last accepted request time for each requester
///
/// Entries are never evicted; one entry per distinct requester.
#[derive(Debug, Clone, Default)]
pub struct CooldownBook {
    cooldown: ChronoDuration,
    last_seen: HashMap<String, DateTime<Utc>>,
}

impl CooldownBook {
    pub fn new(cooldown_secs: u64) -> Self {
        let secs = i64::try_from(cooldown_secs)
            .unwrap_or(i64::MAX)
            .min(i64::MAX / 1_000);
        Self {
            cooldown: ChronoDuration::seconds(secs),
            last_seen: HashMap::new(),
        }
    }

    /// Accept and record a request at `now`, or return the seconds left
    ///
    /// A refusal always reports at least one second, even when less remains.
    pub fn check(&mut self, requester: &str, now: DateTime<Utc>) -> Result<(), u64> {
        match self.time_left(requester, now) {
            None => {
                self.last_seen.insert(requester.to_string(), now);
                Ok(())
            }
            Some(left) => Err(whole_secs(left).max(1)),
        }
    }

    /// Whole seconds before `requester` may ask again (rounded down)
    pub fn remaining(&self, requester: &str, now: DateTime<Utc>) -> u64 {
        self.time_left(requester, now).map_or(0, whole_secs)
    }

    /// Time left in the requester's window, `None` once it has elapsed
    fn time_left(&self, requester: &str, now: DateTime<Utc>) -> Option<ChronoDuration> {
        let last = self.last_seen.get(requester)?;
        let Some(until) = last.checked_add_signed(self.cooldown) else {
            return Some(ChronoDuration::MAX);
        };
        let left = until - now;
        (left > ChronoDuration::zero()).then_some(left)
    }

    /// Number of requesters tracked
    pub fn len(&self) -> usize {
        self.last_seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_seen.is_empty()
    }
}

fn whole_secs(left: ChronoDuration) -> u64 {
    u64::try_from(left.num_seconds()).unwrap_or(0)
}
