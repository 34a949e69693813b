//! Request budget for the translation backend
//!
//! Two limits compose:
//! - a rolling window: at most `max_per_window` calls within any `window`
//! - a minimum spacing between consecutive calls
//!
//! The window keeps the start time of every call still inside it, so the
//! cap holds for every rolling window, not only for aligned ones.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};

/// Why a caller has to wait before the next call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleWait {
    /// The rolling window is full
    Window(Duration),
    /// The previous call was too recent
    Spacing(Duration),
}

impl ThrottleWait {
    /// How long to wait
    pub fn duration(&self) -> Duration {
        match self {
            Self::Window(d) | Self::Spacing(d) => *d,
        }
    }
}

/// Rolling-window and spacing state
#[derive(Debug)]
pub struct Throttle {
    max_per_window: usize,
    window: Duration,
    min_spacing: Duration,
    recent: VecDeque<Instant>,
    last_call: Option<Instant>,
}

impl Throttle {
    /// Create a throttle; a zero budget is treated as one call per window
    pub fn new(max_per_window: usize, window: Duration, min_spacing: Duration) -> Self {
        let max_per_window = max_per_window.max(1);
        Self {
            max_per_window,
            window,
            min_spacing,
            recent: VecDeque::with_capacity(max_per_window),
            last_call: None,
        }
    }

    /// Throttle with the standard 60 second window
    pub fn per_minute(max_per_minute: usize, min_spacing: Duration) -> Self {
        Self::new(max_per_minute, Duration::from_secs(60), min_spacing)
    }

    /// Calls currently counted in the window
    pub fn in_window(&self) -> usize {
        self.recent.len()
    }

    /// Compute the wait needed at `now`, window first, then spacing
    pub fn check(&mut self, now: Instant) -> Option<ThrottleWait> {
        while let Some(&oldest) = self.recent.front() {
            if now.saturating_duration_since(oldest) >= self.window {
                self.recent.pop_front();
            } else {
                break;
            }
        }

        if self.recent.len() >= self.max_per_window {
            if let Some(&oldest) = self.recent.front() {
                let wait = (oldest + self.window).saturating_duration_since(now);
                if !wait.is_zero() {
                    return Some(ThrottleWait::Window(wait));
                }
            }
        }

        if let Some(last) = self.last_call {
            let wait = (last + self.min_spacing).saturating_duration_since(now);
            if !wait.is_zero() {
                return Some(ThrottleWait::Spacing(wait));
            }
        }

        None
    }

    /// Record a call starting at `now`
    pub fn record(&mut self, now: Instant) {
        self.recent.push_back(now);
        self.last_call = Some(now);
    }

    /// Suspend until a call is allowed, then record it
    ///
    /// Returns the total time spent waiting.
    pub async fn acquire(&mut self) -> Duration {
        let started = Instant::now();
        loop {
            let now = Instant::now();
            match self.check(now) {
                None => {
                    self.record(now);
                    return now.saturating_duration_since(started);
                }
                Some(ThrottleWait::Window(wait)) => {
                    info!(
                        wait_ms = wait.as_millis() as u64,
                        budget = self.max_per_window,
                        "Translation budget reached, waiting for window"
                    );
                    tokio::time::sleep(wait).await;
                }
                Some(ThrottleWait::Spacing(wait)) => {
                    debug!(wait_ms = wait.as_millis() as u64, "Spacing translation request");
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }
}
