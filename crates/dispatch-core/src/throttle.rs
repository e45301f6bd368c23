// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use std::time::{Duration, Instant};

pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(550);

/// Trailing-edge throttle for search and filter inputs.
///
/// Every `push` restarts the quiet period; once it elapses `poll` hands out
/// the most recent value exactly once. Intermediate values are superseded,
/// the last one is never dropped. The caller supplies the clock.
#[derive(Debug, Clone)]
pub struct TrailingThrottle<T> {
    quiet: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Default for TrailingThrottle<T> {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD)
    }
}

impl<T> TrailingThrottle<T> {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
        }
    }

    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.quiet));
    }

    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let due = self
            .pending
            .as_ref()
            .is_some_and(|(_, deadline)| now >= *deadline);
        if due {
            self.flush()
        } else {
            None
        }
    }

    /// When the pending value becomes due, for timer scheduling.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, d)| *d)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Delivers the pending value right away (e.g. on Enter).
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|(v, _)| v)
    }
}
