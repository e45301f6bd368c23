// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Last-request-wins bookkeeping for refresh fetches.
//!
//! Fetches are never cancelled. Each dispatch takes a ticket from a
//! per-resource counter, and a response is applied only if its ticket is still
//! the newest one issued for that resource when it arrives.

use log::warn;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RefreshTicket {
    pub resource: String,
    pub seq: u64,
}

#[derive(Debug, Default, Clone)]
struct Counter {
    issued: u64,
    applied: Option<u64>,
}

#[derive(Debug, Default, Clone)]
pub struct RefreshTracker {
    counters: HashMap<String, Counter>,
}

impl RefreshTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, resource: &str) -> RefreshTicket {
        let counter = self.counters.entry(resource.to_string()).or_default();
        counter.issued += 1;
        RefreshTicket {
            resource: resource.to_string(),
            seq: counter.issued,
        }
    }

    /// Checks a completed fetch. Returns `true` and records the ticket as
    /// applied when the caller should use the response.
    pub fn accept(&mut self, ticket: &RefreshTicket) -> bool {
        let Some(counter) = self.counters.get_mut(&ticket.resource) else {
            warn!(
                "Dropping response for unknown resource '{}'",
                ticket.resource
            );
            return false;
        };

        let superseded = ticket.seq < counter.issued;
        let stale = counter.applied.is_some_and(|applied| applied >= ticket.seq);
        if superseded || stale {
            warn!(
                "Dropping stale response: resource={} seq={} latest_issued={} latest_applied={:?}",
                ticket.resource, ticket.seq, counter.issued, counter.applied
            );
            return false;
        }

        counter.applied = Some(ticket.seq);
        true
    }

    /// Whether `ticket` is the newest fetch issued for its resource.
    pub fn is_latest(&self, ticket: &RefreshTicket) -> bool {
        self.counters
            .get(&ticket.resource)
            .is_some_and(|c| c.issued == ticket.seq)
    }

    /// True while a dispatched fetch for `resource` has not been applied.
    pub fn is_pending(&self, resource: &str) -> bool {
        self.counters
            .get(resource)
            .is_some_and(|c| c.applied != Some(c.issued))
    }

    pub fn latest_applied(&self, resource: &str) -> Option<u64> {
        self.counters.get(resource).and_then(|c| c.applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slow_earlier_response_is_ignored() {
        let mut tracker = RefreshTracker::new();
        let first = tracker.begin("map");
        let second = tracker.begin("map");

        assert!(tracker.accept(&second));
        assert!(!tracker.accept(&first));
        assert_eq!(tracker.latest_applied("map"), Some(2));
    }

    #[test]
    fn test_superseded_before_newer_arrives() {
        let mut tracker = RefreshTracker::new();
        let first = tracker.begin("map");
        let _second = tracker.begin("map");
        // The newer fetch is still in flight; the older one must not land.
        assert!(!tracker.accept(&first));
        assert!(tracker.is_pending("map"));
    }

    #[test]
    fn test_resources_are_independent() {
        let mut tracker = RefreshTracker::new();
        let map = tracker.begin("map");
        let _table = tracker.begin("table");
        let _table2 = tracker.begin("table");
        assert!(tracker.accept(&map));
        assert!(!tracker.is_pending("map"));
        assert!(tracker.is_pending("table"));
    }

    #[test]
    fn test_duplicate_delivery_rejected() {
        let mut tracker = RefreshTracker::new();
        let ticket = tracker.begin("map");
        assert!(tracker.accept(&ticket));
        assert!(!tracker.accept(&ticket));
    }
}
