// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::model::{DeliveryRequest, RequestId};
use crate::money::Money;
use crate::status::{normalize_status, status_rank, StatusGroup};
use log::{debug, warn};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubGroup {
    /// Normalized raw status.
    pub status: String,
    pub count: usize,
    pub money: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupNode {
    pub key: StatusGroup,
    pub total: usize,
    pub money: Money,
    /// Ordered by status rank.
    pub subgroups: Vec<SubGroup>,
}

impl GroupNode {
    fn empty(key: StatusGroup) -> Self {
        Self {
            key,
            total: 0,
            money: Money::ZERO,
            subgroups: Vec::new(),
        }
    }

    /// Percentage of `of` that this group holds; zero for an empty dashboard.
    pub fn share(&self, of: usize) -> f64 {
        if of == 0 {
            0.0
        } else {
            self.total as f64 * 100.0 / of as f64
        }
    }

    pub fn subgroup(&self, status: &str) -> Option<&SubGroup> {
        let status = normalize_status(status);
        self.subgroups.iter().find(|s| s.status == status)
    }

    fn add(&mut self, status: &str, money: Money) {
        self.total += 1;
        self.money += money;
        match self.subgroups.iter_mut().find(|s| s.status == status) {
            Some(sub) => {
                sub.count += 1;
                sub.money += money;
            }
            None => {
                self.subgroups.push(SubGroup {
                    status: status.to_string(),
                    count: 1,
                    money,
                });
                self.subgroups.sort_by_key(|s| status_rank(&s.status));
            }
        }
    }
}

/// Status dashboard tree. All four buckets are always present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub total: usize,
    pub total_money: Money,
    groups: BTreeMap<StatusGroup, GroupNode>,
    /// Requests left out because their status was missing or unknown.
    pub skipped: usize,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self {
            total: 0,
            total_money: Money::ZERO,
            groups: StatusGroup::ALL
                .into_iter()
                .map(|g| (g, GroupNode::empty(g)))
                .collect(),
            skipped: 0,
        }
    }
}

impl Dashboard {
    pub fn aggregate(requests: &[DeliveryRequest]) -> Self {
        let mut dashboard = Self::default();

        for request in requests {
            let Some(raw) = request.status.as_deref() else {
                debug!(
                    "Request {} has no status, left out of dashboard",
                    request.id
                );
                dashboard.skipped += 1;
                continue;
            };
            let Some(group) = StatusGroup::for_status(raw) else {
                warn!("Request {} has unknown status '{}'", request.id, raw);
                dashboard.skipped += 1;
                continue;
            };

            dashboard.total += 1;
            dashboard.total_money += request.cost;
            if let Some(node) = dashboard.groups.get_mut(&group) {
                node.add(normalize_status(raw), request.cost);
            }
        }

        debug!(
            "Dashboard aggregated: total={} skipped={} money={}",
            dashboard.total, dashboard.skipped, dashboard.total_money
        );
        dashboard
    }

    /// Refresh-in-place: rows from `fresh` replace rows with the same id in
    /// `previous` before counting.
    pub fn aggregate_merged(fresh: &[DeliveryRequest], previous: &[DeliveryRequest]) -> Self {
        Self::aggregate(&merge_requests(fresh, previous))
    }

    pub fn group(&self, key: StatusGroup) -> &GroupNode {
        // Every key is inserted by Default and the map is never exposed mutably.
        &self.groups[&key]
    }

    /// All four groups in display order, empty ones included.
    pub fn groups(&self) -> impl Iterator<Item = &GroupNode> {
        self.groups.values()
    }

    /// Groups that currently have requests, in display order. Used to enable
    /// filter chips; empty groups stay in `groups` as disabled placeholders.
    pub fn filter_keys(&self) -> Vec<StatusGroup> {
        self.groups
            .values()
            .filter(|g| g.total > 0)
            .map(|g| g.key)
            .collect()
    }
}

/// De-duplicates by id, `fresh` winning. Fresh rows keep their order; rows
/// only present in `previous` follow in theirs.
pub fn merge_requests(
    fresh: &[DeliveryRequest],
    previous: &[DeliveryRequest],
) -> Vec<DeliveryRequest> {
    let mut seen: HashSet<RequestId> = HashSet::with_capacity(fresh.len() + previous.len());
    let mut merged = Vec::with_capacity(fresh.len() + previous.len());

    for request in fresh.iter().chain(previous) {
        if seen.insert(request.id) {
            merged.push(request.clone());
        }
    }
    merged
}
