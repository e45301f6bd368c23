// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::model::DeliveryRequest;
use crate::status::{status_rank, StatusGroup};
use crate::DispatchError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Id,
    Date,
    Interval,
    /// Item count, a rough stand-in for route complexity.
    Route,
    Status,
    Cost,
}

impl SortKey {
    pub const ALL: [SortKey; 6] = [
        SortKey::Id,
        SortKey::Date,
        SortKey::Interval,
        SortKey::Route,
        SortKey::Status,
        SortKey::Cost,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            SortKey::Id => "id",
            SortKey::Date => "date",
            SortKey::Interval => "interval",
            SortKey::Route => "route",
            SortKey::Status => "status",
            SortKey::Cost => "cost",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.key())
    }
}

impl FromStr for SortKey {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        SortKey::ALL
            .into_iter()
            .find(|k| k.key() == wanted)
            .ok_or_else(|| DispatchError::UnknownSortKey(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

impl FromStr for SortDirection {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Asc),
            "desc" | "descending" => Ok(SortDirection::Desc),
            _ => Err(DispatchError::UnknownDirection(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// Column header click: same column flips, a new column starts ascending.
    pub fn toggle(self, key: SortKey) -> Self {
        if self.key == key {
            Self::new(key, self.direction.flipped())
        } else {
            Self::new(key, SortDirection::Asc)
        }
    }
}

pub fn matches_filter(request: &DeliveryRequest, filter: Option<StatusGroup>) -> bool {
    match filter {
        None => true,
        Some(group) => request
            .status
            .as_deref()
            .and_then(StatusGroup::for_status)
            .is_some_and(|g| g == group),
    }
}

// Missing values go last regardless of direction.
fn cmp_present<T: Ord>(a: Option<T>, b: Option<T>, direction: SortDirection) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => match direction {
            SortDirection::Asc => a.cmp(&b),
            SortDirection::Desc => b.cmp(&a),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare(a: &DeliveryRequest, b: &DeliveryRequest, spec: &SortSpec) -> Ordering {
    let dir = spec.direction;
    let primary = match spec.key {
        SortKey::Id => cmp_present(Some(a.id), Some(b.id), dir),
        SortKey::Date => cmp_present(a.date, b.date, dir),
        SortKey::Interval => cmp_present(a.first_interval(), b.first_interval(), dir),
        SortKey::Route => cmp_present(Some(a.items.len()), Some(b.items.len()), dir),
        SortKey::Status => cmp_present(
            a.status.as_deref().map(status_rank),
            b.status.as_deref().map(status_rank),
            dir,
        ),
        SortKey::Cost => cmp_present(Some(a.cost), Some(b.cost), dir),
    };
    // Deterministic tie-break so equal keys never shuffle between refreshes.
    primary.then_with(|| a.id.cmp(&b.id))
}

/// The table's rows: filtered by status group, then ordered. The input list is
/// left untouched.
pub fn visible_requests(
    requests: &[DeliveryRequest],
    spec: &SortSpec,
    filter: Option<StatusGroup>,
) -> Vec<DeliveryRequest> {
    let mut visible: Vec<DeliveryRequest> = requests
        .iter()
        .filter(|r| matches_filter(r, filter))
        .cloned()
        .collect();
    visible.sort_by(|a, b| compare(a, b, spec));
    visible
}
