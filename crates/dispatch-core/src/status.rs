// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::DispatchError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Raw status reported by the courier app when a partial arrival is submitted.
/// It is counted and filtered as `partly_arrived` but kept verbatim on the request.
pub const PARTLY_ARRIVAL_SUBMITTED: &str = "partly_arrival_submitted";
pub const PARTLY_ARRIVED: &str = "partly_arrived";

/// Dashboard bucket. Declaration order is display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusGroup {
    Preprocessing,
    InWork,
    NoContact,
    Cancelled,
}

impl StatusGroup {
    pub const ALL: [StatusGroup; 4] = [
        StatusGroup::Preprocessing,
        StatusGroup::InWork,
        StatusGroup::NoContact,
        StatusGroup::Cancelled,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            StatusGroup::Preprocessing => "preprocessing",
            StatusGroup::InWork => "in_work",
            StatusGroup::NoContact => "no_contact",
            StatusGroup::Cancelled => "cancelled",
        }
    }

    /// Classifies a raw status. Aliases are normalized first; unknown
    /// statuses have no group.
    pub fn for_status(raw: &str) -> Option<StatusGroup> {
        match normalize_status(raw) {
            "new" | "autotarification_attempt" | "partly_confirmed" | "timepoint_confirmed" => {
                Some(StatusGroup::Preprocessing)
            }
            "finished" | "partly_arrived" | "photo_attached" => Some(StatusGroup::InWork),
            "no_response" | "driver_callback" => Some(StatusGroup::NoContact),
            "cancelled" | "removed" | "failed" | "declined" | "cancelled_with_payment" => {
                Some(StatusGroup::Cancelled)
            }
            _ => None,
        }
    }
}

impl fmt::Display for StatusGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.key())
    }
}

impl FromStr for StatusGroup {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        StatusGroup::ALL
            .into_iter()
            .find(|g| g.key() == wanted)
            .ok_or_else(|| DispatchError::UnknownGroup(s.to_string()))
    }
}

pub fn normalize_status(raw: &str) -> &str {
    if raw == PARTLY_ARRIVAL_SUBMITTED {
        PARTLY_ARRIVED
    } else {
        raw
    }
}

// Lifecycle order, earliest first.
const STATUS_ORDER: [&str; 14] = [
    "new",
    "autotarification_attempt",
    "partly_confirmed",
    "timepoint_confirmed",
    "no_response",
    "driver_callback",
    "partly_arrived",
    "photo_attached",
    "finished",
    "cancelled_with_payment",
    "cancelled",
    "declined",
    "failed",
    "removed",
];

/// Sort rank of a raw status. Unknown statuses rank after every known one.
pub fn status_rank(raw: &str) -> u32 {
    let normalized = normalize_status(raw);
    STATUS_ORDER
        .iter()
        .position(|s| *s == normalized)
        .map(|i| i as u32)
        .unwrap_or(STATUS_ORDER.len() as u32)
}
