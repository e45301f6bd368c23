// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

pub mod dashboard;
pub mod labels;
pub mod listing;
pub mod model;
pub mod money;
pub mod preferences;
pub mod refresh;
pub mod selection;
pub mod source;
pub mod status;
pub mod store;
pub mod throttle;
pub mod viewport;

use std::path::PathBuf;
use thiserror::Error;

pub use dashboard::Dashboard;
pub use listing::{visible_requests, SortDirection, SortKey, SortSpec};
pub use model::{DeliveryRequest, Item, Location, RequestId, Snapshot, Worker, WorkerId};
pub use money::Money;
pub use selection::{Emphasis, Selection, SelectionModel};
pub use status::StatusGroup;
pub use store::ConsoleStore;
pub use viewport::BoundingBox;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Unknown status group: {0}")]
    UnknownGroup(String),
    #[error("Unknown sort key: {0}")]
    UnknownSortKey(String),
    #[error("Unknown sort direction: {0}")]
    UnknownDirection(String),
    #[error("Malformed snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Directory holding persisted console preferences.
///
/// `DISPATCH_CONFIG_DIR` wins over the platform config directory so tests and
/// kiosk deployments can pin it.
pub fn get_config_root() -> PathBuf {
    if let Ok(dir) = std::env::var("DISPATCH_CONFIG_DIR") {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }

    directories::ProjectDirs::from("org", "dispatch", "Dispatch Console")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".dispatch"))
}
