// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Human-readable titles for raw status ids, supplied by the surrounding app.
#[derive(Debug, Clone, Default)]
pub struct StatusLabels {
    titles: HashMap<String, String>,
}

impl StatusLabels {
    pub fn new(titles: HashMap<String, String>) -> Self {
        Self { titles }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let titles = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Self { titles })
    }

    /// Falls back to the raw id so unknown statuses still render.
    pub fn title<'a>(&'a self, status: &'a str) -> &'a str {
        self.titles
            .get(status)
            .map(String::as_str)
            .unwrap_or(status)
    }
}
