// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::listing::SortSpec;
use crate::status::StatusGroup;
use anyhow::{Context, Result};
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Key-value store for durable UI preferences. Keys are page-scoped by the
/// caller (`"<page>.<name>"`).
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&mut self, key: &str, value: Value) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryPreferences {
    values: BTreeMap<String, Value>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// Preferences kept in a single JSON object on disk, rewritten on each change.
#[derive(Debug, Clone)]
pub struct JsonFilePreferences {
    path: PathBuf,
    values: BTreeMap<String, Value>,
}

impl JsonFilePreferences {
    pub fn default_path() -> PathBuf {
        crate::get_config_root().join("preferences.json")
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Ok(Self {
                path,
                values: BTreeMap::new(),
            });
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let values = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).context("Failed to create preferences directory")?;
            }
        }

        let content = serde_json::to_string_pretty(&self.values)
            .context("Failed to serialize preferences")?;

        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }
}

impl PreferenceStore for JsonFilePreferences {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        self.values.insert(key.to_string(), value);
        self.save()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.values.remove(key).is_some() {
            self.save()?;
        }
        Ok(())
    }
}

/// Table preferences that survive sessions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewPreferences {
    pub sort: SortSpec,
    pub filter: Option<StatusGroup>,
    #[serde(default)]
    pub selected_filters: Vec<String>,
}

fn read<T: DeserializeOwned>(store: &dyn PreferenceStore, key: &str) -> Option<T> {
    let value = store.get(key)?;
    match serde_json::from_value(value) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("Ignoring unreadable preference '{}': {}", key, e);
            None
        }
    }
}

impl ViewPreferences {
    pub fn load(store: &dyn PreferenceStore, page: &str) -> Self {
        Self {
            sort: read(store, &format!("{}.sort", page)).unwrap_or_default(),
            filter: read(store, &format!("{}.filter", page)),
            selected_filters: read(store, &format!("{}.selected_filters", page))
                .unwrap_or_default(),
        }
    }

    pub fn save(&self, store: &mut dyn PreferenceStore, page: &str) -> Result<()> {
        store.set(&format!("{}.sort", page), serde_json::to_value(self.sort)?)?;

        let filter_key = format!("{}.filter", page);
        match self.filter {
            Some(group) => store.set(&filter_key, serde_json::to_value(group)?)?,
            None => store.remove(&filter_key)?,
        }

        store.set(
            &format!("{}.selected_filters", page),
            serde_json::to_value(&self.selected_filters)?,
        )?;

        info!(
            "Saved view preferences: page={} sort={}:{:?} filter={:?}",
            page, self.sort.key, self.sort.direction, self.filter
        );
        Ok(())
    }
}
