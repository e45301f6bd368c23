// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Typed records for the live view.
//!
//! The backend delivers loosely shaped JSON: ids as numbers or strings, costs
//! as numbers, strings or nothing, coordinates that are sometimes `0,0` when a
//! courier never reported a position. Everything is normalized here, once, so
//! the aggregation and map code can trust the types.

use crate::money::Money;
use crate::viewport::BoundingBox;
use crate::DispatchError;
use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, warn};
use serde::Serialize;
use serde_json::{Map, Value};

pub type RequestId = i64;
pub type WorkerId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
    pub timestamp: Option<DateTime<Utc>>,
}

impl Location {
    /// Returns `None` for coordinates that cannot be plotted: non-finite,
    /// out of range, or the `(0, 0)` placeholder the backend uses for "unset".
    pub fn new(lat: f64, lon: f64) -> Option<Self> {
        if !lat.is_finite() || !lon.is_finite() {
            return None;
        }
        if lat.abs() > 90.0 || lon.abs() > 180.0 {
            return None;
        }
        if lat == 0.0 && lon == 0.0 {
            return None;
        }
        Some(Self {
            lat,
            lon,
            timestamp: None,
        })
    }

    pub fn with_timestamp(mut self, timestamp: Option<DateTime<Utc>>) -> Self {
        self.timestamp = timestamp;
        self
    }

    fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let lat = number_field(obj, &["lat", "latitude"])?;
        let lon = number_field(obj, &["lon", "lng", "longitude"])?;
        let timestamp = obj.get("timestamp").and_then(parse_timestamp);
        Location::new(lat, lon).map(|l| l.with_timestamp(timestamp))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Item {
    pub location: Option<Location>,
    pub status: Option<String>,
    pub interval: Option<String>,
    pub address: Option<String>,
}

impl Item {
    fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        // Items carry their point either nested or flat on the item itself.
        let location = obj
            .get("location")
            .and_then(Location::from_value)
            .or_else(|| Location::from_value(value));

        Some(Self {
            location,
            status: string_field(obj, &["status"]),
            interval: string_field(obj, &["interval", "time_interval"]),
            address: string_field(obj, &["address"]),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryRequest {
    pub id: RequestId,
    pub items: Vec<Item>,
    /// Raw status id. `None` marks a malformed record.
    pub status: Option<String>,
    pub date: Option<NaiveDate>,
    pub cost: Money,
    pub workers: Vec<WorkerId>,
}

impl DeliveryRequest {
    pub fn new(id: RequestId, status: &str) -> Self {
        Self {
            id,
            items: Vec::new(),
            status: Some(status.to_string()),
            date: None,
            cost: Money::ZERO,
            workers: Vec::new(),
        }
    }

    /// Builds a request from a wire record. Returns `None` when the record
    /// has no usable identifier.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let id = id_field(obj.get("id")?)?;

        let items = obj
            .get("items")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Item::from_value).collect())
            .unwrap_or_default();

        let cost = ["cost", "cost_estimate", "price"]
            .iter()
            .find_map(|k| obj.get(*k))
            .map(Money::from_value)
            .unwrap_or_default();

        Some(Self {
            id,
            items,
            status: string_field(obj, &["status"]),
            date: obj.get("date").and_then(Value::as_str).and_then(parse_date),
            cost,
            workers: id_list(obj.get("workers")),
        })
    }

    pub fn first_interval(&self) -> Option<&str> {
        self.items.first().and_then(|i| i.interval.as_deref())
    }

    pub fn item_locations(&self) -> impl Iterator<Item = Location> + '_ {
        self.items.iter().filter_map(|i| i.location)
    }

    pub fn has_worker(&self, worker: WorkerId) -> bool {
        self.workers.contains(&worker)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Worker {
    pub id: WorkerId,
    pub name: String,
    pub phone: Option<String>,
    pub location: Option<Location>,
    pub requests: Vec<RequestId>,
}

impl Worker {
    pub fn new(id: WorkerId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            phone: None,
            location: None,
            requests: Vec::new(),
        }
    }

    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let id = id_field(obj.get("id")?)?;

        Some(Self {
            id,
            name: string_field(obj, &["name", "display_name"]).unwrap_or_default(),
            phone: string_field(obj, &["phone"]),
            location: obj.get("location").and_then(Location::from_value),
            requests: id_list(obj.get("requests")),
        })
    }

    pub fn has_request(&self, request: RequestId) -> bool {
        self.requests.contains(&request)
    }
}

/// One full refresh from the data source.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Snapshot {
    pub requests: Vec<DeliveryRequest>,
    pub workers: Vec<Worker>,
    pub bounding_box: Option<BoundingBox>,
    /// Polygons as `[lat, lon]` rings, passed through for rendering.
    pub city_borders: Vec<Vec<[f64; 2]>>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub fn from_json(content: &str) -> Result<Self, DispatchError> {
        let value: Value = serde_json::from_str(content)?;
        Ok(Self::from_value(&value))
    }

    /// Best-effort conversion: bad records are dropped one by one, the rest
    /// of the snapshot survives.
    pub fn from_value(value: &Value) -> Self {
        let requests = records(value, "requests", DeliveryRequest::from_value);
        let workers = records(value, "workers", Worker::from_value);

        let bounding_box = value
            .get("bounding_box")
            .filter(|v| !v.is_null())
            .and_then(|v| match serde_json::from_value::<BoundingBox>(v.clone()) {
                Ok(b) if b.is_valid() => Some(b),
                Ok(_) => {
                    warn!("Ignoring inverted bounding_box in snapshot");
                    None
                }
                Err(e) => {
                    warn!("Ignoring unreadable bounding_box in snapshot: {}", e);
                    None
                }
            });

        let city_borders = value
            .get("city_borders")
            .and_then(Value::as_array)
            .map(|rings| rings.iter().filter_map(parse_ring).collect())
            .unwrap_or_default();

        Self {
            requests,
            workers,
            bounding_box,
            city_borders,
            timestamp: value.get("timestamp").and_then(parse_timestamp),
        }
    }
}

fn records<T>(value: &Value, key: &str, parse: fn(&Value) -> Option<T>) -> Vec<T> {
    let Some(list) = value.get(key).and_then(Value::as_array) else {
        debug!("Snapshot has no '{}' array", key);
        return Vec::new();
    };

    let mut out = Vec::with_capacity(list.len());
    for (idx, raw) in list.iter().enumerate() {
        match parse(raw) {
            Some(record) => out.push(record),
            None => warn!("Skipping malformed {} record at index {}", key, idx),
        }
    }
    out
}

fn parse_ring(value: &Value) -> Option<Vec<[f64; 2]>> {
    let points = value.as_array()?;
    Some(
        points
            .iter()
            .filter_map(|p| {
                let pair = p.as_array()?;
                let lat = pair.first().and_then(number_value)?;
                let lon = pair.get(1).and_then(number_value)?;
                Some([lat, lon])
            })
            .collect(),
    )
}

/// Calendar date in either of the backend's formats.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    // Timestamps like "2024-01-10T09:00:00" only contribute their date part.
    let head = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(head, "%d.%m.%Y")
        .or_else(|_| NaiveDate::parse_from_str(head, "%Y-%m-%d"))
        .ok()
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n
            .as_i64()
            .and_then(|secs| DateTime::from_timestamp(secs, 0)),
        _ => None,
    }
}

fn number_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| !c.is_whitespace())
                .map(|c| if c == ',' { '.' } else { c })
                .collect();
            cleaned.parse::<f64>().ok()
        }
        _ => None,
    }
}

fn number_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|k| obj.get(*k)).and_then(number_value)
}

fn string_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| match obj.get(*k) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn id_field(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Accepts `[1, 2]`, `["1", "2"]` and `[{"id": 1}, ...]`.
fn id_list(value: Option<&Value>) -> Vec<i64> {
    value
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(|v| match v {
                    Value::Object(obj) => obj.get("id").and_then(id_field),
                    other => id_field(other),
                })
                .collect()
        })
        .unwrap_or_default()
}
