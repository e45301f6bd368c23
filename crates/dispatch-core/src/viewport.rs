// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::model::{DeliveryRequest, Location, Worker};
use crate::selection::{Emphasis, Selection, SelectionModel};
use crate::status::StatusGroup;
use log::debug;
use serde::{Deserialize, Serialize};

/// Points further than this from the centre of the region hint are treated as
/// bad fixes when nothing is selected.
pub const OUTLIER_THRESHOLD_DEG: f64 = 1.3;
/// Smallest span (per axis) the map is allowed to frame.
pub const MIN_SPAN_DEG: f64 = 0.03;
pub const PAD_DEG: f64 = 0.01;
const SPAN_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    #[serde(alias = "south")]
    pub min_lat: f64,
    #[serde(alias = "north")]
    pub max_lat: f64,
    #[serde(alias = "west")]
    pub min_lon: f64,
    #[serde(alias = "east")]
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn new(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        }
    }

    pub fn around(point: &Location) -> Self {
        Self::new(point.lat, point.lat, point.lon, point.lon)
    }

    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Location>,
    {
        points
            .into_iter()
            .fold(None, |acc: Option<BoundingBox>, p| {
                Some(match acc {
                    Some(b) => b.extend(p),
                    None => BoundingBox::around(p),
                })
            })
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }

    pub fn is_valid(&self) -> bool {
        [self.min_lat, self.max_lat, self.min_lon, self.max_lon]
            .iter()
            .all(|v| v.is_finite())
            && self.min_lat <= self.max_lat
            && self.min_lon <= self.max_lon
    }

    pub fn extend(self, point: &Location) -> Self {
        Self {
            min_lat: self.min_lat.min(point.lat),
            max_lat: self.max_lat.max(point.lat),
            min_lon: self.min_lon.min(point.lon),
            max_lon: self.max_lon.max(point.lon),
        }
    }

    pub fn lat_span(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn lon_span(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    /// (lat, lon)
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }

    /// Pads a box that would frame at an unusable zoom level. If either axis
    /// is under `MIN_SPAN_DEG`, both axes grow by `PAD_DEG` per side, or by
    /// more where that is still not enough to reach the minimum.
    pub fn ensure_min_span(self) -> Self {
        if self.lat_span() >= MIN_SPAN_DEG && self.lon_span() >= MIN_SPAN_DEG {
            return self;
        }
        let lat_pad = pad_for(self.lat_span());
        let lon_pad = pad_for(self.lon_span());
        Self {
            min_lat: self.min_lat - lat_pad,
            max_lat: self.max_lat + lat_pad,
            min_lon: self.min_lon - lon_pad,
            max_lon: self.max_lon + lon_pad,
        }
    }
}

fn pad_for(span: f64) -> f64 {
    PAD_DEG.max((MIN_SPAN_DEG - span) / 2.0 + SPAN_EPSILON)
}

fn is_outlier(point: &Location, centroid: (f64, f64)) -> bool {
    (point.lat - centroid.0).abs() > OUTLIER_THRESHOLD_DEG
        || (point.lon - centroid.1).abs() > OUTLIER_THRESHOLD_DEG
}

/// Locations that should drive the map frame for the current selection.
///
/// With a selection, the selected entity and everything related to it count.
/// Without one, every plotted point counts except those far from the region
/// hint.
pub fn relevant_points(
    selection: &SelectionModel,
    requests: &[DeliveryRequest],
    workers: &[Worker],
    hint: Option<&BoundingBox>,
) -> Vec<Location> {
    let mut points = Vec::new();

    if selection.is_empty() {
        let centroid = hint.map(BoundingBox::center);
        let all = workers
            .iter()
            .filter_map(|w| w.location)
            .chain(requests.iter().flat_map(|r| r.item_locations()));
        let mut dropped = 0usize;
        for point in all {
            match centroid {
                Some(c) if is_outlier(&point, c) => dropped += 1,
                _ => points.push(point),
            }
        }
        if dropped > 0 {
            debug!("Viewport ignored {} outlying points", dropped);
        }
        return points;
    }

    for worker in workers {
        if selection
            .emphasis_of_worker(worker, requests)
            .is_highlighted()
        {
            points.extend(worker.location);
        }
    }
    for request in requests {
        if selection
            .emphasis_of_request(request, workers)
            .is_highlighted()
        {
            points.extend(request.item_locations());
        }
    }
    points
}

/// Fits the map frame. Falls back to the region hint when nothing relevant
/// can be plotted; `None` only when there is neither.
pub fn fit_viewport(
    selection: &SelectionModel,
    requests: &[DeliveryRequest],
    workers: &[Worker],
    hint: Option<&BoundingBox>,
) -> Option<BoundingBox> {
    let points = relevant_points(selection, requests, workers, hint);
    BoundingBox::from_points(&points)
        .or_else(|| hint.copied())
        .map(BoundingBox::ensure_min_span)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MarkerStyle {
    pub icon_size: u32,
    pub tooltip_opacity: f32,
}

pub const HIGHLIGHTED_MARKER: MarkerStyle = MarkerStyle {
    icon_size: 48,
    tooltip_opacity: 1.0,
};
pub const DIMMED_MARKER: MarkerStyle = MarkerStyle {
    icon_size: 24,
    tooltip_opacity: 0.35,
};
pub const DEFAULT_MARKER: MarkerStyle = MarkerStyle {
    icon_size: 36,
    tooltip_opacity: 0.85,
};

impl MarkerStyle {
    pub fn for_entity(related: bool, any_selected: bool) -> Self {
        match (any_selected, related) {
            (false, _) => DEFAULT_MARKER,
            (true, true) => HIGHLIGHTED_MARKER,
            (true, false) => DIMMED_MARKER,
        }
    }
}

impl From<Emphasis> for MarkerStyle {
    fn from(emphasis: Emphasis) -> Self {
        match emphasis {
            Emphasis::Neutral => DEFAULT_MARKER,
            Emphasis::Selected | Emphasis::Related => HIGHLIGHTED_MARKER,
            Emphasis::Dimmed => DIMMED_MARKER,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportKey {
    pub revision: u64,
    pub selection: Selection,
    pub filter: Option<StatusGroup>,
}

/// Remembers the last frame so the map is only re-centred when it moves.
#[derive(Debug, Clone, Default)]
pub struct ViewportTracker {
    key: Option<ViewportKey>,
    current: Option<BoundingBox>,
}

impl ViewportTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<BoundingBox> {
        self.current
    }

    /// Returns the box to re-centre on, or `None` when the frame is unchanged.
    /// `compute` only runs when the key differs from the last one.
    pub fn update<F>(&mut self, key: ViewportKey, compute: F) -> Option<BoundingBox>
    where
        F: FnOnce() -> Option<BoundingBox>,
    {
        if self.key == Some(key) {
            return None;
        }
        self.key = Some(key);

        let next = compute();
        if next == self.current {
            return None;
        }
        self.current = next;
        next
    }

    pub fn reset(&mut self) {
        self.key = None;
        self.current = None;
    }
}
