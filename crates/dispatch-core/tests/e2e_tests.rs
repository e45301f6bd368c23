// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use dispatch_core::money::Money;
use dispatch_core::preferences::{MemoryPreferences, ViewPreferences};
use dispatch_core::selection::{Emphasis, Selection};
use dispatch_core::source::{DataSource, FileDataSource};
use dispatch_core::status::StatusGroup;
use dispatch_core::store::{Action, ConsoleStore};
use dispatch_core::viewport::{DIMMED_MARKER, HIGHLIGHTED_MARKER};
use std::fs::File;
use std::io::Write;
use tempfile::TempDir;

fn create_snapshot_file(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("map_data.json");
    let mut file = File::create(&path).unwrap();
    write!(
        file,
        r#"{{
            "requests": [
                {{"id": 11, "status": "new", "cost": "1200.50", "date": "10.01.2024",
                  "workers": [3],
                  "items": [{{"location": {{"lat": 55.751, "lon": 37.618}}, "address": "Tverskaya 1", "interval": "10:00-12:00"}}]}},
                {{"id": 12, "status": "finished", "cost": 300, "date": "02.03.2024",
                  "items": [{{"lat": 55.70, "lon": 37.50, "address": "Leninsky 30"}}]}},
                {{"id": 13, "status": "partly_arrival_submitted", "cost": "oops",
                  "items": [{{"lat": 0, "lon": 0}}]}},
                {{"id": 14, "status": "no_response", "items": [{{"lat": 48.85, "lon": 2.35}}]}},
                {{"status": "new"}}
            ],
            "workers": [
                {{"id": 3, "name": "Anna", "location": {{"lat": 55.76, "lon": 37.64}}, "requests": []}},
                {{"id": 4, "name": "Oleg", "requests": [12]}}
            ],
            "bounding_box": {{"south": 55.5, "north": 56.0, "west": 37.3, "east": 37.9}},
            "timestamp": "2024-03-02T08:30:00Z"
        }}"#
    )
    .unwrap();
    path
}

#[test]
fn test_e2e_snapshot_to_console() {
    let _ =
        simplelog::TestLogger::init(simplelog::LevelFilter::Debug, simplelog::Config::default());

    let dir = TempDir::new().unwrap();
    let source = FileDataSource::new(create_snapshot_file(&dir));

    // 1. Load preferences and build the store
    let prefs_store = MemoryPreferences::new();
    let prefs = ViewPreferences::load(&prefs_store, "map");
    let mut store = ConsoleStore::new(&prefs);

    // 2. Refresh from the source
    let ticket = store.begin_refresh();
    let snapshot = source.fetch_snapshot().expect("Failed to read snapshot");
    assert_eq!(snapshot.requests.len(), 4, "record without id is dropped");
    let update = store.apply_snapshot(&ticket, snapshot);
    assert!(update.changed);
    assert!(store.data_timestamp().is_some());

    // 3. Dashboard
    let dashboard = store.dashboard();
    assert_eq!(dashboard.total, 4);
    assert_eq!(dashboard.total_money, Money::from_minor(150_050));
    assert_eq!(dashboard.group(StatusGroup::InWork).total, 2);
    assert!(dashboard
        .group(StatusGroup::InWork)
        .subgroup("partly_arrived")
        .is_some());

    // 4. Initial frame ignores the far-away point
    let frame = update.recenter.expect("initial frame");
    assert!(frame.contains(55.751, 37.618));
    assert!(frame.contains(55.76, 37.64));
    assert!(!frame.contains(48.85, 2.35));

    // 5. Select the courier; request 11 lists them, so it lights up
    let update = store.dispatch(Action::SelectWorker(3));
    assert!(update.changed);
    assert_eq!(store.selection(), Selection::Worker(3));
    let markers = store.request_markers();
    let m11 = markers.iter().find(|m| m.id == 11).unwrap();
    let m12 = markers.iter().find(|m| m.id == 12).unwrap();
    assert_eq!(m11.emphasis, Emphasis::Related);
    assert_eq!(m11.style, HIGHLIGHTED_MARKER);
    assert_eq!(m12.style, DIMMED_MARKER);
    // The 0,0 placeholder never becomes a marker.
    assert!(markers.iter().all(|m| m.id != 13));

    // 6. Filter the table
    store.dispatch(Action::SetFilter(Some(StatusGroup::InWork)));
    let ids: Vec<i64> = store.visible_requests().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![12, 13]);

    // 7. Search runs over the same file
    let hits = source.search_requests("lenin", None).unwrap();
    assert_eq!(hits.results.len(), 1);
    assert_eq!(hits.results[0].id, 12);
}
