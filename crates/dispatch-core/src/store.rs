// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! State container for the live map and dashboard.
//!
//! The view layer owns one `ConsoleStore`, feeds it actions and fetch results,
//! and reads derived state back. Derived state (dashboard, visible rows,
//! viewport) is rebuilt wholesale after each transition, never patched.

use crate::dashboard::{merge_requests, Dashboard};
use crate::listing::{visible_requests, SortSpec};
use crate::model::{DeliveryRequest, RequestId, Snapshot, Worker, WorkerId};
use crate::preferences::ViewPreferences;
use crate::refresh::{RefreshTicket, RefreshTracker};
use crate::selection::{Emphasis, Selection, SelectionModel};
use crate::status::StatusGroup;
use crate::throttle::TrailingThrottle;
use crate::viewport::{fit_viewport, BoundingBox, MarkerStyle, ViewportKey, ViewportTracker};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::time::Instant;

pub const MAP_RESOURCE: &str = "map";

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SelectWorker(WorkerId),
    SelectRequest(RequestId),
    /// Click on empty map canvas.
    ClearSelection,
    /// Request picked by the search box or table.
    ExternalRequest(Option<RequestId>),
    SetFilter(Option<StatusGroup>),
    SetSorting(SortSpec),
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StoreUpdate {
    pub changed: bool,
    /// New frame to move the map to, if it moved.
    pub recenter: Option<BoundingBox>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker<Id> {
    pub id: Id,
    pub emphasis: Emphasis,
    pub style: MarkerStyle,
}

#[derive(Debug)]
pub struct ConsoleStore {
    requests: Vec<DeliveryRequest>,
    workers: Vec<Worker>,
    hint: Option<BoundingBox>,
    city_borders: Vec<Vec<[f64; 2]>>,
    timestamp: Option<DateTime<Utc>>,
    revision: u64,

    selection: SelectionModel,
    sort: SortSpec,
    filter: Option<StatusGroup>,

    dashboard: Dashboard,
    visible: Vec<DeliveryRequest>,
    viewport: ViewportTracker,

    refresh: RefreshTracker,
    loading: bool,
    search: TrailingThrottle<String>,
}

impl Default for ConsoleStore {
    fn default() -> Self {
        Self::new(&ViewPreferences::default())
    }
}

impl ConsoleStore {
    pub fn new(prefs: &ViewPreferences) -> Self {
        Self {
            requests: Vec::new(),
            workers: Vec::new(),
            hint: None,
            city_borders: Vec::new(),
            timestamp: None,
            revision: 0,
            selection: SelectionModel::new(),
            sort: prefs.sort,
            filter: prefs.filter,
            dashboard: Dashboard::default(),
            visible: Vec::new(),
            viewport: ViewportTracker::new(),
            refresh: RefreshTracker::new(),
            loading: false,
            search: TrailingThrottle::default(),
        }
    }

    // --- Fetch lifecycle ---

    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.loading = true;
        self.refresh.begin(MAP_RESOURCE)
    }

    /// Replaces the dataset. Returns `false` (and changes nothing) when a
    /// newer refresh has been dispatched since `ticket`.
    pub fn apply_snapshot(&mut self, ticket: &RefreshTicket, snapshot: Snapshot) -> StoreUpdate {
        if !self.refresh.accept(ticket) {
            return StoreUpdate::default();
        }

        info!(
            "Applying snapshot #{}: requests={} workers={}",
            ticket.seq,
            snapshot.requests.len(),
            snapshot.workers.len()
        );

        self.requests = snapshot.requests;
        self.workers = snapshot.workers;
        if snapshot.bounding_box.is_some() {
            self.hint = snapshot.bounding_box;
        }
        self.city_borders = snapshot.city_borders;
        self.timestamp = snapshot.timestamp;
        self.loading = false;

        self.selection.reset();
        self.viewport.reset();
        self.revision += 1;
        self.rebuild_all()
    }

    /// Refresh-in-place for a subset of rows. The selection survives.
    pub fn apply_partial(
        &mut self,
        ticket: &RefreshTicket,
        requests: Vec<DeliveryRequest>,
    ) -> StoreUpdate {
        if !self.refresh.accept(ticket) {
            return StoreUpdate::default();
        }

        debug!("Merging {} refreshed rows", requests.len());
        self.requests = merge_requests(&requests, &self.requests);
        self.loading = false;
        self.revision += 1;
        self.rebuild_all()
    }

    /// The stale view stays; only the loading indicator is cleared, and only
    /// when no newer fetch is still running.
    pub fn refresh_failed(&mut self, ticket: &RefreshTicket, reason: &str) {
        warn!(
            "Refresh #{} for '{}' failed, keeping previous data: {}",
            ticket.seq, ticket.resource, reason
        );
        if self.refresh.is_latest(ticket) {
            self.loading = false;
        }
    }

    // --- User actions ---

    pub fn dispatch(&mut self, action: Action) -> StoreUpdate {
        debug!("dispatch {:?}", action);
        match action {
            Action::SelectWorker(id) => {
                let changed = self.selection.select_worker(id);
                self.after_selection(changed)
            }
            Action::SelectRequest(id) => {
                let changed = self.selection.select_request(id);
                self.after_selection(changed)
            }
            Action::ClearSelection => {
                let changed = self.selection.clear();
                self.after_selection(changed)
            }
            Action::ExternalRequest(id) => {
                let changed = self.selection.sync_external(id);
                self.after_selection(changed)
            }
            Action::SetFilter(filter) => {
                if self.filter == filter {
                    return StoreUpdate::default();
                }
                self.filter = filter;
                self.rebuild_view()
            }
            Action::SetSorting(spec) => {
                if self.sort == spec {
                    return StoreUpdate::default();
                }
                self.sort = spec;
                // Order does not affect the frame.
                self.visible = visible_requests(&self.requests, &self.sort, self.filter);
                StoreUpdate {
                    changed: true,
                    recenter: None,
                }
            }
        }
    }

    pub fn set_filter(&mut self, filter: Option<StatusGroup>) -> StoreUpdate {
        self.dispatch(Action::SetFilter(filter))
    }

    pub fn set_sorting(&mut self, spec: SortSpec) -> StoreUpdate {
        self.dispatch(Action::SetSorting(spec))
    }

    /// Search box keystroke. The query reaches `take_search` once typing
    /// pauses.
    pub fn input_search(&mut self, text: &str, now: Instant) {
        self.search.push(text.to_string(), now);
    }

    pub fn take_search(&mut self, now: Instant) -> Option<String> {
        self.search.poll(now)
    }

    // --- Derived state ---

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    pub fn visible_requests(&self) -> &[DeliveryRequest] {
        &self.visible
    }

    pub fn requests(&self) -> &[DeliveryRequest] {
        &self.requests
    }

    pub fn workers(&self) -> &[Worker] {
        &self.workers
    }

    pub fn selection(&self) -> Selection {
        self.selection.current()
    }

    pub fn selected_request_id(&self) -> i64 {
        self.selection.external_request_id()
    }

    pub fn viewport(&self) -> Option<BoundingBox> {
        self.viewport.current()
    }

    pub fn city_borders(&self) -> &[Vec<[f64; 2]>] {
        &self.city_borders
    }

    pub fn data_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn sorting(&self) -> SortSpec {
        self.sort
    }

    pub fn filter(&self) -> Option<StatusGroup> {
        self.filter
    }

    /// Current table settings, for persisting.
    pub fn preferences(&self, selected_filters: Vec<String>) -> ViewPreferences {
        ViewPreferences {
            sort: self.sort,
            filter: self.filter,
            selected_filters,
        }
    }

    pub fn worker_markers(&self) -> Vec<Marker<WorkerId>> {
        self.workers
            .iter()
            .filter(|w| w.location.is_some())
            .map(|w| {
                let emphasis = self.selection.emphasis_of_worker(w, &self.visible);
                Marker {
                    id: w.id,
                    emphasis,
                    style: emphasis.into(),
                }
            })
            .collect()
    }

    pub fn request_markers(&self) -> Vec<Marker<RequestId>> {
        self.visible
            .iter()
            .filter(|r| r.item_locations().next().is_some())
            .map(|r| {
                let emphasis = self.selection.emphasis_of_request(r, &self.workers);
                Marker {
                    id: r.id,
                    emphasis,
                    style: emphasis.into(),
                }
            })
            .collect()
    }

    // --- Recomputation ---

    fn after_selection(&mut self, changed: bool) -> StoreUpdate {
        if !changed {
            return StoreUpdate::default();
        }
        StoreUpdate {
            changed: true,
            recenter: self.refit(),
        }
    }

    fn rebuild_all(&mut self) -> StoreUpdate {
        self.dashboard = Dashboard::aggregate(&self.requests);
        self.rebuild_view()
    }

    fn rebuild_view(&mut self) -> StoreUpdate {
        self.visible = visible_requests(&self.requests, &self.sort, self.filter);
        StoreUpdate {
            changed: true,
            recenter: self.refit(),
        }
    }

    fn refit(&mut self) -> Option<BoundingBox> {
        let key = ViewportKey {
            revision: self.revision,
            selection: self.selection.current(),
            filter: self.filter,
        };
        let (selection, visible, workers, hint) = (
            &self.selection,
            &self.visible,
            &self.workers,
            self.hint.as_ref(),
        );
        self.viewport
            .update(key, || fit_viewport(selection, visible, workers, hint))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Item, Location};

    fn request_at(
        id: i64,
        status: &str,
        lat: f64,
        lon: f64,
        worker: Option<i64>,
    ) -> DeliveryRequest {
        let mut r = DeliveryRequest::new(id, status);
        r.items.push(Item {
            location: Location::new(lat, lon),
            ..Item::default()
        });
        r.workers.extend(worker);
        r
    }

    fn snapshot() -> Snapshot {
        let mut courier = Worker::new(7, "Anna");
        courier.location = Location::new(55.80, 37.60);
        courier.requests = vec![1];
        Snapshot {
            requests: vec![
                request_at(1, "new", 55.70, 37.50, Some(7)),
                request_at(2, "finished", 55.60, 37.70, None),
            ],
            workers: vec![courier],
            bounding_box: Some(BoundingBox::new(55.0, 56.5, 37.0, 38.2)),
            ..Snapshot::default()
        }
    }

    fn loaded() -> ConsoleStore {
        let mut store = ConsoleStore::default();
        let ticket = store.begin_refresh();
        assert!(store.is_loading());
        let update = store.apply_snapshot(&ticket, snapshot());
        assert!(update.changed);
        assert!(update.recenter.is_some());
        store
    }

    #[test]
    fn test_snapshot_builds_derived_state() {
        let store = loaded();
        assert!(!store.is_loading());
        assert_eq!(store.dashboard().total, 2);
        assert_eq!(store.visible_requests().len(), 2);
        let frame = store.viewport().unwrap();
        assert!(frame.contains(55.80, 37.60));
        assert!(frame.contains(55.60, 37.70));
    }

    #[test]
    fn test_selection_narrows_frame_and_markers() {
        let mut store = loaded();
        let update = store.dispatch(Action::SelectWorker(7));
        let frame = update.recenter.unwrap();
        assert!(frame.contains(55.70, 37.50));
        assert!(!frame.contains(55.60, 37.70));

        let markers = store.request_markers();
        assert_eq!(markers[0].emphasis, Emphasis::Related);
        assert_eq!(markers[1].emphasis, Emphasis::Dimmed);

        // Re-selecting the same worker does nothing.
        assert_eq!(
            store.dispatch(Action::SelectWorker(7)),
            StoreUpdate::default()
        );
    }

    #[test]
    fn test_new_snapshot_resets_selection() {
        let mut store = loaded();
        store.dispatch(Action::SelectRequest(2));
        assert_eq!(store.selected_request_id(), 2);

        let ticket = store.begin_refresh();
        store.apply_snapshot(&ticket, snapshot());
        assert_eq!(store.selection(), Selection::None);
        assert_eq!(store.selected_request_id(), -1);
    }

    #[test]
    fn test_stale_snapshot_discarded() {
        let mut store = loaded();
        let slow = store.begin_refresh();
        let fast = store.begin_refresh();

        let mut newer = snapshot();
        newer.requests.truncate(1);
        store.apply_snapshot(&fast, newer);
        let update = store.apply_snapshot(&slow, snapshot());

        assert!(!update.changed);
        assert_eq!(store.requests().len(), 1);
    }

    #[test]
    fn test_failed_refresh_keeps_stale_view() {
        let mut store = loaded();
        let ticket = store.begin_refresh();
        store.refresh_failed(&ticket, "connection reset");
        assert!(!store.is_loading());
        assert_eq!(store.requests().len(), 2);
    }

    #[test]
    fn test_failure_of_superseded_fetch_keeps_loading() {
        let mut store = loaded();
        let old = store.begin_refresh();
        let _new = store.begin_refresh();
        store.refresh_failed(&old, "timeout");
        assert!(store.is_loading());
    }

    #[test]
    fn test_partial_refresh_keeps_selection() {
        let mut store = loaded();
        store.dispatch(Action::SelectRequest(1));
        let ticket = store.begin_refresh();
        store.apply_partial(
            &ticket,
            vec![request_at(2, "cancelled", 55.60, 37.70, None)],
        );

        assert_eq!(store.selection(), Selection::Request(1));
        assert_eq!(store.dashboard().group(StatusGroup::Cancelled).total, 1);
        assert_eq!(store.requests().len(), 2);
    }

    #[test]
    fn test_filter_and_sort_entry_points() {
        let mut store = loaded();
        store.set_filter(Some(StatusGroup::InWork));
        assert_eq!(store.visible_requests().len(), 1);
        assert_eq!(store.visible_requests()[0].id, 2);
        // The dashboard still counts everything.
        assert_eq!(store.dashboard().total, 2);

        store.set_filter(None);
        let update = store.set_sorting(SortSpec::default().toggle(crate::listing::SortKey::Id));
        assert!(update.changed);
        assert_eq!(store.visible_requests()[0].id, 2);
        assert_eq!(store.preferences(Vec::new()).sort, store.sorting());
    }

    #[test]
    fn test_search_input_is_throttled() {
        let mut store = ConsoleStore::default();
        let t0 = Instant::now();
        store.input_search("12", t0);
        store.input_search("123", t0 + std::time::Duration::from_millis(100));
        assert_eq!(
            store.take_search(t0 + std::time::Duration::from_millis(200)),
            None
        );
        assert_eq!(
            store.take_search(t0 + std::time::Duration::from_secs(1)),
            Some("123".to_string())
        );
    }
}
