// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::model::{DeliveryRequest, RequestId, Worker, WorkerId};
use log::debug;
use serde::Serialize;

/// Value of the externally tracked request id when nothing is selected.
pub const NO_REQUEST: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Selection {
    #[default]
    None,
    Worker(WorkerId),
    Request(RequestId),
}

/// How an entity should be drawn relative to the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Emphasis {
    /// Nothing is selected.
    Neutral,
    Selected,
    Related,
    Dimmed,
}

impl Emphasis {
    pub fn is_highlighted(&self) -> bool {
        matches!(self, Emphasis::Selected | Emphasis::Related)
    }
}

/// A worker and a request are linked when either side lists the other.
pub fn is_assigned(request: &DeliveryRequest, worker: &Worker) -> bool {
    request.has_worker(worker.id) || worker.has_request(request.id)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionModel {
    current: Selection,
    external_request_id: i64,
}

impl Default for SelectionModel {
    fn default() -> Self {
        Self {
            current: Selection::None,
            external_request_id: NO_REQUEST,
        }
    }
}

impl SelectionModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Selection {
        self.current
    }

    pub fn is_empty(&self) -> bool {
        self.current == Selection::None
    }

    pub fn external_request_id(&self) -> i64 {
        self.external_request_id
    }

    /// Returns `false` when the request was already selected.
    pub fn select_request(&mut self, id: RequestId) -> bool {
        if self.current == Selection::Request(id) {
            return false;
        }
        self.current = Selection::Request(id);
        self.external_request_id = id;
        true
    }

    /// Returns `false` when the worker was already selected.
    pub fn select_worker(&mut self, id: WorkerId) -> bool {
        if self.current == Selection::Worker(id) {
            return false;
        }
        self.current = Selection::Worker(id);
        self.external_request_id = NO_REQUEST;
        true
    }

    /// Click on empty canvas.
    pub fn clear(&mut self) -> bool {
        let changed = *self != Self::default();
        *self = Self::default();
        changed
    }

    /// Dataset replaced by a new fetch.
    pub fn reset(&mut self) {
        if !self.is_empty() {
            debug!(
                "Selection reset by dataset replacement (was {:?})",
                self.current
            );
        }
        *self = Self::default();
    }

    /// Reconciles a request chosen outside the map (search box, table row).
    /// Only acts when the outside id disagrees with the internal one, so the
    /// map echoing its own selection back does not loop.
    pub fn sync_external(&mut self, external: Option<RequestId>) -> bool {
        let external = external.filter(|id| *id != NO_REQUEST);
        let internal = match self.current {
            Selection::Request(id) => Some(id),
            _ => None,
        };
        if external == internal {
            return false;
        }
        match external {
            Some(id) => self.select_request(id),
            None => self.clear(),
        }
    }

    pub fn emphasis_of_request(&self, request: &DeliveryRequest, workers: &[Worker]) -> Emphasis {
        match self.current {
            Selection::None => Emphasis::Neutral,
            Selection::Request(id) if id == request.id => Emphasis::Selected,
            Selection::Request(_) => Emphasis::Dimmed,
            Selection::Worker(wid) => {
                let related = workers
                    .iter()
                    .find(|w| w.id == wid)
                    .map_or(request.has_worker(wid), |w| is_assigned(request, w));
                if related {
                    Emphasis::Related
                } else {
                    Emphasis::Dimmed
                }
            }
        }
    }

    pub fn emphasis_of_worker(&self, worker: &Worker, requests: &[DeliveryRequest]) -> Emphasis {
        match self.current {
            Selection::None => Emphasis::Neutral,
            Selection::Worker(id) if id == worker.id => Emphasis::Selected,
            Selection::Worker(_) => Emphasis::Dimmed,
            Selection::Request(rid) => {
                let related = requests
                    .iter()
                    .find(|r| r.id == rid)
                    .map_or(worker.has_request(rid), |r| is_assigned(r, worker));
                if related {
                    Emphasis::Related
                } else {
                    Emphasis::Dimmed
                }
            }
        }
    }

    pub fn is_request_related(&self, request: &DeliveryRequest, workers: &[Worker]) -> bool {
        self.emphasis_of_request(request, workers) == Emphasis::Related
    }

    pub fn is_worker_related(&self, worker: &Worker, requests: &[DeliveryRequest]) -> bool {
        self.emphasis_of_worker(worker, requests) == Emphasis::Related
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (Vec<DeliveryRequest>, Vec<Worker>) {
        let mut r1 = DeliveryRequest::new(1, "new");
        r1.workers = vec![10];
        let r2 = DeliveryRequest::new(2, "finished");

        let w10 = Worker::new(10, "Anna");
        let mut w20 = Worker::new(20, "Boris");
        w20.requests = vec![2];

        (vec![r1, r2], vec![w10, w20])
    }

    #[test]
    fn test_nothing_selected_is_neutral() {
        let (requests, workers) = fixture();
        let model = SelectionModel::new();
        assert_eq!(
            model.emphasis_of_request(&requests[0], &workers),
            Emphasis::Neutral
        );
        assert_eq!(
            model.emphasis_of_worker(&workers[1], &requests),
            Emphasis::Neutral
        );
        assert_eq!(model.external_request_id(), NO_REQUEST);
    }

    #[test]
    fn test_selecting_one_kind_clears_the_other() {
        let mut model = SelectionModel::new();
        model.select_request(1);
        assert_eq!(model.external_request_id(), 1);
        model.select_worker(10);
        assert_eq!(model.current(), Selection::Worker(10));
        assert_eq!(model.external_request_id(), NO_REQUEST);
        model.select_request(2);
        assert_eq!(model.current(), Selection::Request(2));
    }

    #[test]
    fn test_reselect_is_noop() {
        let mut model = SelectionModel::new();
        assert!(model.select_worker(10));
        assert!(!model.select_worker(10));
        assert_eq!(model.current(), Selection::Worker(10));
    }

    #[test]
    fn test_relation_from_either_side() {
        let (requests, workers) = fixture();
        let mut model = SelectionModel::new();

        // Request 1 lists worker 10.
        model.select_request(1);
        assert!(model.is_worker_related(&workers[0], &requests));
        assert!(!model.is_worker_related(&workers[1], &requests));

        // Worker 20 lists request 2.
        model.select_worker(20);
        assert!(model.is_request_related(&requests[1], &workers));
        assert_eq!(
            model.emphasis_of_request(&requests[0], &workers),
            Emphasis::Dimmed
        );
        assert_eq!(
            model.emphasis_of_worker(&workers[1], &requests),
            Emphasis::Selected
        );
        assert_eq!(
            model.emphasis_of_worker(&workers[0], &requests),
            Emphasis::Dimmed
        );
    }

    #[test]
    fn test_external_sync_only_on_disagreement() {
        let mut model = SelectionModel::new();
        assert!(model.sync_external(Some(5)));
        assert_eq!(model.current(), Selection::Request(5));
        assert!(!model.sync_external(Some(5)));

        assert!(model.sync_external(Some(NO_REQUEST)));
        assert!(model.is_empty());
        assert!(!model.sync_external(None));
    }

    #[test]
    fn test_external_sync_replaces_worker_selection() {
        let mut model = SelectionModel::new();
        model.select_worker(10);
        // A worker selection leaves no request internally; the outside
        // clearing its id agrees and must not drop the worker.
        assert!(!model.sync_external(None));
        assert_eq!(model.current(), Selection::Worker(10));
        assert!(model.sync_external(Some(3)));
        assert_eq!(model.current(), Selection::Request(3));
    }
}
