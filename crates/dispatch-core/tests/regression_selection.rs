// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use dispatch_core::model::{DeliveryRequest, Worker};
use dispatch_core::selection::{Emphasis, Selection, SelectionModel, NO_REQUEST};

#[test]
fn test_worker_then_clear_equals_fresh_model() {
    let mut model = SelectionModel::new();
    model.select_worker(4);
    model.clear();
    assert_eq!(model, SelectionModel::new());
    assert_eq!(model.current(), Selection::None);
    assert_eq!(model.external_request_id(), NO_REQUEST);
}

#[test]
fn test_request_then_clear_resets_external_id() {
    let mut model = SelectionModel::new();
    model.select_request(12);
    assert_eq!(model.external_request_id(), 12);
    assert!(model.clear());
    assert_eq!(model.external_request_id(), NO_REQUEST);
    // Clearing twice reports no change.
    assert!(!model.clear());
}

#[test]
fn test_relation_symmetric_across_directions() {
    // Only the request knows about the assignment; the worker's own list is stale.
    let mut request = DeliveryRequest::new(1, "new");
    request.workers = vec![30];
    let worker = Worker::new(30, "Dmitry");
    let requests = vec![request];
    let workers = vec![worker];

    let mut model = SelectionModel::new();
    model.select_request(1);
    assert!(model.is_worker_related(&workers[0], &requests));

    model.select_worker(30);
    assert!(model.is_request_related(&requests[0], &workers));
    assert_eq!(
        model.emphasis_of_request(&requests[0], &workers),
        Emphasis::Related
    );
}

#[test]
fn test_selected_worker_missing_from_dataset() {
    let mut request = DeliveryRequest::new(1, "new");
    request.workers = vec![99];
    let other = DeliveryRequest::new(2, "new");

    let mut model = SelectionModel::new();
    model.select_worker(99);
    assert!(model.is_request_related(&request, &[]));
    assert_eq!(model.emphasis_of_request(&other, &[]), Emphasis::Dimmed);
}
