//! Behavioural tests for `PaginatedList` over an in-memory collaborator.

mod common;

use std::collections::BTreeMap;
use std::sync::Arc;

use academy_client::api::EntityApi;
use academy_client::error::TransportError;
use academy_client::list::{MergePolicy, PaginatedList, QueryPatch};
use academy_core::pagination::{FilterValue, ALL_ROWS};
use assert_matches::assert_matches;
use common::{Course, FakeApi};
use serde_json::json;

fn list(api: &Arc<FakeApi>, page_size: i64) -> PaginatedList<Course> {
    PaginatedList::new(api.clone(), page_size)
}

// ---------------------------------------------------------------------------
// Test: fetching
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_data_replaces_window_and_pagination() {
    let api = FakeApi::seeded(12);
    let list = list(&api, 5);

    list.go_to_page(3).await.unwrap();

    let state = list.snapshot().await;
    assert_eq!(state.items.iter().map(|c| c.id).collect::<Vec<_>>(), vec![11, 12]);
    assert_eq!(state.pagination.page, 3);
    assert_eq!(state.pagination.item_count, 12);
    assert_eq!(state.pagination.page_count, 3);
    assert!(!list.is_loading());
}

#[tokio::test]
async fn filter_and_size_changes_reset_to_page_one() {
    let api = FakeApi::seeded(30);
    let list = list(&api, 5);
    list.go_to_page(4).await.unwrap();

    list.update_filters(BTreeMap::from([(
        "isPublished".to_string(),
        FilterValue::Scalar(json!(true)),
    )]))
    .await
    .unwrap();
    let query = list.query().await;
    assert_eq!(query.page, 1);
    assert_eq!(query.filters.len(), 1);

    list.go_to_page(2).await.unwrap();
    assert_eq!(list.query().await.filters.len(), 1, "page changes keep filters");

    list.update_page_size(20).await.unwrap();
    let query = list.query().await;
    assert_eq!(query.page, 1);
    assert_eq!(query.page_size, 20);
    assert_eq!(api.queries().last().map(|q| q.page_size), Some(20));
}

#[tokio::test]
async fn reset_filters_restores_the_initial_snapshot() {
    let api = FakeApi::seeded(8);
    let list = list(&api, 5);
    list.update_search("course").await.unwrap();
    list.go_to_page(2).await.unwrap();

    list.reset_filters().await;

    let state = list.snapshot().await;
    assert!(state.items.is_empty());
    assert_eq!(state.query.page, 1);
    assert_eq!(state.query.search, None);
    assert_eq!(state.pagination.item_count, 0);
}

// ---------------------------------------------------------------------------
// Test: the unpaginated cache
// ---------------------------------------------------------------------------

#[tokio::test]
async fn creating_n_items_then_forced_fetch_all_returns_n() {
    let api = FakeApi::seeded(0);
    let list = list(&api, 10);

    for n in 0..7 {
        list.create(&json!({ "title": format!("Course {n}") })).await.unwrap();
    }
    let all = list.fetch_all_data(QueryPatch::default(), true).await.unwrap();

    assert_eq!(all.len(), 7);
    assert_eq!(api.queries().last().map(|q| q.page_size), Some(ALL_ROWS));
}

#[tokio::test]
async fn populated_cache_is_served_without_a_call() {
    let api = FakeApi::seeded(3);
    let list = list(&api, 10);

    assert_eq!(list.fetch_all_data(QueryPatch::default(), false).await.unwrap().len(), 3);
    let calls = api.calls();

    list.create(&json!({ "title": "Late arrival" })).await.unwrap();
    let cached = list.fetch_all_data(QueryPatch::default(), false).await.unwrap();
    assert_eq!(cached.len(), 3);
    assert_eq!(api.calls(), calls + 1, "only the create reached the server");

    let fresh = list.fetch_all_data(QueryPatch::default(), true).await.unwrap();
    assert_eq!(fresh.len(), 4);
}

#[tokio::test]
async fn forced_refetch_keeps_cached_entries_by_default() {
    let api = FakeApi::seeded(2);
    let list = list(&api, 10);
    list.fetch_all_data(QueryPatch::default(), true).await.unwrap();

    api.update(1, &json!({ "title": "Renamed on server" })).await.unwrap();
    let all = list.fetch_all_data(QueryPatch::default(), true).await.unwrap();
    assert_eq!(all[0].title, "Course 1");

    let preferring: PaginatedList<Course> =
        PaginatedList::<Course>::new(api.clone(), 10).with_merge_policy(MergePolicy::PreferFetched);
    preferring.fetch_all_data(QueryPatch::default(), true).await.unwrap();
    api.update(1, &json!({ "title": "Renamed again" })).await.unwrap();
    let all = preferring.fetch_all_data(QueryPatch::default(), true).await.unwrap();
    assert_eq!(all[0].title, "Renamed again");
}

// ---------------------------------------------------------------------------
// Test: optimistic patches
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_on_a_full_window_keeps_it_full() {
    let api = FakeApi::seeded(10);
    let list = list(&api, 10);
    list.fetch_data(QueryPatch::default()).await.unwrap();
    let fetches = api.queries().len();

    let created = list.create(&json!({ "title": "Newest" })).await.unwrap();

    let state = list.snapshot().await;
    assert_eq!(state.items.len(), 10);
    assert_eq!(state.items[0], created);
    assert_eq!(state.pagination.item_count, 11);
    assert_eq!(state.pagination.page_count, 2);
    assert_eq!(api.queries().len(), fetches, "no refetch after create");
}

#[tokio::test]
async fn deleting_the_whole_first_page_refetches_page_one() {
    let api = FakeApi::seeded(10);
    let list = list(&api, 5);
    list.fetch_data(QueryPatch::default()).await.unwrap();

    let outcome = list.bulk_delete(&[1, 2, 3, 4, 5]).await.unwrap();

    assert_eq!(outcome.deleted_count, 5);
    assert_eq!(api.queries().last().map(|q| q.page), Some(1));
    let state = list.snapshot().await;
    assert_eq!(state.items.iter().map(|c| c.id).collect::<Vec<_>>(), vec![6, 7, 8, 9, 10]);
    assert_eq!(state.pagination.item_count, 5);
    assert_eq!(state.pagination.page_count, 1);
}

#[tokio::test]
async fn emptying_a_later_page_steps_back() {
    let api = FakeApi::seeded(6);
    let list = list(&api, 5);
    list.go_to_page(2).await.unwrap();

    list.delete(6).await.unwrap();

    assert_eq!(api.queries().last().map(|q| q.page), Some(1));
    let state = list.snapshot().await;
    assert_eq!(state.pagination.page, 1);
    assert_eq!(state.items.len(), 5);
}

#[tokio::test]
async fn bulk_delete_succeeds_when_only_the_refetch_fails() {
    let api = FakeApi::seeded(5);
    let list = list(&api, 5);
    list.fetch_data(QueryPatch::default()).await.unwrap();
    api.fail_next_fetch(TransportError::Network("connection reset".into()));

    let outcome = list.bulk_delete(&[1, 2, 3, 4, 5]).await.unwrap();

    assert!(outcome.deleted);
    assert!(api.ids().is_empty());
    assert_matches!(list.last_error().await, Some(TransportError::Network(_)));
    assert!(!list.is_loading());
}

#[tokio::test]
async fn deleting_before_any_page_was_fetched_does_not_refetch() {
    let api = FakeApi::seeded(3);
    let list = list(&api, 10);
    list.fetch_all_data(QueryPatch::default(), false).await.unwrap();
    let fetches = api.queries().len();

    list.delete(2).await.unwrap();

    assert_eq!(api.queries().len(), fetches);
    let ids: Vec<_> = list.all_items().await.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![1, 3]);
    assert!(list.items().await.is_empty());
}

#[tokio::test]
async fn delete_inside_window_patches_without_refetch() {
    let api = FakeApi::seeded(4);
    let list = list(&api, 10);
    list.fetch_data(QueryPatch::default()).await.unwrap();
    let fetches = api.queries().len();

    list.delete(2).await.unwrap();

    let state = list.snapshot().await;
    assert_eq!(state.items.iter().map(|c| c.id).collect::<Vec<_>>(), vec![1, 3, 4]);
    assert_eq!(state.pagination.item_count, 3);
    assert_eq!(api.queries().len(), fetches);
}

#[tokio::test]
async fn update_replaces_the_row_in_place() {
    let api = FakeApi::seeded(3);
    let list = list(&api, 10);
    list.fetch_data(QueryPatch::default()).await.unwrap();

    list.update(2, &json!({ "isPublished": true })).await.unwrap();

    let items = list.items().await;
    assert!(items[1].is_published);
    assert_eq!(items.len(), 3);
}

#[tokio::test]
async fn partial_update_merges_fields() {
    let api = FakeApi::seeded(2);
    let list = list(&api, 10);
    list.fetch_data(QueryPatch::default()).await.unwrap();

    list.handle_post_update_partial(1, &json!({ "title": "Patched" })).await;
    list.handle_post_update_partial(99, &json!({ "title": "Ghost" })).await;

    let items = list.items().await;
    assert_eq!(items[0].title, "Patched");
    assert_eq!(items[0].id, 1);
    assert_eq!(items[1].title, "Course 2");
}

// ---------------------------------------------------------------------------
// Test: errors go through the operation wrapper
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failures_are_recorded_and_loading_is_lowered() {
    let api = FakeApi::seeded(3);
    let list = list(&api, 10);
    api.fail_next(TransportError::Unauthorized("token expired".into()));

    let result = list.fetch_data(QueryPatch::default()).await;

    assert_matches!(result, Err(ref e) if e.is_auth_expired());
    assert_matches!(list.last_error().await, Some(TransportError::Unauthorized(_)));
    assert!(!list.is_loading());
    assert!(list.items().await.is_empty());

    list.fetch_data(QueryPatch::default()).await.unwrap();
    assert_eq!(list.last_error().await, None);
}

#[tokio::test]
async fn failed_create_leaves_state_untouched() {
    let api = FakeApi::seeded(2);
    let list = list(&api, 10);
    list.fetch_data(QueryPatch::default()).await.unwrap();

    let result = list.create(&json!({ "isPublished": true })).await;

    assert_matches!(result, Err(TransportError::Validation(ref failures)) if failures[0].property == "title");
    assert_eq!(list.pagination().await.item_count, 2);
    assert_eq!(list.items().await.len(), 2);
}
