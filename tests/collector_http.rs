//! End-to-end collection runs against a mocked upstream API.

use serde_json::{Value, json};
use std::num::NonZeroUsize;
use std::time::Duration;
use tweet_collector::api::ApiClient;
use tweet_collector::collector::{
    Collection, CollectionRecord, Collector, Pacing, RecordStore, ResourceKind, Target,
    Termination,
};
use tweet_collector::config::ApiConfig;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path, query_param, query_param_is_missing},
};

const REPLIES: &str = "/twitter/tweet/replies";
const RETWEETERS: &str = "/twitter/tweet/retweeters";
const SEARCH: &str = "/twitter/tweet/advanced_search";

fn collector(server: &MockServer, dir: &tempfile::TempDir) -> Collector<ApiClient> {
    let api = ApiConfig {
        base_url: server.uri(),
        api_key: Some("test-key".into()),
        ..Default::default()
    };
    let client = ApiClient::new(&api, Duration::from_secs(5)).unwrap();
    Collector::new(client, Pacing::immediate(), RecordStore::new(dir.path()))
}

fn replies_body(ids: &[&str], has_next: bool, next: &str) -> Value {
    json!({
        "status": "success",
        "tweets": ids.iter().map(|id| json!({"id": id})).collect::<Vec<_>>(),
        "has_next_page": has_next,
        "next_cursor": next,
    })
}

fn ids(items: &[Value]) -> Vec<&str> {
    items.iter().filter_map(|v| v["id"].as_str()).collect()
}

async fn mount_page(server: &MockServer, endpoint: &str, cursor: Option<&str>, body: Value) {
    let mock = Mock::given(method("GET")).and(path(endpoint));
    let mock = match cursor {
        Some(cursor) => mock.and(query_param("cursor", cursor)),
        None => mock.and(query_param_is_missing("cursor")),
    };
    mock.respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn replies_are_collected_in_page_order_until_exhausted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(REPLIES))
        .and(header("X-API-Key", "test-key"))
        .and(query_param("tweetId", "1790"))
        .and(query_param_is_missing("cursor"))
        .respond_with(ResponseTemplate::new(200).set_body_json(replies_body(
            &["a", "b"],
            true,
            "c1",
        )))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, REPLIES, Some("c1"), replies_body(&["c"], true, "c2")).await;
    mount_page(&server, REPLIES, Some("c2"), replies_body(&["d", "e"], false, "")).await;

    let dir = tempfile::tempdir().unwrap();
    let outcome = collector(&server, &dir)
        .run(&Collection::new(Target::replies("1790")))
        .await
        .unwrap();

    assert_eq!(outcome.termination, Termination::Exhausted);
    let saved = CollectionRecord::load(&outcome.saved_to.unwrap()).unwrap();
    assert_eq!(saved.kind, ResourceKind::Replies);
    assert_eq!(ids(&saved.items), vec!["a", "b", "c", "d", "e"]);
    assert_eq!(saved.total_items, 5);
    assert_eq!(saved.total_pages, 3);
    assert_eq!(saved.tweet_id.as_deref(), Some("1790"));
}

#[tokio::test]
async fn item_limit_keeps_exact_prefix() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        SEARCH,
        None,
        json!({"tweets": [{"id": "1"}, {"id": "2"}], "has_next_page": true, "next_cursor": "c1"}),
    )
    .await;
    mount_page(
        &server,
        SEARCH,
        Some("c1"),
        json!({"tweets": [{"id": "3"}, {"id": "4"}], "has_next_page": true, "next_cursor": "c2"}),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let collection = Collection::new(Target::search("rust lang")).with_limit(NonZeroUsize::new(3));
    let outcome = collector(&server, &dir).run(&collection).await.unwrap();

    assert_eq!(outcome.termination, Termination::CapReached);
    let record = outcome.record.unwrap();
    assert_eq!(ids(&record.items), vec!["1", "2", "3"]);

    let on_disk: Value =
        serde_json::from_str(&std::fs::read_to_string(outcome.saved_to.unwrap()).unwrap())
            .unwrap();
    assert_eq!(on_disk["total_tweets"], 3);
    assert_eq!(on_disk["parametros"]["query"], "rust lang");
    assert_eq!(on_disk["parametros"]["limit_tweets"], 3);
}

#[tokio::test]
async fn repeated_cursor_stops_retweeters_without_another_request() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        RETWEETERS,
        None,
        json!({"status": "success", "users": [{"id": "u1"}], "has_next_page": true, "next_cursor": "same"}),
    )
    .await;
    mount_page(
        &server,
        RETWEETERS,
        Some("same"),
        json!({"status": "success", "users": [{"id": "u2"}], "has_next_page": true, "next_cursor": "same"}),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let outcome = collector(&server, &dir)
        .run(&Collection::new(Target::retweeters("55")))
        .await
        .unwrap();

    assert_eq!(outcome.termination, Termination::CursorUnchanged);
    assert_eq!(outcome.requests_sent, 2);
    assert_eq!(ids(&outcome.record.unwrap().items), vec!["u1", "u2"]);
}

#[tokio::test]
async fn rate_limited_page_is_retried_with_same_cursor() {
    let server = MockServer::start().await;
    mount_page(&server, REPLIES, None, replies_body(&["a"], true, "c1")).await;
    Mock::given(method("GET"))
        .and(path(REPLIES))
        .and(query_param("cursor", "c1"))
        .respond_with(ResponseTemplate::new(429).set_body_string("Too Many Requests"))
        .up_to_n_times(2)
        .expect(2)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_page(&server, REPLIES, Some("c1"), replies_body(&["b"], false, "")).await;

    let dir = tempfile::tempdir().unwrap();
    let outcome = collector(&server, &dir)
        .run(&Collection::new(Target::replies("9")))
        .await
        .unwrap();

    assert_eq!(outcome.termination, Termination::Exhausted);
    assert_eq!(outcome.rate_limited, 2);
    let record = outcome.record.unwrap();
    assert_eq!(ids(&record.items), vec!["a", "b"]);
    assert_eq!(record.total_pages, 2);
}

#[tokio::test]
async fn auth_failure_on_second_page_persists_first_page() {
    let server = MockServer::start().await;
    mount_page(&server, REPLIES, None, replies_body(&["a", "b"], true, "c1")).await;
    Mock::given(method("GET"))
        .and(path(REPLIES))
        .and(query_param("cursor", "c1"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let outcome = collector(&server, &dir)
        .run(&Collection::new(Target::replies("9")))
        .await
        .unwrap();

    assert_eq!(outcome.termination, Termination::AuthFailed { status: 401 });
    let path = outcome.saved_to.unwrap();
    let on_disk: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk["total_paginas"], 1);
    assert_eq!(on_disk["total_replies"], 2);
    assert_eq!(on_disk["ultimo_cursor"], "c1");
}

#[tokio::test]
async fn resume_cursor_is_used_for_first_request() {
    let server = MockServer::start().await;
    mount_page(&server, REPLIES, Some("abc"), replies_body(&["z"], false, "")).await;

    let dir = tempfile::tempdir().unwrap();
    let collection = Collection::new(Target::replies("9")).resume_from(Some("abc".into()));
    let outcome = collector(&server, &dir).run(&collection).await.unwrap();

    let saved = CollectionRecord::load(&outcome.saved_to.unwrap()).unwrap();
    assert_eq!(saved.total_pages, 1);
    assert_eq!(saved.params.resume_cursor.as_deref(), Some("abc"));
}

#[tokio::test]
async fn search_does_not_stop_on_repeated_cursor() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEARCH))
        .and(query_param("cursor", "same"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"tweets": [{"id": "2"}], "has_next_page": true, "next_cursor": "same"}),
        ))
        .up_to_n_times(2)
        .expect(2)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_page(
        &server,
        SEARCH,
        None,
        json!({"tweets": [{"id": "1"}], "has_next_page": true, "next_cursor": "same"}),
    )
    .await;
    mount_page(
        &server,
        SEARCH,
        Some("same"),
        json!({"tweets": [], "has_next_page": false}),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let outcome = collector(&server, &dir)
        .run(&Collection::new(Target::search("q")))
        .await
        .unwrap();

    assert_eq!(outcome.termination, Termination::Exhausted);
    assert_eq!(outcome.requests_sent, 4);
    assert_eq!(ids(&outcome.record.unwrap().items), vec!["1", "2", "2"]);
}

#[tokio::test]
async fn first_page_failure_writes_no_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let outcome = collector(&server, &dir)
        .run(&Collection::new(Target::retweeters("1")))
        .await
        .unwrap();

    assert!(outcome.record.is_none());
    assert!(matches!(
        outcome.termination,
        Termination::HttpStatus { status: 500, .. }
    ));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
