use std::time::Duration;

use freshet::IndexOverlay;
use futures::StreamExt;
use serde_json::json;
use tokio::time::sleep;

use crate::common::collection_endpoint;
use crate::common::not_modified;
use crate::common::ok;
use crate::common::ScriptedTransport;

#[tokio::test(start_paused = true)]
async fn overlay_should_keep_item_across_not_modified() {
    let transport = ScriptedTransport::new();
    transport
        .respond(ok("v1", json!({"etag": "v1", "items": [{"id": 1, "name": "A"}]})))
        .respond(not_modified("v1"));
    let endpoint = collection_endpoint(&transport, |b| b.refresh_interval(Duration::from_secs(30)));
    let overlay = IndexOverlay::from_endpoint(&endpoint, "id");

    let mut indexes = overlay.subscribe();
    indexes.next().await.unwrap();
    sleep(Duration::from_secs(31)).await;

    assert_eq!(transport.request_count(), 2);
    assert_eq!(overlay.load(1), Some(json!({"id": 1, "name": "A"})));
    assert_eq!(endpoint.etag().as_deref(), Some("v1"));
}

#[tokio::test(start_paused = true)]
async fn overlay_should_follow_version_changes() {
    let transport = ScriptedTransport::new();
    transport
        .respond(ok("a", json!({"etag": "a", "items": [{"id": "x", "name": "X"}]})))
        .respond(ok("b", json!({"etag": "b", "items": [{"id": "x", "name": "X2"}]})));
    let endpoint = collection_endpoint(&transport, |b| b.refresh_interval(Duration::from_secs(5)));
    let overlay = IndexOverlay::from_endpoint(&endpoint, "id");
    let mut indexes = overlay.subscribe();

    let first = indexes.next().await.unwrap();
    assert_eq!(first.load("x"), Some(&json!({"id": "x", "name": "X"})));

    let second = indexes.next().await.unwrap();
    assert_eq!(second.load("x"), Some(&json!({"id": "x", "name": "X2"})));
    assert_eq!(overlay.load("x"), Some(json!({"id": "x", "name": "X2"})));
    assert_eq!(overlay.load("y"), None);
}

#[tokio::test(start_paused = true)]
async fn many_consumers_should_share_one_poll_loop() {
    let transport = ScriptedTransport::new();
    transport.respond(ok("a", json!({"etag": "a", "items": [{"id": "x"}]})));
    let endpoint = collection_endpoint(&transport, |b| b.refresh_interval(Duration::from_secs(600)));
    let overlay = IndexOverlay::from_endpoint(&endpoint, "id");

    let mut consumers: Vec<_> = (0..5).map(|_| overlay.subscribe()).collect();
    for consumer in consumers.iter_mut() {
        assert!(consumer.next().await.unwrap().load("x").is_some());
    }

    assert_eq!(endpoint.subscriber_count(), 1);
    assert_eq!(transport.request_count(), 1);
}
