use std::time::Duration;

use freshet::EndpointBuilder;
use freshet::FetchError;
use futures::FutureExt;
use futures::StreamExt;
use serde_json::json;
use serde_json::Value;

use crate::common::not_modified;
use crate::common::ok;
use crate::common::ScriptedTransport;
use crate::common::URL;

#[tokio::test]
async fn not_modified_should_return_cached_value() {
    let transport = ScriptedTransport::new();
    transport
        .respond(ok("v1", json!({"id": 1, "name": "A"})))
        .respond(not_modified("v1"));
    let endpoint = EndpointBuilder::new(transport.clone())
        .url(URL)
        .fetch_refreshes_without_interval(true)
        .build_json::<Value>()
        .unwrap();

    let first = endpoint.fetch().await.unwrap();
    let second = endpoint.fetch().await.unwrap();

    assert_eq!(first, Some(json!({"id": 1, "name": "A"})));
    assert_eq!(second, first);
    assert_eq!(transport.if_none_match(1).as_deref(), Some("v1"));
    assert_eq!(endpoint.etag().as_deref(), Some("v1"));
}

#[tokio::test(start_paused = true)]
async fn refresh_interval_should_gate_requests_at_the_boundary() {
    let transport = ScriptedTransport::new();
    transport.respond(ok("v1", json!(1))).respond(not_modified("v1"));
    let endpoint = EndpointBuilder::new(transport.clone())
        .url(URL)
        .refresh_interval(Duration::from_millis(60_000))
        .build_json::<Value>()
        .unwrap();
    endpoint.fetch().await.unwrap();

    tokio::time::advance(Duration::from_millis(59_999)).await;
    assert_eq!(endpoint.fetch().await.unwrap(), Some(json!(1)));
    assert_eq!(transport.request_count(), 1);

    tokio::time::advance(Duration::from_millis(1)).await;
    assert_eq!(endpoint.fetch().await.unwrap(), Some(json!(1)));
    assert_eq!(transport.request_count(), 2);
}

#[tokio::test]
async fn reset_should_clear_validators_and_only_drop_value_on_new_url() {
    let transport = ScriptedTransport::new();
    transport
        .respond(ok("v1", json!(1)).with_header("expires", "Wed, 21 Oct 2099 07:28:00 GMT"))
        .respond(ok("w1", json!(2)));
    let endpoint = EndpointBuilder::new(transport.clone())
        .url(URL)
        .build_json::<Value>()
        .unwrap();
    endpoint.fetch().await.unwrap();
    assert!(endpoint.expires_at().is_some());

    endpoint.reset(Some(URL.to_string()));
    assert_eq!(endpoint.etag(), None);
    assert_eq!(endpoint.expires_at(), None);
    assert_eq!(endpoint.last_fetch(), None);
    assert_eq!(endpoint.current(), Some(json!(1)));

    endpoint.reset(Some("https://api.test/elsewhere".to_string()));
    assert_eq!(endpoint.current(), None);
    assert_eq!(endpoint.fetch().await.unwrap(), Some(json!(2)));
    assert_eq!(transport.url(1), "https://api.test/elsewhere");
}

#[tokio::test]
async fn replay_should_only_happen_once_a_value_is_known() {
    let transport = ScriptedTransport::new();
    transport.respond(ok("v1", json!("known")));
    let endpoint = EndpointBuilder::new(transport.clone())
        .url(URL)
        .build_json::<Value>()
        .unwrap();

    let mut early = endpoint.changes();
    assert!(early.next().now_or_never().is_none());
    assert_eq!(early.next().await.unwrap().unwrap(), json!("known"));

    let mut late = endpoint.changes();
    assert_eq!(late.next().now_or_never().unwrap().unwrap().unwrap(), json!("known"));
    assert!(late.next().now_or_never().is_none());
}

#[tokio::test]
async fn missing_url_should_be_a_fetch_error() {
    let endpoint = EndpointBuilder::new(ScriptedTransport::new())
        .build_json::<Value>()
        .unwrap();

    let err = endpoint.fetch().await.unwrap_err();

    assert!(matches!(err.as_fetch(), Some(FetchError::MissingUrl)));
}
