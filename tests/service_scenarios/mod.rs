use std::io::Write;

use freshet::CollectionService;
use freshet::Error;
use freshet::Settings;
use futures::StreamExt;
use serde_json::json;
use tempfile::NamedTempFile;

use crate::common::ok;
use crate::common::ScriptedTransport;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn service_should_index_by_configured_fields() {
    let file = write_config(
        r#"
[endpoint]
url = "https://api.test/products"
refresh_interval_ms = 60000

[index]
version_field = "revision"
items_field = "products"
id_field = "sku"
"#,
    );
    let settings = Settings::load(file.path().to_str()).unwrap();
    let transport = ScriptedTransport::new();
    transport.respond(ok(
        "r1",
        json!({"revision": "r1", "products": [{"sku": "A-1", "price": 3}]}),
    ));

    let service = CollectionService::from_settings(&settings, transport.clone()).unwrap();
    assert_eq!(service.load("A-1"), None);

    let index = service.index().next().await.unwrap();

    assert_eq!(index.len(), 1);
    assert_eq!(service.load("A-1"), Some(json!({"sku": "A-1", "price": 3})));
    assert_eq!(transport.url(0), "https://api.test/products");
}

#[tokio::test]
async fn service_fetch_should_go_through_the_cache() {
    let transport = ScriptedTransport::new();
    transport.respond(ok("r1", json!({"etag": "r1", "items": []})));
    let mut settings = Settings::default();
    settings.endpoint.url = Some("https://api.test/empty".to_string());

    let service = CollectionService::from_settings(&settings, transport.clone()).unwrap();
    let collection = service.fetch().await.unwrap().unwrap();

    assert_eq!(collection.version.as_deref(), Some("r1"));
    assert!(collection.items.is_empty());
    assert!(!*service.loading().borrow());
    assert_eq!(service.endpoint().etag().as_deref(), Some("r1"));
}

#[test]
fn service_should_reject_invalid_settings() {
    let mut settings = Settings::default();
    settings.index.id_field = " ".to_string();

    let result = CollectionService::from_settings(&settings, ScriptedTransport::new());

    assert!(matches!(result, Err(Error::Config(_))));
}
