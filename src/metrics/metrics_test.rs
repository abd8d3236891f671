use super::*;

fn create_test_registry() -> Registry {
    let registry = Registry::new_custom(Some("test".to_string()), None).unwrap();
    register_custom_metrics(&registry).unwrap();
    registry
}

#[test]
fn test_custom_registry() {
    let registry = create_test_registry();

    record_fetch_outcome(FetchOutcome::Modified);
    observe_request(Some(200), 12.0);
    let metrics = &registry.gather();

    let metric_names: Vec<_> = metrics.iter().map(|m| m.get_name()).collect();
    assert!(
        metric_names.contains(&"test_freshet_fetch_outcomes"),
        "Missing test_freshet_fetch_outcomes"
    );
    assert!(
        metric_names.contains(&"test_freshet_request_duration_ms"),
        "Missing test_freshet_request_duration_ms"
    );
}

#[test]
fn test_double_registration_is_rejected() {
    let registry = create_test_registry();
    assert!(register_custom_metrics(&registry).is_err());
}

// Counters are process-wide and other tests fetch concurrently, so only a
// lower bound is checked.
#[test]
fn test_outcome_counter_increment() {
    let counter = FETCH_OUTCOMES.with_label_values(&["not_modified"]);
    let before = counter.get();

    record_fetch_outcome(FetchOutcome::NotModified);
    record_fetch_outcome(FetchOutcome::NotModified);

    assert!(counter.get() >= before + 2);
}

#[test]
fn test_request_duration_labels() {
    let missing = REQUEST_DURATION_MS.with_label_values(&["error"]);
    let before = missing.get_sample_count();

    observe_request(None, 5.0);

    assert!(missing.get_sample_count() > before);
}

#[test]
fn test_encode_metrics_text() {
    let registry = create_test_registry();
    record_fetch_outcome(FetchOutcome::Fresh);

    let text = encode_metrics(&registry);

    assert!(text.contains("test_freshet_fetch_outcomes{outcome=\"fresh\"}"));
}
