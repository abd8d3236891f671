//! Caller-supplied equality and conversion contracts.
//!
//! A [`Converter`] maps the wire payload into the application's value type;
//! an [`Equality`] decides whether a freshly converted value is a real change.
//! Equality only suppresses redundant emissions, it never decides whether
//! the network is contacted.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

pub type Converter<T> = Arc<dyn Fn(Value) -> std::result::Result<T, String> + Send + Sync>;

pub type Equality<T> = Arc<dyn Fn(&T, &T) -> bool + Send + Sync>;

/// Deserializes the payload with serde.
pub fn json_converter<T>() -> Converter<T>
where
    T: DeserializeOwned + 'static,
{
    Arc::new(|raw| serde_json::from_value(raw).map_err(|e| e.to_string()))
}

/// Structural equality via `PartialEq`.
pub fn partial_eq<T>() -> Equality<T>
where
    T: PartialEq + 'static,
{
    Arc::new(|old, new| old == new)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct User {
        id: u32,
        name: String,
    }

    #[test]
    fn json_converter_should_deserialize_payload() {
        let convert = json_converter::<User>();
        let user = convert(json!({"id": 1, "name": "A"})).unwrap();
        assert_eq!(
            user,
            User {
                id: 1,
                name: "A".to_string()
            }
        );
    }

    #[test]
    fn json_converter_should_report_shape_mismatch() {
        let convert = json_converter::<User>();
        assert!(convert(json!({"id": "nope"})).is_err());
    }

    #[test]
    fn partial_eq_should_compare_structurally() {
        let eq = partial_eq::<Value>();
        assert!(eq(&json!({"a": 1}), &json!({"a": 1})));
        assert!(!eq(&json!({"a": 1}), &json!({"a": 2})));
    }
}
