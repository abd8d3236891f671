use std::sync::Arc;

use serde_json::Value;

use crate::Converter;
use crate::Equality;

/// Collection-shaped payload: a version token plus the item array.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Collection {
    pub version: Option<String>,
    pub items: Vec<Value>,
}

impl Collection {
    /// Same version token on both sides. Collections without a token are
    /// never considered equal.
    pub fn same_version(
        &self,
        other: &Collection,
    ) -> bool {
        match (&self.version, &other.version) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

/// Field names locating the version token, item array and item identifier
/// inside a collection payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionShape {
    version_field: String,
    items_field: String,
    id_field: String,
}

impl CollectionShape {
    pub fn new(
        version_field: &str,
        items_field: &str,
        id_field: &str,
    ) -> Self {
        Self {
            version_field: version_field.to_string(),
            items_field: items_field.to_string(),
            id_field: id_field.to_string(),
        }
    }

    pub fn version_field(&self) -> &str {
        &self.version_field
    }

    pub fn items_field(&self) -> &str {
        &self.items_field
    }

    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    /// Extracts a [`Collection`] from a raw payload.
    ///
    /// The version token is optional; the item array is required.
    pub fn parse(
        &self,
        raw: &Value,
    ) -> std::result::Result<Collection, String> {
        let object = raw
            .as_object()
            .ok_or_else(|| "collection payload is not a JSON object".to_string())?;

        let items = match object.get(&self.items_field) {
            Some(Value::Array(items)) => items.clone(),
            Some(_) => return Err(format!("field {:?} is not an array", self.items_field)),
            None => return Err(format!("field {:?} is missing", self.items_field)),
        };

        Ok(Collection {
            version: object.get(&self.version_field).and_then(version_text),
            items,
        })
    }

    pub fn converter(&self) -> Converter<Collection> {
        let shape = self.clone();
        Arc::new(move |raw| shape.parse(&raw))
    }

    /// Change detection by version token only.
    pub fn equality(&self) -> Equality<Collection> {
        Arc::new(|old: &Collection, new: &Collection| old.same_version(new))
    }
}

/// Text form of a version token: strings verbatim, other values as their
/// JSON text, `null` as absent.
fn version_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
