use std::collections::HashMap;
use std::fmt;

use serde_json::Number;
use serde_json::Value;
use tracing::trace;

/// Identifier of an indexed item, keeping the JSON type of the id.
///
/// The number `1` and the string `"1"` are different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndexKey {
    String(String),
    Number(Number),
    Bool(bool),
}

impl IndexKey {
    /// Key for a scalar id value; `null`, arrays and objects are not keys.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(IndexKey::String(s.clone())),
            Value::Number(n) => Some(IndexKey::Number(n.clone())),
            Value::Bool(b) => Some(IndexKey::Bool(*b)),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }
}

impl fmt::Display for IndexKey {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            IndexKey::String(s) => write!(f, "{s:?}"),
            IndexKey::Number(n) => write!(f, "{n}"),
            IndexKey::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for IndexKey {
    fn from(id: &str) -> Self {
        IndexKey::String(id.to_string())
    }
}

impl From<String> for IndexKey {
    fn from(id: String) -> Self {
        IndexKey::String(id)
    }
}

impl From<&String> for IndexKey {
    fn from(id: &String) -> Self {
        IndexKey::String(id.clone())
    }
}

impl From<bool> for IndexKey {
    fn from(id: bool) -> Self {
        IndexKey::Bool(id)
    }
}

impl From<Number> for IndexKey {
    fn from(id: Number) -> Self {
        IndexKey::Number(id)
    }
}

macro_rules! integer_keys {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for IndexKey {
                fn from(id: $ty) -> Self {
                    IndexKey::Number(Number::from(id))
                }
            }
        )*
    };
}

integer_keys!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

/// Immutable identifier to item mapping built from one collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocalIndex {
    items: HashMap<IndexKey, Value>,
}

impl LocalIndex {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Indexes `items` by `id_field`. When ids collide the last item wins;
    /// items without a scalar id are left out.
    pub fn build(
        items: &[Value],
        id_field: &str,
    ) -> Self {
        let mut indexed = HashMap::with_capacity(items.len());
        for item in items {
            match item.get(id_field).and_then(IndexKey::from_value) {
                Some(id) => {
                    indexed.insert(id, item.clone());
                }
                None => trace!(id_field, "item without id, not indexed"),
            }
        }
        Self { items: indexed }
    }

    /// The item whose id equals `id`, type included.
    pub fn load(
        &self,
        id: impl Into<IndexKey>,
    ) -> Option<&Value> {
        self.items.get(&id.into())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
