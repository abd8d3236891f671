use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::CollectionShape;
use crate::Error;
use crate::Result;

/// Field names describing a collection-shaped payload
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct IndexConfig {
    /// Field holding the change-identifying token
    #[serde(default = "default_version_field")]
    pub version_field: String,

    /// Field holding the item array
    #[serde(default = "default_items_field")]
    pub items_field: String,

    /// Per-item identifier field
    #[serde(default = "default_id_field")]
    pub id_field: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            version_field: default_version_field(),
            items_field: default_items_field(),
            id_field: default_id_field(),
        }
    }
}

impl IndexConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("version_field", &self.version_field),
            ("items_field", &self.items_field),
            ("id_field", &self.id_field),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Config(ConfigError::Message(format!(
                    "index {name} must not be empty"
                ))));
            }
        }
        Ok(())
    }

    pub fn shape(&self) -> CollectionShape {
        CollectionShape::new(&self.version_field, &self.items_field, &self.id_field)
    }
}

fn default_version_field() -> String {
    "etag".to_string()
}
fn default_items_field() -> String {
    "items".to_string()
}
fn default_id_field() -> String {
    "id".to_string()
}
