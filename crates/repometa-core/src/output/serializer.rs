//! Serializer: JSON first, YAML derived from the JSON value

use crate::error::{Error, Result};
use crate::types::Metadata;
use serde_json::Value;

/// Every rendering of one record. Built all at once or not at all.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedMetadata {
    /// The JSON document tree both text renderings come from
    pub value: Value,
    /// Compact JSON
    pub json: String,
    /// Indented JSON
    pub json_pretty: String,
    /// YAML rendered from `value`
    pub yaml: String,
}

impl RenderedMetadata {
    /// Render `metadata`.
    ///
    /// YAML is produced from the JSON tree, not from the typed record, so
    /// both formats carry the same keys in the same order.
    pub fn render(metadata: &Metadata) -> Result<Self> {
        let value = serde_json::to_value(metadata)?;
        let json = serde_json::to_string(&value)?;
        let json_pretty = serde_json::to_string_pretty(&value)?;
        let yaml = serde_yaml::to_string(&value)?;

        if json.is_empty() || yaml.is_empty() {
            return Err(Error::Serialization("empty rendering".to_string()));
        }

        Ok(Self {
            value,
            json,
            json_pretty,
            yaml,
        })
    }
}
