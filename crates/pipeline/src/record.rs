//! Record type
//!
//! A record is an opaque payload plus string attributes. The pipeline never
//! inspects the payload; routing only reads attributes.
//!
//! # JSON lines form
//!
//! ```json
//! {"attributes": {"tenant": "acme", "filename": "a.csv"}, "content": "..."}
//! ```
//!
//! A `null` attribute value is treated the same as an absent attribute.

use std::collections::HashMap;

use distributor_routing::Attributes;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Result;

/// One unit of data flowing through the distributor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Named attributes
    #[serde(default, deserialize_with = "deserialize_attributes")]
    attributes: HashMap<String, String>,

    /// Opaque payload
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    content: serde_json::Value,
}

/// Drop attributes whose value is `null`
fn deserialize_attributes<'de, D>(deserializer: D) -> std::result::Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: HashMap<String, Option<String>> = HashMap::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k, v)))
        .collect())
}

impl Record {
    /// Create an empty record
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attribute
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Set the payload
    #[must_use]
    pub fn with_content(mut self, content: impl Into<serde_json::Value>) -> Self {
        self.content = content.into();
        self
    }

    /// Parse a record from one JSON line
    pub fn from_json(line: &str) -> Result<Self> {
        Ok(serde_json::from_str(line)?)
    }

    /// Serialize as a single JSON line (no trailing newline)
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    #[inline]
    pub fn attributes(&self) -> &HashMap<String, String> {
        &self.attributes
    }

    #[inline]
    pub fn content(&self) -> &serde_json::Value {
        &self.content
    }

    /// Set or replace an attribute
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }
}

impl Attributes for Record {
    #[inline]
    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}
