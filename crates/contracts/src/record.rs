//! MetricRecord - upstream pipeline output
//!
//! One measurement sample as delivered by the collection pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A single metric sample
///
/// Field values stay JSON-typed until the batch encoder validates them:
/// numbers, strings and booleans are accepted, anything else fails the batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    /// Measurement name
    pub name: String,

    /// Tag set (indexed, string valued)
    #[serde(default)]
    pub tags: BTreeMap<String, String>,

    /// Field set
    pub fields: BTreeMap<String, Value>,

    /// Sample time
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl MetricRecord {
    /// Create a record without tags or fields
    pub fn new(name: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            tags: BTreeMap::new(),
            fields: BTreeMap::new(),
            timestamp,
        }
    }

    /// Add a tag
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Add a field
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}
