//! Wire data model - Batch Encoder output
//!
//! Validated points ready for the line protocol, grouped into a batch that
//! carries the write settings of one dispatch call.

use std::collections::BTreeMap;

/// Validated field value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
}

/// One wire point
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    /// Measurement name (non-empty)
    pub measurement: String,
    /// Tags with non-empty values, sorted by key
    pub tags: BTreeMap<String, String>,
    /// At least one field, sorted by key
    pub fields: BTreeMap<String, FieldValue>,
    /// Nanoseconds since the Unix epoch
    pub timestamp_ns: i64,
}

/// Per-write settings forwarded to the store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSettings {
    /// Target database
    pub database: String,
    /// Retention policy (empty = store default)
    pub retention_policy: String,
    /// Write consistency, passed through verbatim
    pub write_consistency: String,
}

/// Points for one write call
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub settings: BatchSettings,
    pub points: Vec<Point>,
}

impl Batch {
    /// Create an empty batch
    pub fn new(settings: BatchSettings) -> Self {
        Self {
            settings,
            points: Vec::new(),
        }
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the batch has no points
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
