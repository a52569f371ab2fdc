//! Batch Encoder - MetricRecord to wire Point conversion
//!
//! A single invalid record fails the whole batch: nothing is partially
//! encoded and nothing is sent.

use std::collections::BTreeMap;

use contracts::{Batch, BatchSettings, FieldValue, MetricRecord, Point};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::error::OutputError;

/// Why a record cannot become a point
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    #[error("measurement name is empty")]
    EmptyMeasurement,

    #[error("record has no fields")]
    NoFields,

    #[error("tag key is empty")]
    EmptyTagKey,

    #[error("field key is empty")]
    EmptyFieldKey,

    #[error("'{key}' {reason}")]
    InvalidCharacter { key: String, reason: &'static str },

    #[error("field '{field}' has unsupported type {kind}")]
    UnsupportedFieldType { field: String, kind: &'static str },

    #[error("field '{field}' value {value} exceeds the signed 64-bit integer range")]
    IntegerOverflow { field: String, value: u64 },

    #[error("timestamp {0} is outside the nanosecond range")]
    TimestampOutOfRange(String),
}

/// Builds batches bound to the configured write settings
#[derive(Debug, Clone)]
pub struct BatchEncoder {
    settings: BatchSettings,
}

impl BatchEncoder {
    pub fn new(settings: BatchSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &BatchSettings {
        &self.settings
    }

    /// Encode records into a batch
    ///
    /// # Errors
    /// `OutputError::Encoding` naming the first invalid record
    #[instrument(name = "batch_encoder_encode", skip(self, records), fields(records = records.len()))]
    pub fn encode(&self, records: &[MetricRecord]) -> Result<Batch, OutputError> {
        let mut batch = Batch::new(self.settings.clone());
        batch.points.reserve(records.len());

        for (index, record) in records.iter().enumerate() {
            let point = encode_record(record).map_err(|source| OutputError::Encoding {
                index,
                name: record.name.clone(),
                source,
            })?;
            batch.points.push(point);
        }

        debug!(points = batch.len(), database = %self.settings.database, "Batch encoded");
        Ok(batch)
    }
}

/// Convert one record into a validated point
pub fn encode_record(record: &MetricRecord) -> Result<Point, EncodingError> {
    if record.name.is_empty() {
        return Err(EncodingError::EmptyMeasurement);
    }
    if record.fields.is_empty() {
        return Err(EncodingError::NoFields);
    }
    check_identifier(&record.name)?;

    let mut tags = BTreeMap::new();
    for (key, value) in &record.tags {
        if key.is_empty() {
            return Err(EncodingError::EmptyTagKey);
        }
        check_identifier(key)?;
        check_identifier(value)?;
        // the line protocol cannot carry empty tag values
        if !value.is_empty() {
            tags.insert(key.clone(), value.clone());
        }
    }

    let mut fields = BTreeMap::new();
    for (key, value) in &record.fields {
        if key.is_empty() {
            return Err(EncodingError::EmptyFieldKey);
        }
        check_identifier(key)?;
        fields.insert(key.clone(), field_value(key, value)?);
    }

    let timestamp_ns = record
        .timestamp
        .timestamp_nanos_opt()
        .ok_or_else(|| EncodingError::TimestampOutOfRange(record.timestamp.to_rfc3339()))?;

    Ok(Point {
        measurement: record.name.clone(),
        tags,
        fields,
        timestamp_ns,
    })
}

/// Unquoted names must stay on one line and must not escape the separator after them
fn check_identifier(raw: &str) -> Result<(), EncodingError> {
    let reason = if raw.contains(['\n', '\r']) {
        "contains a line break"
    } else if raw.ends_with('\\') {
        "ends with a backslash"
    } else {
        return Ok(());
    };
    Err(EncodingError::InvalidCharacter {
        key: raw.to_string(),
        reason,
    })
}

fn field_value(key: &str, value: &Value) -> Result<FieldValue, EncodingError> {
    match value {
        Value::Bool(b) => Ok(FieldValue::Boolean(*b)),
        Value::String(s) => Ok(FieldValue::String(s.clone())),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(FieldValue::Integer(i))
            } else if let Some(u) = n.as_u64() {
                Err(EncodingError::IntegerOverflow {
                    field: key.to_string(),
                    value: u,
                })
            } else {
                n.as_f64()
                    .filter(|f| f.is_finite())
                    .map(FieldValue::Float)
                    .ok_or_else(|| EncodingError::UnsupportedFieldType {
                        field: key.to_string(),
                        kind: "number",
                    })
            }
        }
        Value::Null => Err(unsupported(key, "null")),
        Value::Array(_) => Err(unsupported(key, "array")),
        Value::Object(_) => Err(unsupported(key, "object")),
    }
}

fn unsupported(key: &str, kind: &'static str) -> EncodingError {
    EncodingError::UnsupportedFieldType {
        field: key.to_string(),
        kind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn settings() -> BatchSettings {
        BatchSettings {
            database: "telegraf".into(),
            retention_policy: "autogen".into(),
            write_consistency: "any".into(),
        }
    }

    fn record(name: &str) -> MetricRecord {
        MetricRecord::new(name, Utc.timestamp_opt(1_700_000_000, 5).unwrap())
    }

    #[test]
    fn test_encode_typed_fields() {
        let rec = record("cpu")
            .with_tag("host", "a")
            .with_field("usage", 12.5)
            .with_field("cores", 8)
            .with_field("model", "x86")
            .with_field("online", true);

        let point = encode_record(&rec).unwrap();
        assert_eq!(point.measurement, "cpu");
        assert_eq!(point.fields["usage"], FieldValue::Float(12.5));
        assert_eq!(point.fields["cores"], FieldValue::Integer(8));
        assert_eq!(point.fields["model"], FieldValue::String("x86".into()));
        assert_eq!(point.fields["online"], FieldValue::Boolean(true));
        assert_eq!(point.timestamp_ns, 1_700_000_000_000_000_005);
    }

    #[test]
    fn test_empty_tag_values_dropped() {
        let rec = record("cpu")
            .with_tag("host", "a")
            .with_tag("region", "")
            .with_field("v", 1);
        let point = encode_record(&rec).unwrap();
        assert_eq!(point.tags.len(), 1);
        assert!(!point.tags.contains_key("region"));
    }

    #[test]
    fn test_rejects_invalid_records() {
        assert_eq!(
            encode_record(&record("").with_field("v", 1)),
            Err(EncodingError::EmptyMeasurement)
        );
        assert_eq!(encode_record(&record("cpu")), Err(EncodingError::NoFields));
        assert_eq!(
            encode_record(&record("cpu").with_tag("", "x").with_field("v", 1)),
            Err(EncodingError::EmptyTagKey)
        );
        assert_eq!(
            encode_record(&record("cpu").with_field("", 1)),
            Err(EncodingError::EmptyFieldKey)
        );
    }

    #[test]
    fn test_rejects_line_breaks_in_names() {
        let cases = [
            record("cpu\nmem").with_field("v", 1),
            record("cpu").with_tag("host", "a\nmem").with_field("v", 1),
            record("cpu").with_tag("ho\rst", "a").with_field("v", 1),
            record("cpu").with_field("v\n", 1),
        ];
        for rec in cases {
            let err = encode_record(&rec).unwrap_err();
            assert!(
                matches!(err, EncodingError::InvalidCharacter { reason, .. } if reason == "contains a line break"),
                "accepted {rec:?}"
            );
        }
    }

    #[test]
    fn test_line_break_record_never_reaches_the_wire() {
        let encoder = BatchEncoder::new(settings());
        let rec = record("cpu").with_tag("host", "a\nmem").with_field("v", 1);
        let err = encoder.encode(&[rec]).unwrap_err();
        assert!(matches!(
            err,
            OutputError::Encoding {
                index: 0,
                source: EncodingError::InvalidCharacter { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_trailing_backslash() {
        let err = encode_record(&record("cpu").with_tag("host", "a\\").with_field("v", 1))
            .unwrap_err();
        assert_eq!(
            err,
            EncodingError::InvalidCharacter {
                key: "a\\".into(),
                reason: "ends with a backslash"
            }
        );
        let err = encode_record(&record("cpu").with_tag("host\\", "a").with_field("v", 1))
            .unwrap_err();
        assert!(matches!(err, EncodingError::InvalidCharacter { .. }));

        // an inner backslash is fine
        let point = encode_record(&record("cpu").with_tag("path", "C:\\tmp").with_field("v", 1))
            .unwrap();
        assert_eq!(point.tags["path"], "C:\\tmp");
    }

    #[test]
    fn test_rejects_unsupported_field_types() {
        for (value, kind) in [
            (json!(null), "null"),
            (json!([1, 2]), "array"),
            (json!({"nested": 1}), "object"),
        ] {
            let err = encode_record(&record("cpu").with_field("bad", value)).unwrap_err();
            assert_eq!(
                err,
                EncodingError::UnsupportedFieldType {
                    field: "bad".into(),
                    kind
                }
            );
        }
    }

    #[test]
    fn test_rejects_unsigned_overflow() {
        let err = encode_record(&record("cpu").with_field("big", u64::MAX)).unwrap_err();
        assert!(matches!(err, EncodingError::IntegerOverflow { .. }));
    }

    #[test]
    fn test_single_invalid_record_fails_batch() {
        let encoder = BatchEncoder::new(settings());
        let records = vec![
            record("ok").with_field("v", 1),
            record("bad").with_field("v", json!(null)),
            record("ok2").with_field("v", 2),
        ];

        let err = encoder.encode(&records).unwrap_err();
        match err {
            OutputError::Encoding { index, name, .. } => {
                assert_eq!(index, 1);
                assert_eq!(name, "bad");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_batch_carries_settings() {
        let encoder = BatchEncoder::new(settings());
        let batch = encoder
            .encode(&[record("cpu").with_field("v", 1), record("mem").with_field("v", 2)])
            .unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.settings.retention_policy, "autogen");
        assert_eq!(batch.settings.write_consistency, "any");
    }
}
