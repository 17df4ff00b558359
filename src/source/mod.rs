//! Labeled-text data sources.
//!
//! Ownership model:
//! - `LabeledTextSource` yields the full record table in storage order.
//! - `DatasetCache` owns the loaded table; sources are never asked twice
//!   once a load has succeeded.
//! - Row decoding from JSON payloads is shared by every file-backed source.

use serde_json::Value;
use std::sync::Arc;

use crate::data::Record;
use crate::errors::QueryError;
use crate::types::{LabelId, SourceId};

/// Hugging Face hub download into a local snapshot directory.
#[cfg(feature = "huggingface")]
pub mod huggingface;
/// Local shard-file source (jsonl/ndjson, and parquet with the `huggingface` feature).
pub mod snapshot;

#[cfg(feature = "huggingface")]
pub use huggingface::HuggingFaceSource;
pub use snapshot::SnapshotSource;

/// Producer of the full labeled-text table.
///
/// `load` must return records in a stable storage order; that order is the
/// scan order used by substring search.
pub trait LabeledTextSource: Send + Sync {
    /// Stable source identifier used in logs and error reports.
    fn id(&self) -> &str;
    /// Fetch and decode every record.
    fn load(&self) -> Result<Vec<Record>, QueryError>;
}

/// Fixed, already-decoded records.
pub struct InMemorySource {
    id: SourceId,
    records: Arc<Vec<Record>>,
}

impl InMemorySource {
    /// Create an in-memory source from prebuilt records.
    pub fn new(id: impl Into<SourceId>, records: Vec<Record>) -> Self {
        Self {
            id: id.into(),
            records: Arc::new(records),
        }
    }
}

impl LabeledTextSource for InMemorySource {
    fn id(&self) -> &str {
        &self.id
    }

    fn load(&self) -> Result<Vec<Record>, QueryError> {
        Ok(self.records.as_ref().clone())
    }
}

/// Decode one JSON row into a `Record`.
///
/// Accepts either a bare object or a `{"row": {...}}` wrapper. `location`
/// describes the row for error messages (shard path and row number).
pub fn record_from_row(
    source_id: &str,
    row_value: &Value,
    text_column: &str,
    label_column: &str,
    location: impl Fn() -> String,
) -> Result<Record, QueryError> {
    let row_payload = row_value.get("row").unwrap_or(row_value);
    let row_obj = row_payload
        .as_object()
        .ok_or_else(|| QueryError::SourceInconsistent {
            source_id: source_id.to_string(),
            details: format!("{} is not a JSON object", location()),
        })?;

    let text = row_obj
        .get(text_column)
        .and_then(Value::as_str)
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| QueryError::SourceInconsistent {
            source_id: source_id.to_string(),
            details: format!(
                "{} has no non-empty string column '{}'",
                location(),
                text_column
            ),
        })?;

    let label = row_obj
        .get(label_column)
        .and_then(value_to_label)
        .ok_or_else(|| QueryError::SourceInconsistent {
            source_id: source_id.to_string(),
            details: format!("{} has no integer column '{}'", location(), label_column),
        })?;

    Ok(Record {
        text: text.to_string(),
        label,
    })
}

fn value_to_label(value: &Value) -> Option<LabelId> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(raw) => raw.trim().parse::<LabelId>().ok(),
        _ => None,
    }
}
