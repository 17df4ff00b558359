use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::QueryError;

pub use crate::types::{EmotionName, LabelId, SourceId};

/// One of the six emotion categories in the dataset.
///
/// The discriminant is the integer label code used by the dataset, so the
/// label mapping is a fixed bijection: `sadness=0, joy=1, love=2, anger=3,
/// fear=4, surprise=5`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    /// Label `0`.
    Sadness = 0,
    /// Label `1`.
    Joy = 1,
    /// Label `2`.
    Love = 2,
    /// Label `3`.
    Anger = 3,
    /// Label `4`.
    Fear = 4,
    /// Label `5`.
    Surprise = 5,
}

impl Emotion {
    /// All emotions in label-code order.
    pub const ALL: [Emotion; 6] = [
        Emotion::Sadness,
        Emotion::Joy,
        Emotion::Love,
        Emotion::Anger,
        Emotion::Fear,
        Emotion::Surprise,
    ];

    /// Canonical lowercase name.
    pub const fn name(self) -> EmotionName {
        match self {
            Emotion::Sadness => "sadness",
            Emotion::Joy => "joy",
            Emotion::Love => "love",
            Emotion::Anger => "anger",
            Emotion::Fear => "fear",
            Emotion::Surprise => "surprise",
        }
    }

    /// Integer label code used by the dataset.
    pub const fn label(self) -> LabelId {
        self as LabelId
    }

    /// Resolve a raw label code through the label mapping.
    pub fn from_label(label: LabelId) -> Result<Self, QueryError> {
        Self::ALL
            .into_iter()
            .find(|emotion| emotion.label() == label)
            .ok_or(QueryError::UnknownLabel { label })
    }

    /// Comma-separated list of accepted names, in label-code order.
    pub fn accepted_names() -> String {
        Self::ALL
            .iter()
            .map(|emotion| emotion.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Emotion {
    type Err = QueryError;

    /// Parse an exact lowercase emotion name; surrounding whitespace is ignored.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|emotion| emotion.name() == trimmed)
            .ok_or_else(|| {
                QueryError::validation(
                    "emotion",
                    format!(
                        "unknown emotion '{trimmed}', expected one of: {}",
                        Self::accepted_names()
                    ),
                )
            })
    }
}

/// One dataset row: a text and its raw emotion code.
///
/// The code is kept exactly as loaded; resolving it to an `Emotion` happens
/// at query time so a foreign code surfaces as `QueryError::UnknownLabel`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Non-empty text content.
    pub text: String,
    /// Raw label code, expected in `0..=5`.
    pub label: LabelId,
}

impl Record {
    /// Build a record from text and a known emotion.
    pub fn new(text: impl Into<String>, emotion: Emotion) -> Self {
        Self {
            text: text.into(),
            label: emotion.label(),
        }
    }

    /// Resolve this record's emotion through the label mapping.
    pub fn emotion(&self) -> Result<Emotion, QueryError> {
        Emotion::from_label(self.label)
    }
}

/// Immutable, fully loaded labeled-text table.
#[derive(Debug)]
pub struct Dataset {
    source_id: SourceId,
    records: Vec<Record>,
    loaded_at: DateTime<Utc>,
}

impl Dataset {
    /// Wrap loaded records; order is preserved as the scan order.
    pub fn new(source_id: impl Into<SourceId>, records: Vec<Record>) -> Self {
        Self {
            source_id: source_id.into(),
            records,
            loaded_at: Utc::now(),
        }
    }

    /// Source that produced this table.
    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    /// Records in storage order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` when the table has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Time the table finished loading.
    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_mapping_is_a_bijection() {
        for (code, emotion) in Emotion::ALL.iter().enumerate() {
            assert_eq!(emotion.label(), code as LabelId);
            assert_eq!(Emotion::from_label(code as LabelId).unwrap(), *emotion);
            assert_eq!(emotion.name().parse::<Emotion>().unwrap(), *emotion);
        }
    }

    #[test]
    fn unknown_label_is_reported() {
        let err = Emotion::from_label(6).unwrap_err();
        assert!(matches!(err, QueryError::UnknownLabel { label: 6 }));
        assert!(!err.is_validation());
        assert!(Emotion::from_label(-1).is_err());
    }

    #[test]
    fn parsing_rejects_names_outside_the_set() {
        let err = "excited".parse::<Emotion>().unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("'emotion'"));
        assert!("Joy".parse::<Emotion>().is_err());
        assert_eq!("  fear ".parse::<Emotion>().unwrap(), Emotion::Fear);
    }

    #[test]
    fn serializes_as_lowercase_name() {
        let value = serde_json::to_value(Emotion::Surprise).unwrap();
        assert_eq!(value, serde_json::json!("surprise"));
    }
}
