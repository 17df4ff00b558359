use std::io;

use thiserror::Error;

use crate::types::{LabelId, ParamName, SourceId};

/// Error type for parameter validation, dataset loading, and label resolution failures.
#[derive(Debug, Error)]
pub enum QueryError {
    /// A tool parameter failed its declared constraint.
    #[error("invalid parameter '{param}': {reason}")]
    Validation {
        /// Offending parameter name.
        param: ParamName,
        /// Constraint that was violated.
        reason: String,
    },
    /// The data source could not be reached or read.
    #[error("data source '{source_id}' is unavailable: {reason}")]
    SourceUnavailable {
        /// Source that failed.
        source_id: SourceId,
        /// Underlying failure.
        reason: String,
    },
    /// The data source produced rows that could not be decoded.
    #[error("data source '{source_id}' returned inconsistent state: {details}")]
    SourceInconsistent {
        /// Source that produced the rows.
        source_id: SourceId,
        /// Shard/row location and decode failure.
        details: String,
    },
    /// A stored label code has no entry in the emotion mapping.
    #[error("label {label} has no emotion mapping")]
    UnknownLabel {
        /// The unmapped code.
        label: LabelId,
    },
    /// Filesystem failure outside a specific source.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl QueryError {
    /// Build a validation error for `param`.
    pub fn validation(param: ParamName, reason: impl Into<String>) -> Self {
        Self::Validation {
            param,
            reason: reason.into(),
        }
    }

    /// Returns `true` when a parameter was rejected before any data access.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Returns `true` when the dataset could not be fetched or decoded.
    pub fn is_load(&self) -> bool {
        matches!(
            self,
            Self::SourceUnavailable { .. } | Self::SourceInconsistent { .. } | Self::Io(_)
        )
    }
}
