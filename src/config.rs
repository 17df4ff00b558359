use std::env;
use std::path::PathBuf;

use tracing::warn;

use crate::constants::dataset::{
    DEFAULT_CONFIG, DEFAULT_DATASET, DEFAULT_LABEL_COLUMN, DEFAULT_SHARD_EXTENSIONS,
    DEFAULT_SNAPSHOT_DIR, DEFAULT_SOURCE_ID, DEFAULT_SPLIT, DEFAULT_TEXT_COLUMN,
};
use crate::constants::env as env_keys;
use crate::types::SourceId;

/// Identity and local layout of the labeled-text dataset.
#[derive(Clone, Debug)]
pub struct DatasetConfig {
    /// Stable source id used in logs and error reports.
    pub source_id: SourceId,
    /// Hugging Face dataset id, e.g. `dair-ai/emotion`.
    pub dataset: String,
    /// Dataset config name, e.g. `split`. Also the repository directory holding its shards.
    pub config: String,
    /// Split name, e.g. `train`.
    pub split: String,
    /// Local directory that holds (or will receive) shard files for this split.
    pub snapshot_dir: PathBuf,
    /// File extensions accepted as shard files.
    pub shard_extensions: Vec<String>,
    /// Column holding the record text.
    pub text_column: String,
    /// Column holding the integer emotion code.
    pub label_column: String,
    /// Optional cap on the number of rows loaded.
    pub max_rows: Option<usize>,
}

impl DatasetConfig {
    /// Create a config with required dataset identity values and local snapshot path.
    pub fn new(
        source_id: impl Into<SourceId>,
        dataset: impl Into<String>,
        config: impl Into<String>,
        split: impl Into<String>,
        snapshot_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            dataset: dataset.into(),
            config: config.into(),
            split: split.into(),
            snapshot_dir: snapshot_dir.into(),
            shard_extensions: DEFAULT_SHARD_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            text_column: DEFAULT_TEXT_COLUMN.to_string(),
            label_column: DEFAULT_LABEL_COLUMN.to_string(),
            max_rows: None,
        }
    }

    /// Apply `EMOTION_*` environment overrides on top of this config.
    ///
    /// An `EMOTION_MAX_ROWS` that is not a positive integer is ignored with a
    /// warning.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(non_empty_var)
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(value) = lookup(env_keys::DATASET) {
            self.dataset = value;
        }
        if let Some(value) = lookup(env_keys::DATASET_CONFIG) {
            self.config = value;
        }
        if let Some(value) = lookup(env_keys::DATASET_SPLIT) {
            self.split = value;
        }
        if let Some(value) = lookup(env_keys::SNAPSHOT_DIR) {
            self.snapshot_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup(env_keys::MAX_ROWS) {
            match parse_max_rows(&value) {
                Ok(cap) => self.max_rows = Some(cap),
                Err(reason) => warn!(
                    "[emotion:config] ignoring {}='{}': {reason}",
                    env_keys::MAX_ROWS,
                    value
                ),
            }
        }
        self
    }

    /// Lowercased shard extensions without leading dots.
    pub fn normalized_shard_extensions(&self) -> Vec<String> {
        self.shard_extensions
            .iter()
            .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect()
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self::new(
            DEFAULT_SOURCE_ID,
            DEFAULT_DATASET,
            DEFAULT_CONFIG,
            DEFAULT_SPLIT,
            DEFAULT_SNAPSHOT_DIR,
        )
    }
}

/// Parse a row cap; zero and non-integers are rejected.
pub fn parse_max_rows(raw: &str) -> Result<usize, String> {
    let parsed = raw
        .trim()
        .parse::<usize>()
        .map_err(|_| format!("could not parse max rows value '{raw}' as a positive integer"))?;
    if parsed == 0 {
        return Err("max rows must be greater than zero".to_string());
    }
    Ok(parsed)
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
