/// Constants describing the default dataset and its on-disk snapshot layout.
pub mod dataset {
    /// Source id used in logs and error reports for the default dataset.
    pub const DEFAULT_SOURCE_ID: &str = "emotion";
    /// Hugging Face dataset repository id.
    pub const DEFAULT_DATASET: &str = "dair-ai/emotion";
    /// Dataset config name (also the repository directory holding its shards).
    pub const DEFAULT_CONFIG: &str = "split";
    /// Split served by the query tools.
    pub const DEFAULT_SPLIT: &str = "train";
    /// Default local directory for materialized shard files.
    pub const DEFAULT_SNAPSHOT_DIR: &str = ".emotion_snapshot";
    /// Column holding the record text.
    pub const DEFAULT_TEXT_COLUMN: &str = "text";
    /// Column holding the integer emotion code.
    pub const DEFAULT_LABEL_COLUMN: &str = "label";
    /// Snapshot subdirectory holding completed-download manifests.
    pub const SNAPSHOT_MANIFEST_DIR: &str = "_manifest";
    /// Format version of completed-download manifests.
    pub const SNAPSHOT_MANIFEST_VERSION: u32 = 1;
    /// Shard extensions read from the snapshot directory.
    #[cfg(feature = "huggingface")]
    pub const DEFAULT_SHARD_EXTENSIONS: &[&str] = &["parquet", "jsonl", "ndjson"];
    /// Shard extensions read from the snapshot directory.
    #[cfg(not(feature = "huggingface"))]
    pub const DEFAULT_SHARD_EXTENSIONS: &[&str] = &["jsonl", "ndjson"];
}

/// Environment variables consulted by `DatasetConfig::with_env_overrides`.
pub mod env {
    /// Overrides the dataset repository id.
    pub const DATASET: &str = "EMOTION_DATASET";
    /// Overrides the dataset config name.
    pub const DATASET_CONFIG: &str = "EMOTION_DATASET_CONFIG";
    /// Overrides the split name.
    pub const DATASET_SPLIT: &str = "EMOTION_DATASET_SPLIT";
    /// Overrides the snapshot directory.
    pub const SNAPSHOT_DIR: &str = "EMOTION_SNAPSHOT_DIR";
    /// Caps the number of rows loaded.
    pub const MAX_ROWS: &str = "EMOTION_MAX_ROWS";
}

/// Parameter bounds enforced before any data access.
pub mod limits {
    /// Smallest accepted `get_sample` size.
    pub const SAMPLE_MIN: i64 = 1;
    /// Largest accepted `get_sample` size.
    pub const SAMPLE_MAX: i64 = 100;
    /// `get_sample` size used when the caller omits `n`.
    pub const SAMPLE_DEFAULT: i64 = 3;
    /// Smallest accepted `search_text` limit.
    pub const SEARCH_LIMIT_MIN: i64 = 1;
    /// Largest accepted `search_text` limit.
    pub const SEARCH_LIMIT_MAX: i64 = 100;
    /// `search_text` limit used when the caller omits `limit`.
    pub const SEARCH_LIMIT_DEFAULT: i64 = 10;
    /// Minimum query length in characters, measured after trimming.
    pub const QUERY_MIN_CHARS: usize = 1;
    /// Maximum query length in characters, measured after trimming.
    pub const QUERY_MAX_CHARS: usize = 200;
}

/// Tool names exposed at the tool-call boundary.
pub mod tools {
    /// Random sampling.
    pub const GET_SAMPLE: &str = "get_sample";
    /// Count for one emotion.
    pub const COUNT_BY_EMOTION: &str = "count_by_emotion";
    /// Case-insensitive substring search.
    pub const SEARCH_TEXT: &str = "search_text";
    /// Full label distribution.
    pub const ANALYZE_EMOTION_DISTRIBUTION: &str = "analyze_emotion_distribution";
}

/// Identity and protocol constants for the stdio server.
pub mod server {
    /// Name reported in `initialize` responses.
    pub const SERVER_NAME: &str = "emotion_mcp";
    /// MCP protocol revision advertised during `initialize`.
    pub const PROTOCOL_VERSION: &str = "2024-11-05";
    /// JSON-RPC version string required on every request.
    pub const JSONRPC_VERSION: &str = "2.0";
}
