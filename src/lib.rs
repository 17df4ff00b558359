#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// CLI runner for the `emotion-mcp` binary.
pub mod apps;
/// Lazily loaded dataset holder.
pub mod cache;
/// Dataset identity and snapshot configuration.
pub mod config;
/// Centralized constants used across sources, queries, and the server.
pub mod constants;
/// Emotion labels, records, and the loaded table.
pub mod data;
/// MCP JSON-RPC server over stdio.
pub mod mcp;
/// The four read-only dataset operations.
pub mod queries;
/// Labeled-text data sources.
pub mod source;
/// Tool definitions, parameter decoding, and payload rendering.
pub mod tools;
/// Shared type aliases.
pub mod types;
/// Numeric and text helpers.
pub mod utils;

mod errors;

pub use cache::DatasetCache;
pub use config::DatasetConfig;
pub use data::{Dataset, Emotion, Record};
pub use errors::QueryError;
pub use mcp::McpServer;
pub use queries::{
    DistributionEntry, EmotionCount, EmotionDistribution, EmotionQueries, LabeledText,
    SearchResults,
};
#[cfg(feature = "huggingface")]
pub use source::HuggingFaceSource;
pub use source::{InMemorySource, LabeledTextSource, SnapshotSource};
pub use tools::{ToolDefinition, ToolRouter};
pub use types::{EmotionName, LabelId, SourceId};
