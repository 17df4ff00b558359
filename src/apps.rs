use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, error::ErrorKind};
use serde_json::Value;
use tracing::info;

use crate::cache::DatasetCache;
use crate::config::{DatasetConfig, parse_max_rows};
use crate::mcp::McpServer;
use crate::queries::EmotionQueries;
use crate::source::LabeledTextSource;
use crate::tools::{ToolRouter, definitions};
use crate::types::ToolName;

#[derive(Debug, Parser)]
#[command(
    name = "emotion-mcp",
    disable_help_subcommand = true,
    about = "Query the emotion dataset over MCP stdio",
    long_about = "Serve read-only sampling, counting, search, and distribution tools over the dair-ai/emotion dataset as a newline-delimited JSON-RPC (MCP) server on stdin/stdout.",
    after_help = "Dataset settings are resolved in order by explicit flag, EMOTION_* environment variables, then built-in defaults. Logs go to stderr (filter with RUST_LOG)."
)]
/// CLI for `emotion-mcp`.
///
/// Common usage:
/// - Serve over stdio: `emotion-mcp`
/// - Load before accepting requests: `emotion-mcp --preload`
/// - Run one tool and exit: `emotion-mcp --call search_text --args '{"query":"happy"}'`
struct EmotionMcpCli {
    #[arg(long, value_name = "REPO_ID", help = "Hugging Face dataset id")]
    dataset: Option<String>,
    #[arg(long = "config", value_name = "NAME", help = "Dataset config name")]
    dataset_config: Option<String>,
    #[arg(long, value_name = "SPLIT", help = "Dataset split to serve")]
    split: Option<String>,
    #[arg(
        long = "snapshot-dir",
        value_name = "DIR",
        help = "Directory holding (or receiving) local shard files"
    )]
    snapshot_dir: Option<PathBuf>,
    #[arg(
        long = "max-rows",
        value_parser = parse_max_rows,
        help = "Optional cap on the number of rows loaded"
    )]
    max_rows: Option<usize>,
    #[arg(
        long,
        help = "Load the dataset before serving instead of on the first tool call"
    )]
    preload: bool,
    #[arg(long = "list-tools", help = "Print tool definitions as JSON and exit")]
    list_tools: bool,
    #[arg(
        long,
        value_name = "TOOL",
        conflicts_with = "list_tools",
        help = "Run a single tool, print its payload, and exit"
    )]
    call: Option<ToolName>,
    #[arg(
        long,
        value_name = "JSON",
        requires = "call",
        value_parser = parse_json_arg,
        help = "JSON object of tool arguments for --call"
    )]
    args: Option<Value>,
}

impl EmotionMcpCli {
    fn dataset_config(&self) -> DatasetConfig {
        let mut config = DatasetConfig::default().with_env_overrides();
        if let Some(dataset) = &self.dataset {
            config.dataset = dataset.clone();
        }
        if let Some(name) = &self.dataset_config {
            config.config = name.clone();
        }
        if let Some(split) = &self.split {
            config.split = split.clone();
        }
        if let Some(dir) = &self.snapshot_dir {
            config.snapshot_dir = dir.clone();
        }
        if self.max_rows.is_some() {
            config.max_rows = self.max_rows;
        }
        config
    }
}

/// Run the `emotion-mcp` binary with process arguments (without argv[0]).
pub fn run_emotion_mcp<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();

    let Some(cli) =
        parse_cli::<EmotionMcpCli, _>(std::iter::once("emotion-mcp".to_string()).chain(args_iter))?
    else {
        return Ok(());
    };

    if cli.list_tools {
        println!("{}", serde_json::to_string_pretty(&definitions())?);
        return Ok(());
    }

    let config = cli.dataset_config();
    info!(
        "[emotion:app] dataset={} config={} split={} snapshot_dir={}",
        config.dataset,
        config.config,
        config.split,
        config.snapshot_dir.display()
    );
    let cache = Arc::new(DatasetCache::new(default_source(config)));
    if cli.preload {
        cache.ensure_loaded()?;
    }
    let router = ToolRouter::new(EmotionQueries::new(cache));

    if let Some(tool) = cli.call {
        let payload = router
            .call(&tool, cli.args.as_ref())
            .ok_or_else(|| format!("unknown tool '{tool}'"))?;
        println!("{payload}");
        return Ok(());
    }

    McpServer::new(router).serve_stdio()?;
    Ok(())
}

#[cfg(feature = "huggingface")]
fn default_source(config: DatasetConfig) -> Arc<dyn LabeledTextSource> {
    Arc::new(crate::source::HuggingFaceSource::new(config))
}

#[cfg(not(feature = "huggingface"))]
fn default_source(config: DatasetConfig) -> Arc<dyn LabeledTextSource> {
    Arc::new(crate::source::SnapshotSource::new(config))
}

fn parse_json_arg(raw: &str) -> Result<Value, String> {
    let value = serde_json::from_str::<Value>(raw)
        .map_err(|err| format!("--args is not valid JSON: {err}"))?;
    if !value.is_object() {
        return Err("--args must be a JSON object".to_string());
    }
    Ok(value)
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}
