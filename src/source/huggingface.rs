use hf_hub::api::sync::{ApiBuilder, ApiRepo};
use hf_hub::{Repo, RepoType};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

use crate::config::DatasetConfig;
use crate::constants::dataset::{SNAPSHOT_MANIFEST_DIR, SNAPSHOT_MANIFEST_VERSION};
use crate::data::Record;
use crate::errors::QueryError;

use super::{LabeledTextSource, SnapshotSource};

/// Record of a fully downloaded config/split snapshot.
///
/// Written only after every shard has been copied, so a snapshot left behind
/// by an interrupted download has no manifest and is fetched again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct SnapshotManifest {
    version: u32,
    dataset: String,
    config: String,
    split: String,
    /// Shard paths relative to the snapshot dir, in read order.
    shards: Vec<String>,
}

/// Source that materializes a Hugging Face dataset split into the local
/// snapshot directory on first load, then reads it as a `SnapshotSource`.
///
/// When a completed snapshot for the same dataset, config, and split is
/// already on disk, the hub is not contacted at all.
pub struct HuggingFaceSource {
    config: DatasetConfig,
}

impl HuggingFaceSource {
    /// Create a hub-backed source for `config.dataset`.
    pub fn new(config: DatasetConfig) -> Self {
        Self { config }
    }

    /// Active dataset config.
    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    fn repo_api(config: &DatasetConfig) -> Result<ApiRepo, QueryError> {
        let api = ApiBuilder::new()
            .with_progress(false)
            .with_retries(5)
            .build()
            .map_err(|err| QueryError::SourceUnavailable {
                source_id: config.source_id.clone(),
                reason: format!("failed building hf-hub client: {err}"),
            })?;
        Ok(api.repo(Repo::new(config.dataset.clone(), RepoType::Dataset)))
    }

    /// Select shard files for the configured config directory and split.
    ///
    /// Files under `<config>/` win when any exist; otherwise every split match
    /// is kept. The result is sorted so shard order is stable.
    pub fn select_remote_candidates<I>(
        config: &DatasetConfig,
        remote_paths: I,
    ) -> Result<Vec<String>, QueryError>
    where
        I: IntoIterator<Item = String>,
    {
        let accepted = config.normalized_shard_extensions();
        let mut saw_parquet = false;
        let mut candidates = Vec::new();

        for remote_path in remote_paths {
            let ext = Path::new(&remote_path)
                .extension()
                .and_then(|v| v.to_str())
                .map(|v| v.to_ascii_lowercase());
            if ext.as_deref() == Some("parquet") {
                saw_parquet = true;
            }
            if !ext
                .as_deref()
                .is_some_and(|ext| accepted.iter().any(|allowed| allowed == ext))
            {
                continue;
            }
            if !config.split.is_empty() && !Self::matches_split(&remote_path, &config.split) {
                continue;
            }
            candidates.push(remote_path);
        }

        if !config.config.is_empty() {
            let config_prefix = format!("{}/", config.config);
            if candidates.iter().any(|path| path.starts_with(&config_prefix)) {
                candidates.retain(|path| path.starts_with(&config_prefix));
            }
        }

        candidates.sort();
        if candidates.is_empty() {
            if saw_parquet && !accepted.iter().any(|value| value == "parquet") {
                return Err(QueryError::SourceUnavailable {
                    source_id: config.source_id.clone(),
                    reason: format!(
                        "dataset '{}' appears to be parquet-only, but shard_extensions does not include parquet ({:?})",
                        config.dataset, config.shard_extensions
                    ),
                });
            }
            return Err(QueryError::SourceUnavailable {
                source_id: config.source_id.clone(),
                reason: format!(
                    "no remote shard files found for dataset '{}' split '{}' with extensions {:?}",
                    config.dataset, config.split, config.shard_extensions
                ),
            });
        }
        Ok(candidates)
    }

    fn matches_split(remote_path: &str, split: &str) -> bool {
        let split_tag = format!("{split}/");
        let split_token = format!("-{split}-");
        let split_prefix = format!("{split}-");
        let split_file = format!("{split}.");
        remote_path.contains(&split_tag)
            || remote_path.contains(&split_token)
            || Path::new(remote_path)
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(&split_prefix) || name.starts_with(&split_file))
    }

    /// Download every selected shard and copy it under the snapshot dir.
    ///
    /// Returns the selected shard paths relative to the snapshot dir.
    fn fetch_remote_snapshot(&self) -> Result<Vec<String>, QueryError> {
        let config = &self.config;
        let started = Instant::now();
        let repo_api = Self::repo_api(config)?;

        info!(
            "[emotion:hf] reading remote file list for dataset {}",
            config.dataset
        );
        let info = repo_api.info().map_err(|err| QueryError::SourceUnavailable {
            source_id: config.source_id.clone(),
            reason: format!("failed reading hf-hub repository info: {err}"),
        })?;
        let candidates = Self::select_remote_candidates(
            config,
            info.siblings.into_iter().map(|sibling| sibling.rfilename),
        )?;
        info!(
            "[emotion:hf] remote candidates for split '{}': {}",
            config.split,
            candidates.len()
        );

        for remote_path in &candidates {
            info!("[emotion:hf] downloading shard {}", remote_path);
            let local_cached =
                repo_api
                    .get(remote_path)
                    .map_err(|err| QueryError::SourceUnavailable {
                        source_id: config.source_id.clone(),
                        reason: format!("failed downloading '{}' from hf-hub: {err}", remote_path),
                    })?;
            if !local_cached.exists() {
                return Err(QueryError::SourceUnavailable {
                    source_id: config.source_id.clone(),
                    reason: format!(
                        "hf-hub returned non-existent cache file for '{}' at {}",
                        remote_path,
                        local_cached.display()
                    ),
                });
            }
            let target = config.snapshot_dir.join(remote_path);
            Self::materialize_local_file(config, &local_cached, &target)?;
        }

        info!(
            "[emotion:hf] snapshot ready in {:.2}s ({} shard(s) in {})",
            started.elapsed().as_secs_f64(),
            candidates.len(),
            config.snapshot_dir.display()
        );
        Ok(candidates)
    }

    /// Copy a hub cache file to `target_path`, skipping the copy when a file of
    /// the same size is already there.
    fn materialize_local_file(
        config: &DatasetConfig,
        source_path: &Path,
        target_path: &Path,
    ) -> Result<(), QueryError> {
        let resolved_source =
            fs::canonicalize(source_path).unwrap_or_else(|_| source_path.to_path_buf());

        if let Some(parent) = target_path.parent() {
            fs::create_dir_all(parent).map_err(|err| QueryError::SourceUnavailable {
                source_id: config.source_id.clone(),
                reason: format!("failed creating snapshot subdir {}: {err}", parent.display()),
            })?;
        }

        if target_path.exists() {
            let src_len = Self::file_len(config, &resolved_source)?;
            let dst_len = Self::file_len(config, target_path)?;
            if src_len == dst_len {
                return Ok(());
            }
            warn!(
                "[emotion:hf] replacing incomplete shard {}",
                target_path.display()
            );
            fs::remove_file(target_path).map_err(|err| QueryError::SourceUnavailable {
                source_id: config.source_id.clone(),
                reason: format!(
                    "failed replacing target file {}: {err}",
                    target_path.display()
                ),
            })?;
        }

        fs::copy(&resolved_source, target_path).map_err(|err| QueryError::SourceUnavailable {
            source_id: config.source_id.clone(),
            reason: format!(
                "failed copying synced file {} -> {}: {err}",
                resolved_source.display(),
                target_path.display()
            ),
        })?;
        Ok(())
    }

    fn file_len(config: &DatasetConfig, path: &Path) -> Result<u64, QueryError> {
        fs::metadata(path)
            .map(|meta| meta.len())
            .map_err(|err| QueryError::SourceUnavailable {
                source_id: config.source_id.clone(),
                reason: format!("failed reading metadata {}: {err}", path.display()),
            })
    }

    /// Manifest path for the configured dataset, config, and split.
    pub fn manifest_path(config: &DatasetConfig) -> PathBuf {
        let name = format!("{}__{}__{}.json", config.dataset, config.config, config.split)
            .replace(['/', '\\'], "_");
        config.snapshot_dir.join(SNAPSHOT_MANIFEST_DIR).join(name)
    }

    /// Record `shards` (relative to the snapshot dir) as the complete snapshot
    /// for the configured dataset, config, and split.
    pub fn mark_snapshot_complete(
        config: &DatasetConfig,
        shards: &[String],
    ) -> Result<(), QueryError> {
        let path = Self::manifest_path(config);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| QueryError::SourceUnavailable {
                source_id: config.source_id.clone(),
                reason: format!("failed creating manifest dir {}: {err}", parent.display()),
            })?;
        }

        let manifest = SnapshotManifest {
            version: SNAPSHOT_MANIFEST_VERSION,
            dataset: config.dataset.clone(),
            config: config.config.clone(),
            split: config.split.clone(),
            shards: shards.to_vec(),
        };
        let raw = serde_json::to_vec_pretty(&manifest).map_err(|err| {
            QueryError::SourceUnavailable {
                source_id: config.source_id.clone(),
                reason: format!("failed encoding snapshot manifest {}: {err}", path.display()),
            }
        })?;

        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, raw).map_err(|err| QueryError::SourceUnavailable {
            source_id: config.source_id.clone(),
            reason: format!(
                "failed writing snapshot manifest temp {}: {err}",
                tmp_path.display()
            ),
        })?;
        fs::rename(&tmp_path, &path).map_err(|err| QueryError::SourceUnavailable {
            source_id: config.source_id.clone(),
            reason: format!("failed replacing snapshot manifest {}: {err}", path.display()),
        })?;
        Ok(())
    }

    /// Shards of a completed local snapshot matching the active config, if any.
    ///
    /// A missing, unreadable, or mismatched manifest, or one naming a shard
    /// that is no longer on disk, yields `None` so the snapshot is refetched.
    fn completed_shards(&self) -> Option<Vec<PathBuf>> {
        let config = &self.config;
        let path = Self::manifest_path(config);
        let raw = fs::read(&path).ok()?;
        let manifest = match serde_json::from_slice::<SnapshotManifest>(&raw) {
            Ok(manifest) => manifest,
            Err(err) => {
                warn!(
                    "[emotion:hf] ignoring unreadable snapshot manifest {}: {err}",
                    path.display()
                );
                return None;
            }
        };
        if manifest.version != SNAPSHOT_MANIFEST_VERSION
            || manifest.dataset != config.dataset
            || manifest.config != config.config
            || manifest.split != config.split
            || manifest.shards.is_empty()
        {
            warn!(
                "[emotion:hf] snapshot manifest {} does not match the active dataset",
                path.display()
            );
            return None;
        }

        let shards = manifest
            .shards
            .iter()
            .map(|shard| config.snapshot_dir.join(shard))
            .collect::<Vec<_>>();
        if let Some(missing) = shards.iter().find(|shard| !shard.is_file()) {
            warn!(
                "[emotion:hf] snapshot shard {} is missing, refetching",
                missing.display()
            );
            return None;
        }
        Some(shards)
    }
}

impl LabeledTextSource for HuggingFaceSource {
    fn id(&self) -> &str {
        &self.config.source_id
    }

    fn load(&self) -> Result<Vec<Record>, QueryError> {
        fs::create_dir_all(&self.config.snapshot_dir).map_err(|err| {
            QueryError::SourceUnavailable {
                source_id: self.config.source_id.clone(),
                reason: format!(
                    "failed creating snapshot_dir {}: {err}",
                    self.config.snapshot_dir.display()
                ),
            }
        })?;

        let shards = match self.completed_shards() {
            Some(shards) => shards,
            None => {
                info!(
                    "[emotion:hf] no completed snapshot for split '{}' in {}, fetching {} from hf-hub",
                    self.config.split,
                    self.config.snapshot_dir.display(),
                    self.config.dataset
                );
                let fetched = self.fetch_remote_snapshot()?;
                Self::mark_snapshot_complete(&self.config, &fetched)?;
                fetched
                    .iter()
                    .map(|shard| self.config.snapshot_dir.join(shard))
                    .collect()
            }
        };
        SnapshotSource::read_shards(&self.config, &shards)
    }
}
