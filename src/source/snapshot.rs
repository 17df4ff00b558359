use rayon::prelude::*;
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};
use walkdir::WalkDir;

#[cfg(feature = "huggingface")]
use parquet::file::reader::{FileReader, SerializedFileReader};
#[cfg(feature = "huggingface")]
use parquet::record::reader::RowIter;

use crate::config::DatasetConfig;
use crate::data::Record;
use crate::errors::QueryError;

use super::{LabeledTextSource, record_from_row};

/// Source backed by shard files already present under `snapshot_dir`.
///
/// Shards are visited in sorted path order and rows in file order, so the
/// resulting table order is stable across runs.
pub struct SnapshotSource {
    config: DatasetConfig,
}

impl SnapshotSource {
    /// Create a source reading shards under `config.snapshot_dir`.
    pub fn new(config: DatasetConfig) -> Self {
        Self { config }
    }

    /// Active dataset config.
    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    /// List accepted shard files under the snapshot dir in sorted order.
    ///
    /// Errors when no accepted shard exists, or when parquet shards exist but
    /// parquet is not an accepted extension.
    pub fn discover_shards(config: &DatasetConfig) -> Result<Vec<PathBuf>, QueryError> {
        let accepted = config.normalized_shard_extensions();
        let mut shard_paths = Vec::new();
        let mut saw_parquet = false;

        for entry in WalkDir::new(&config.snapshot_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(Result::ok)
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(ext) = entry.path().extension().and_then(|v| v.to_str()) else {
                continue;
            };
            let ext = ext.to_ascii_lowercase();
            if ext == "parquet" {
                saw_parquet = true;
            }
            if accepted.iter().any(|allowed| allowed == &ext) {
                shard_paths.push(entry.path().to_path_buf());
            }
        }

        shard_paths.sort();
        if shard_paths.is_empty() {
            if saw_parquet && !accepted.iter().any(|value| value == "parquet") {
                return Err(QueryError::SourceUnavailable {
                    source_id: config.source_id.clone(),
                    reason: format!(
                        "found parquet files under {}, but shard_extensions does not include parquet",
                        config.snapshot_dir.display()
                    ),
                });
            }
            return Err(QueryError::SourceUnavailable {
                source_id: config.source_id.clone(),
                reason: format!(
                    "no shard files found under {} with extensions {:?}",
                    config.snapshot_dir.display(),
                    config.shard_extensions
                ),
            });
        }
        Ok(shard_paths)
    }

    /// Decode `shards` in parallel and concatenate them in the given order.
    ///
    /// `config.max_rows` truncates the concatenated table.
    pub fn read_shards(
        config: &DatasetConfig,
        shards: &[PathBuf],
    ) -> Result<Vec<Record>, QueryError> {
        let started = Instant::now();
        let decoded = shards
            .par_iter()
            .map(|path| {
                debug!("[emotion:snapshot] decoding shard {}", path.display());
                Self::read_shard(config, path)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut records = Vec::with_capacity(decoded.iter().map(Vec::len).sum());
        for shard_records in decoded {
            records.extend(shard_records);
        }
        if let Some(max_rows) = config.max_rows {
            records.truncate(max_rows);
        }

        info!(
            "[emotion:snapshot] decoded {} rows from {} shard(s) in {:.2}s",
            records.len(),
            shards.len(),
            started.elapsed().as_secs_f64()
        );
        Ok(records)
    }

    fn read_shard(config: &DatasetConfig, path: &Path) -> Result<Vec<Record>, QueryError> {
        let is_parquet = path
            .extension()
            .and_then(|v| v.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("parquet"));
        if is_parquet {
            return Self::read_parquet_shard(config, path);
        }
        Self::read_json_lines_shard(config, path)
    }

    fn read_json_lines_shard(
        config: &DatasetConfig,
        path: &Path,
    ) -> Result<Vec<Record>, QueryError> {
        let file = File::open(path).map_err(|err| QueryError::SourceUnavailable {
            source_id: config.source_id.clone(),
            reason: format!("failed opening shard {}: {err}", path.display()),
        })?;
        let reader = BufReader::new(file);
        let mut records = Vec::new();

        for (line_no, line) in reader.lines().enumerate() {
            let line = line.map_err(|err| QueryError::SourceUnavailable {
                source_id: config.source_id.clone(),
                reason: format!("failed reading shard {}: {err}", path.display()),
            })?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let row_value = serde_json::from_str::<Value>(trimmed).map_err(|err| {
                QueryError::SourceInconsistent {
                    source_id: config.source_id.clone(),
                    details: format!(
                        "failed decoding JSON row {} in shard {}: {err}",
                        line_no + 1,
                        path.display()
                    ),
                }
            })?;
            records.push(record_from_row(
                &config.source_id,
                &row_value,
                &config.text_column,
                &config.label_column,
                || format!("row {} in shard {}", line_no + 1, path.display()),
            )?);
        }
        Ok(records)
    }

    #[cfg(feature = "huggingface")]
    fn read_parquet_shard(config: &DatasetConfig, path: &Path) -> Result<Vec<Record>, QueryError> {
        let file = File::open(path).map_err(|err| QueryError::SourceUnavailable {
            source_id: config.source_id.clone(),
            reason: format!("failed opening parquet shard {}: {err}", path.display()),
        })?;
        let reader =
            SerializedFileReader::new(file).map_err(|err| QueryError::SourceUnavailable {
                source_id: config.source_id.clone(),
                reason: format!("failed reading parquet shard {}: {err}", path.display()),
            })?;

        let mut records = Vec::new();
        let mut row_no = 0usize;
        for group_pos in 0..reader.num_row_groups() {
            let row_group = reader.get_row_group(group_pos).map_err(|err| {
                QueryError::SourceUnavailable {
                    source_id: config.source_id.clone(),
                    reason: format!(
                        "failed opening parquet row group {} for {}: {err}",
                        group_pos,
                        path.display()
                    ),
                }
            })?;
            let iter = RowIter::from_row_group(None, row_group.as_ref()).map_err(|err| {
                QueryError::SourceUnavailable {
                    source_id: config.source_id.clone(),
                    reason: format!(
                        "failed iterating parquet row group {} for {}: {err}",
                        group_pos,
                        path.display()
                    ),
                }
            })?;
            for row_result in iter {
                row_no += 1;
                let row = row_result.map_err(|err| QueryError::SourceUnavailable {
                    source_id: config.source_id.clone(),
                    reason: format!(
                        "failed reading parquet row {} in shard {}: {err}",
                        row_no,
                        path.display()
                    ),
                })?;
                let row_value = row.to_json_value();
                records.push(record_from_row(
                    &config.source_id,
                    &row_value,
                    &config.text_column,
                    &config.label_column,
                    || format!("row {} in shard {}", row_no, path.display()),
                )?);
            }
        }
        Ok(records)
    }

    #[cfg(not(feature = "huggingface"))]
    fn read_parquet_shard(config: &DatasetConfig, path: &Path) -> Result<Vec<Record>, QueryError> {
        Err(QueryError::SourceUnavailable {
            source_id: config.source_id.clone(),
            reason: format!(
                "parquet shard {} requires the `huggingface` feature",
                path.display()
            ),
        })
    }
}

impl LabeledTextSource for SnapshotSource {
    fn id(&self) -> &str {
        &self.config.source_id
    }

    fn load(&self) -> Result<Vec<Record>, QueryError> {
        info!(
            "[emotion:snapshot] indexing local shards in {}",
            self.config.snapshot_dir.display()
        );
        let shards = Self::discover_shards(&self.config)?;
        Self::read_shards(&self.config, &shards)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Emotion;
    use std::fs;
    use tempfile::tempdir;

    fn test_config(snapshot_dir: PathBuf) -> DatasetConfig {
        let mut config =
            DatasetConfig::new("snapshot_test", "org/emotion", "split", "train", snapshot_dir);
        config.shard_extensions = vec!["jsonl".to_string(), "ndjson".to_string()];
        config
    }

    #[test]
    fn discover_shards_sorts_and_filters_by_extension() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("split")).unwrap();
        fs::write(temp.path().join("split/b.jsonl"), "").unwrap();
        fs::write(temp.path().join("a.NDJSON"), "").unwrap();
        fs::write(temp.path().join("notes.txt"), "").unwrap();

        let shards = SnapshotSource::discover_shards(&test_config(temp.path().to_path_buf()))
            .unwrap();
        assert_eq!(
            shards,
            vec![temp.path().join("a.NDJSON"), temp.path().join("split/b.jsonl")]
        );
    }

    #[test]
    fn discover_shards_errors_when_parquet_present_but_not_accepted() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("train-00000.parquet"), b"PAR1").unwrap();
        let err = SnapshotSource::discover_shards(&test_config(temp.path().to_path_buf()))
            .unwrap_err();
        assert!(err.is_load());
        assert!(err.to_string().contains("does not include parquet"));
    }

    #[test]
    fn discover_shards_errors_on_empty_dir() {
        let temp = tempdir().unwrap();
        let err = SnapshotSource::discover_shards(&test_config(temp.path().to_path_buf()))
            .unwrap_err();
        assert!(err.to_string().contains("no shard files found"));
    }

    #[test]
    fn read_shards_keeps_shard_then_row_order_and_applies_cap() {
        let temp = tempdir().unwrap();
        fs::write(
            temp.path().join("part-0.jsonl"),
            "{\"text\":\"first\",\"label\":1}\n\n{\"text\":\"second\",\"label\":0}\n",
        )
        .unwrap();
        fs::write(
            temp.path().join("part-1.jsonl"),
            "{\"text\":\"third\",\"label\":4}\n",
        )
        .unwrap();
        let mut config = test_config(temp.path().to_path_buf());

        let records = SnapshotSource::new(config.clone()).load().unwrap();
        assert_eq!(
            records,
            vec![
                Record::new("first", Emotion::Joy),
                Record::new("second", Emotion::Sadness),
                Record::new("third", Emotion::Fear),
            ]
        );

        config.max_rows = Some(2);
        let capped = SnapshotSource::new(config).load().unwrap();
        assert_eq!(capped.len(), 2);
        assert_eq!(capped[1].text, "second");
    }

    #[test]
    fn read_shards_reports_malformed_json_with_location() {
        let temp = tempdir().unwrap();
        let shard = temp.path().join("part-0.jsonl");
        fs::write(&shard, "{\"text\":\"ok\",\"label\":1}\n{not json}\n").unwrap();
        let err = SnapshotSource::new(test_config(temp.path().to_path_buf()))
            .load()
            .unwrap_err();
        assert!(matches!(err, QueryError::SourceInconsistent { .. }));
        assert!(err.to_string().contains("row 2"));
    }

    #[cfg(feature = "huggingface")]
    #[test]
    fn read_shards_decodes_parquet_rows() {
        use parquet::data_type::{ByteArray, ByteArrayType, Int64Type};
        use parquet::file::properties::WriterProperties;
        use parquet::file::writer::SerializedFileWriter;
        use parquet::schema::parser::parse_message_type;
        use std::sync::Arc;

        let temp = tempdir().unwrap();
        let path = temp.path().join("train-00000-of-00001.parquet");
        let schema = Arc::new(
            parse_message_type(
                "message emotion_schema {
                    REQUIRED BINARY text (UTF8);
                    REQUIRED INT64 label;
                }",
            )
            .unwrap(),
        );
        let props = Arc::new(WriterProperties::builder().build());
        let file = File::create(&path).unwrap();
        let mut writer = SerializedFileWriter::new(file, schema, props).unwrap();
        let mut row_group = writer.next_row_group().unwrap();

        if let Some(mut col_writer) = row_group.next_column().unwrap() {
            let values = ["i am so happy", "i feel sad"]
                .iter()
                .map(|text| ByteArray::from(*text))
                .collect::<Vec<_>>();
            col_writer
                .typed::<ByteArrayType>()
                .write_batch(&values, None, None)
                .unwrap();
            col_writer.close().unwrap();
        }
        if let Some(mut col_writer) = row_group.next_column().unwrap() {
            col_writer
                .typed::<Int64Type>()
                .write_batch(&[1, 0], None, None)
                .unwrap();
            col_writer.close().unwrap();
        }
        assert!(row_group.next_column().unwrap().is_none());
        row_group.close().unwrap();
        writer.close().unwrap();

        let mut config = test_config(temp.path().to_path_buf());
        config.shard_extensions = vec!["parquet".to_string()];
        let records = SnapshotSource::new(config).load().unwrap();
        assert_eq!(
            records,
            vec![
                Record::new("i am so happy", Emotion::Joy),
                Record::new("i feel sad", Emotion::Sadness),
            ]
        );
    }
}
