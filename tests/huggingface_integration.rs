#![cfg(feature = "huggingface")]

use std::fs;

use emotion_query::{
    DatasetConfig, Emotion, EmotionQueries, HuggingFaceSource, LabeledTextSource, SnapshotSource,
};

fn write_lines(path: &std::path::Path, lines: &[&str]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("failed creating shard dir");
    }
    let mut body = lines.join("\n");
    body.push('\n');
    fs::write(path, body).expect("failed writing snapshot shard");
}

#[test]
fn huggingface_reads_local_jsonl_snapshot() {
    let temp = tempfile::tempdir().expect("failed creating tempdir");
    write_lines(
        &temp.path().join("split/train-00000.jsonl"),
        &[
            r#"{"text":"i am so happy","label":1}"#,
            r#"{"text":"i feel sad","label":0}"#,
        ],
    );
    write_lines(
        &temp.path().join("split/train-00001.ndjson"),
        &[
            r#"{"text":"i love this","label":2}"#,
            r#"{"text":"i am happy again","label":1}"#,
        ],
    );

    let config = DatasetConfig::new(
        "hf_local_jsonl",
        "local/emotion",
        "split",
        "train",
        temp.path(),
    );
    HuggingFaceSource::mark_snapshot_complete(
        &config,
        &[
            "split/train-00000.jsonl".to_string(),
            "split/train-00001.ndjson".to_string(),
        ],
    )
    .expect("failed marking snapshot complete");
    let source = HuggingFaceSource::new(config);
    assert_eq!(source.id(), "hf_local_jsonl");

    let queries = EmotionQueries::from_source(source);
    let count = queries.count_by_emotion(Emotion::Joy).unwrap();
    assert_eq!((count.count, count.total, count.percentage), (2, 4, 50.0));

    let search = queries.search_text("happy", 10).unwrap();
    let texts = search
        .results
        .iter()
        .map(|row| row.text.as_str())
        .collect::<Vec<_>>();
    assert_eq!(texts, vec!["i am so happy", "i am happy again"]);
}

#[test]
fn snapshot_source_honors_custom_columns_and_row_cap() {
    let temp = tempfile::tempdir().expect("failed creating tempdir");
    write_lines(
        &temp.path().join("part-00000.jsonl"),
        &[
            r#"{"row":{"sentence":"so scared","emotion_id":"4"}}"#,
            r#"{"row":{"sentence":"what a shock","emotion_id":5}}"#,
            r#"{"row":{"sentence":"never loaded","emotion_id":3}}"#,
        ],
    );

    let mut config = DatasetConfig::new("custom", "local/emotion", "", "", temp.path());
    config.text_column = "sentence".to_string();
    config.label_column = "emotion_id".to_string();
    config.max_rows = Some(2);

    let records = SnapshotSource::new(config).load().expect("load should succeed");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].emotion().unwrap(), Emotion::Fear);
    assert_eq!(records[1].emotion().unwrap(), Emotion::Surprise);
}

#[test]
#[ignore = "network integration test against live Hugging Face dataset"]
fn huggingface_reads_live_remote_dataset() {
    let temp = tempfile::tempdir().expect("failed creating tempdir");
    let mut config = DatasetConfig::default();
    config.snapshot_dir = temp.path().to_path_buf();
    config.max_rows = Some(64);

    let queries = EmotionQueries::from_source(HuggingFaceSource::new(config));
    let distribution = queries
        .analyze_emotion_distribution()
        .expect("distribution should load live rows");
    assert_eq!(distribution.total_samples, 64);
    assert_eq!(distribution.distribution.len(), 6);

    let sample = queries.get_sample(5).expect("sample should succeed");
    assert_eq!(sample.len(), 5);
}
