use std::collections::HashSet;

use rand::SeedableRng;
use rand::rngs::StdRng;

use emotion_query::{Emotion, EmotionQueries, InMemorySource, Record};

fn scenario_records() -> Vec<Record> {
    vec![
        Record::new("i am so happy", Emotion::Joy),
        Record::new("i feel sad", Emotion::Sadness),
        Record::new("i love this", Emotion::Love),
        Record::new("i am happy again", Emotion::Joy),
    ]
}

fn scenario_queries() -> EmotionQueries {
    EmotionQueries::from_source(InMemorySource::new("scenario", scenario_records()))
}

fn mixed_records() -> Vec<Record> {
    let mut records = Vec::new();
    for idx in 0..60 {
        let emotion = Emotion::ALL[idx % 6];
        let weight = if emotion == Emotion::Joy { 3 } else { 1 };
        for copy in 0..weight {
            records.push(Record::new(
                format!("row {idx} copy {copy} feeling {emotion}"),
                emotion,
            ));
        }
    }
    records
}

#[test]
fn scenario_count_by_emotion() {
    let count = scenario_queries().count_by_emotion(Emotion::Joy).unwrap();
    assert_eq!(count.emotion, Emotion::Joy);
    assert_eq!(count.count, 2);
    assert_eq!(count.total, 4);
    assert_eq!(count.percentage, 50.0);
}

#[test]
fn scenario_search_returns_matches_in_storage_order() {
    let results = scenario_queries().search_text("happy", 10).unwrap();
    assert_eq!(results.query, "happy");
    assert_eq!(results.count, 2);
    let texts = results
        .results
        .iter()
        .map(|row| row.text.as_str())
        .collect::<Vec<_>>();
    assert_eq!(texts, vec!["i am so happy", "i am happy again"]);
    assert!(results.results.iter().all(|row| row.emotion == Emotion::Joy && row.label_id == 1));
}

#[test]
fn scenario_distribution_lists_every_emotion_by_name() {
    let distribution = scenario_queries().analyze_emotion_distribution().unwrap();
    assert_eq!(distribution.total_samples, 4);
    let entries = distribution
        .distribution
        .iter()
        .map(|entry| (entry.emotion, entry.count))
        .collect::<Vec<_>>();
    assert_eq!(
        entries,
        vec![
            ("anger", 0),
            ("fear", 0),
            ("joy", 2),
            ("love", 1),
            ("sadness", 1),
            ("surprise", 0),
        ]
    );
    let joy = &distribution.distribution[2];
    assert_eq!(joy.percentage, 50.0);
    assert_eq!(distribution.distribution[3].percentage, 25.0);
}

#[test]
fn counts_sum_to_total_and_match_a_manual_tally() {
    let records = mixed_records();
    let queries = EmotionQueries::from_source(InMemorySource::new("mixed", records.clone()));
    let mut summed = 0;
    for emotion in Emotion::ALL {
        let count = queries.count_by_emotion(emotion).unwrap();
        let expected = records.iter().filter(|r| r.label == emotion.label()).count();
        assert_eq!(count.count, expected);
        assert_eq!(count.total, records.len());
        let pct = if emotion == Emotion::Joy { 37.5 } else { 12.5 };
        assert_eq!(count.percentage, pct);
        summed += count.count;
    }
    assert_eq!(summed, records.len());

    let distribution = queries.analyze_emotion_distribution().unwrap();
    let dist_total: usize = distribution.distribution.iter().map(|e| e.count).sum();
    assert_eq!(dist_total, distribution.total_samples);
}

#[test]
fn percentages_match_full_train_split_proportions() {
    let mut records = Vec::with_capacity(16000);
    records.extend((0..572).map(|idx| Record::new(format!("surprise {idx}"), Emotion::Surprise)));
    records.push(Record::new("only fear", Emotion::Fear));
    while records.len() < 16000 {
        records.push(Record::new(format!("joy {}", records.len()), Emotion::Joy));
    }
    let queries = EmotionQueries::from_source(InMemorySource::new("train", records));

    let surprise = queries.count_by_emotion(Emotion::Surprise).unwrap();
    assert_eq!((surprise.count, surprise.total), (572, 16000));
    assert_eq!(surprise.percentage, 3.57);

    let distribution = queries.analyze_emotion_distribution().unwrap();
    let by_name = |name: &str| {
        distribution
            .distribution
            .iter()
            .find(|entry| entry.emotion == name)
            .map(|entry| entry.percentage)
            .unwrap()
    };
    assert_eq!(by_name("surprise"), 3.57);
    assert_eq!(by_name("fear"), 0.01);
    assert_eq!(by_name("joy"), 96.42);
}

#[test]
fn single_match_in_eight_hundred_rounds_down() {
    let mut records = vec![Record::new("only fear", Emotion::Fear)];
    records.extend((1..800).map(|idx| Record::new(format!("sad {idx}"), Emotion::Sadness)));
    let queries = EmotionQueries::from_source(InMemorySource::new("small", records));
    assert_eq!(queries.count_by_emotion(Emotion::Fear).unwrap().percentage, 0.12);
}

#[test]
fn count_and_distribution_are_idempotent() {
    let queries = EmotionQueries::from_source(InMemorySource::new("mixed", mixed_records()));
    assert_eq!(
        queries.count_by_emotion(Emotion::Fear).unwrap(),
        queries.count_by_emotion(Emotion::Fear).unwrap()
    );
    assert_eq!(
        queries.analyze_emotion_distribution().unwrap(),
        queries.analyze_emotion_distribution().unwrap()
    );
    assert_eq!(queries.cache().load_attempts(), 1);
}

#[test]
fn sample_returns_distinct_consistent_rows() {
    let records = mixed_records();
    let queries = EmotionQueries::from_source(InMemorySource::new("mixed", records.clone()));
    let mut rng = StdRng::seed_from_u64(7);

    for n in [1, 3, 50, 80, 100] {
        let sample = queries.get_sample_with_rng(n, &mut rng).unwrap();
        assert_eq!(sample.len(), (n as usize).min(records.len()));
        let distinct = sample.iter().map(|row| row.text.as_str()).collect::<HashSet<_>>();
        assert_eq!(distinct.len(), sample.len());
        for row in &sample {
            assert!(records.iter().any(|r| r.text == row.text && r.label == row.label_id));
            assert_eq!(Emotion::from_label(row.label_id).unwrap(), row.emotion);
        }
    }
}

#[test]
fn sample_larger_than_table_returns_whole_table() {
    let sample = scenario_queries().get_sample(100).unwrap();
    assert_eq!(sample.len(), 4);
    let distinct = sample.iter().map(|row| row.text.clone()).collect::<HashSet<_>>();
    assert_eq!(distinct.len(), 4);
}

#[test]
fn sample_bounds_are_inclusive() {
    let queries = scenario_queries();
    assert!(queries.get_sample(0).unwrap_err().is_validation());
    assert!(queries.get_sample(101).unwrap_err().is_validation());
    assert!(queries.get_sample(-3).unwrap_err().is_validation());
    assert_eq!(queries.get_sample(1).unwrap().len(), 1);
    assert_eq!(queries.get_sample(100).unwrap().len(), 4);
}

#[test]
fn count_rejects_unknown_emotion_names() {
    let err = scenario_queries().count_by_emotion_name("excited").unwrap_err();
    assert!(err.is_validation());
    assert!(err.to_string().contains("emotion"));
}

#[test]
fn search_respects_limit_and_case() {
    let queries = EmotionQueries::from_source(InMemorySource::new("mixed", mixed_records()));
    for limit in [1, 5, 100] {
        let results = queries.search_text("FEELING JOY", limit).unwrap();
        assert!(results.count <= limit as usize);
        assert_eq!(results.count, results.results.len());
        assert!(
            results
                .results
                .iter()
                .all(|row| row.text.to_lowercase().contains("feeling joy"))
        );
    }
    assert_eq!(queries.search_text("feeling joy", 100).unwrap().count, 30);
}

#[test]
fn search_trims_query_and_validates_length() {
    let queries = scenario_queries();
    let results = queries.search_text("  love  ", 10).unwrap();
    assert_eq!(results.query, "love");
    assert_eq!(results.count, 1);

    assert!(queries.search_text("", 10).unwrap_err().is_validation());
    assert!(queries.search_text(" \t ", 10).unwrap_err().is_validation());
    assert!(queries.search_text(&"x".repeat(201), 10).unwrap_err().is_validation());
    assert!(queries.search_text(&"x".repeat(200), 10).is_ok());
    assert!(queries.search_text("happy", 101).unwrap_err().is_validation());
}

#[test]
fn search_with_no_matches_is_empty_not_an_error() {
    let results = scenario_queries().search_text("furious", 10).unwrap();
    assert_eq!(results.count, 0);
    assert!(results.results.is_empty());
}
