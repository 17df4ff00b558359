//! The four read-only dataset operations.
//!
//! Every operation validates its parameters before touching the cache, then
//! performs a single scan (or random pick) over the loaded table. Results are
//! built fresh per call and never cached.

use rand::Rng;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::cache::DatasetCache;
use crate::constants::limits::{
    QUERY_MAX_CHARS, QUERY_MIN_CHARS, SAMPLE_MAX, SAMPLE_MIN, SEARCH_LIMIT_MAX, SEARCH_LIMIT_MIN,
};
use crate::data::{Emotion, Record};
use crate::errors::QueryError;
use crate::source::LabeledTextSource;
use crate::types::{EmotionName, LabelId};
use crate::utils::{char_len, contains_lowercased, percentage};

/// One record as returned by sampling and search.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LabeledText {
    /// Record text.
    pub text: String,
    /// Resolved emotion name.
    pub emotion: Emotion,
    /// Raw label code.
    pub label_id: LabelId,
}

impl LabeledText {
    fn from_record(record: &Record) -> Result<Self, QueryError> {
        Ok(Self {
            text: record.text.clone(),
            emotion: record.emotion()?,
            label_id: record.label,
        })
    }
}

/// Result of `count_by_emotion`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EmotionCount {
    /// Emotion that was counted.
    pub emotion: Emotion,
    /// Records labeled `emotion`.
    pub count: usize,
    /// Records in the table.
    pub total: usize,
    /// `count / total * 100` rounded to two decimals; `0.0` for an empty table.
    pub percentage: f64,
}

/// Result of `search_text`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SearchResults {
    /// Query after trimming surrounding whitespace.
    pub query: String,
    /// Number of entries in `results`.
    pub count: usize,
    /// Matches in storage order.
    pub results: Vec<LabeledText>,
}

/// One row of the emotion distribution.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DistributionEntry {
    /// Emotion name.
    pub emotion: EmotionName,
    /// Records with this emotion.
    pub count: usize,
    /// Share of the table, as in `EmotionCount::percentage`.
    pub percentage: f64,
}

/// Result of `analyze_emotion_distribution`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EmotionDistribution {
    /// Records in the table.
    pub total_samples: usize,
    /// One entry per emotion, sorted by emotion name.
    pub distribution: Vec<DistributionEntry>,
}

/// Check `n` against the sample bounds.
pub fn validate_sample_size(n: i64) -> Result<usize, QueryError> {
    if !(SAMPLE_MIN..=SAMPLE_MAX).contains(&n) {
        return Err(QueryError::validation(
            "n",
            format!("must be between {SAMPLE_MIN} and {SAMPLE_MAX} (got {n})"),
        ));
    }
    Ok(n as usize)
}

/// Check `limit` against the search bounds.
pub fn validate_search_limit(limit: i64) -> Result<usize, QueryError> {
    if !(SEARCH_LIMIT_MIN..=SEARCH_LIMIT_MAX).contains(&limit) {
        return Err(QueryError::validation(
            "limit",
            format!("must be between {SEARCH_LIMIT_MIN} and {SEARCH_LIMIT_MAX} (got {limit})"),
        ));
    }
    Ok(limit as usize)
}

/// Trim `query` and check its length in characters.
pub fn validate_search_query(query: &str) -> Result<&str, QueryError> {
    let trimmed = query.trim();
    let len = char_len(trimmed);
    if len < QUERY_MIN_CHARS {
        return Err(QueryError::validation(
            "query",
            "must not be empty after trimming whitespace",
        ));
    }
    if len > QUERY_MAX_CHARS {
        return Err(QueryError::validation(
            "query",
            format!("must be at most {QUERY_MAX_CHARS} characters (got {len})"),
        ));
    }
    Ok(trimmed)
}

/// Query facade over a shared `DatasetCache`.
#[derive(Clone)]
pub struct EmotionQueries {
    cache: Arc<DatasetCache>,
}

impl EmotionQueries {
    /// Create a facade over an existing cache.
    pub fn new(cache: Arc<DatasetCache>) -> Self {
        Self { cache }
    }

    /// Create a facade with a fresh cache over `source`.
    pub fn from_source(source: impl LabeledTextSource + 'static) -> Self {
        Self::new(Arc::new(DatasetCache::from_source(source)))
    }

    /// Backing cache.
    pub fn cache(&self) -> &DatasetCache {
        &self.cache
    }

    /// Draw `min(n, total)` distinct records uniformly at random.
    pub fn get_sample(&self, n: i64) -> Result<Vec<LabeledText>, QueryError> {
        self.get_sample_with_rng(n, &mut rand::rng())
    }

    /// `get_sample` with a caller-supplied RNG.
    ///
    /// Records are returned in draw order.
    pub fn get_sample_with_rng<R: Rng + ?Sized>(
        &self,
        n: i64,
        rng: &mut R,
    ) -> Result<Vec<LabeledText>, QueryError> {
        let n = validate_sample_size(n)?;
        let dataset = self.cache.ensure_loaded()?;
        let records = dataset.records();
        let amount = n.min(records.len());
        debug!(
            "[emotion:query] get_sample n={} drawing {} of {}",
            n,
            amount,
            records.len()
        );

        rand::seq::index::sample(rng, records.len(), amount)
            .into_iter()
            .map(|idx| LabeledText::from_record(&records[idx]))
            .collect()
    }

    /// Count records labeled `emotion`.
    ///
    /// Label codes are compared directly, so records with codes outside the
    /// label mapping are counted in `total` but never fail this query.
    pub fn count_by_emotion(&self, emotion: Emotion) -> Result<EmotionCount, QueryError> {
        let dataset = self.cache.ensure_loaded()?;
        let label = emotion.label();
        let count = dataset
            .records()
            .iter()
            .filter(|record| record.label == label)
            .count();
        let total = dataset.len();
        debug!(
            "[emotion:query] count_by_emotion emotion={} count={} total={}",
            emotion, count, total
        );
        Ok(EmotionCount {
            emotion,
            count,
            total,
            percentage: percentage(count, total),
        })
    }

    /// Parse `emotion` and count it; unknown names are validation errors.
    pub fn count_by_emotion_name(&self, emotion: &str) -> Result<EmotionCount, QueryError> {
        let emotion = emotion.parse::<Emotion>()?;
        self.count_by_emotion(emotion)
    }

    /// Case-insensitive substring search in storage order.
    ///
    /// Scanning stops as soon as `limit` matches are collected, so the results
    /// are always a prefix of all matches in storage order.
    pub fn search_text(&self, query: &str, limit: i64) -> Result<SearchResults, QueryError> {
        let query = validate_search_query(query)?;
        let limit = validate_search_limit(limit)?;
        let dataset = self.cache.ensure_loaded()?;
        let needle = query.to_lowercase();

        let mut results = Vec::new();
        for record in dataset.records() {
            if results.len() >= limit {
                break;
            }
            if contains_lowercased(&record.text, &needle) {
                results.push(LabeledText::from_record(record)?);
            }
        }
        debug!(
            "[emotion:query] search_text query='{}' limit={} matched={}",
            query,
            limit,
            results.len()
        );

        Ok(SearchResults {
            query: query.to_string(),
            count: results.len(),
            results,
        })
    }

    /// Per-emotion counts and percentages over the whole table.
    ///
    /// All six emotions are present even when their count is zero.
    pub fn analyze_emotion_distribution(&self) -> Result<EmotionDistribution, QueryError> {
        let dataset = self.cache.ensure_loaded()?;
        let mut counts: BTreeMap<EmotionName, usize> = Emotion::ALL
            .iter()
            .map(|emotion| (emotion.name(), 0))
            .collect();
        for record in dataset.records() {
            *counts.entry(record.emotion()?.name()).or_default() += 1;
        }

        let total = dataset.len();
        let distribution = counts
            .into_iter()
            .map(|(emotion, count)| DistributionEntry {
                emotion,
                count,
                percentage: percentage(count, total),
            })
            .collect();
        Ok(EmotionDistribution {
            total_samples: total,
            distribution,
        })
    }
}
