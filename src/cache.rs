use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::Instant;
use tracing::{info, warn};

use crate::data::Dataset;
use crate::errors::QueryError;
use crate::source::LabeledTextSource;

/// Lazily loaded, read-only holder of the full record table.
///
/// The first `ensure_loaded` call runs the source load; concurrent first
/// callers wait on the same load instead of starting their own. A failed
/// load leaves the cache empty so a later call retries. Once loaded, reads
/// go through the `OnceLock` without taking any lock.
pub struct DatasetCache {
    source: Arc<dyn LabeledTextSource>,
    loaded: OnceLock<Dataset>,
    load_lock: Mutex<()>,
    load_attempts: AtomicUsize,
}

impl DatasetCache {
    /// Create an unloaded cache over `source`.
    pub fn new(source: Arc<dyn LabeledTextSource>) -> Self {
        Self {
            source,
            loaded: OnceLock::new(),
            load_lock: Mutex::new(()),
            load_attempts: AtomicUsize::new(0),
        }
    }

    /// Create an unloaded cache owning `source`.
    pub fn from_source(source: impl LabeledTextSource + 'static) -> Self {
        Self::new(Arc::new(source))
    }

    /// Id of the backing source.
    pub fn source_id(&self) -> &str {
        self.source.id()
    }

    /// Return the loaded table, loading it first if needed.
    pub fn ensure_loaded(&self) -> Result<&Dataset, QueryError> {
        if let Some(dataset) = self.loaded.get() {
            return Ok(dataset);
        }

        // The guard protects no data, so a poisoned lock is still usable.
        let _guard = self
            .load_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(dataset) = self.loaded.get() {
            return Ok(dataset);
        }

        let attempt = self.load_attempts.fetch_add(1, Ordering::SeqCst) + 1;
        let started = Instant::now();
        info!(
            "[emotion:cache] loading dataset from source '{}' (attempt {})",
            self.source.id(),
            attempt
        );
        let records = self.source.load().inspect_err(|err| {
            warn!(
                "[emotion:cache] load from source '{}' failed: {err}",
                self.source.id()
            );
        })?;

        let dataset = self
            .loaded
            .get_or_init(|| Dataset::new(self.source.id(), records));
        info!(
            "[emotion:cache] dataset ready in {:.2}s (rows={}, loaded_at={})",
            started.elapsed().as_secs_f64(),
            dataset.len(),
            dataset.loaded_at().to_rfc3339()
        );
        Ok(dataset)
    }

    /// Returns `true` once a load has succeeded.
    pub fn is_loaded(&self) -> bool {
        self.loaded.get().is_some()
    }

    /// Number of times the source load has been started, successful or not.
    pub fn load_attempts(&self) -> usize {
        self.load_attempts.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Emotion, Record};
    use crate::source::InMemorySource;

    #[test]
    fn repeated_calls_return_the_same_table() {
        let cache = DatasetCache::from_source(InMemorySource::new(
            "fixture",
            vec![Record::new("i feel sad", Emotion::Sadness)],
        ));
        assert!(!cache.is_loaded());

        let first = cache.ensure_loaded().unwrap() as *const Dataset;
        let second = cache.ensure_loaded().unwrap() as *const Dataset;

        assert_eq!(first, second);
        assert!(cache.is_loaded());
        assert_eq!(cache.load_attempts(), 1);
        assert_eq!(cache.ensure_loaded().unwrap().source_id(), "fixture");
    }

    #[test]
    fn empty_source_loads_as_empty_table() {
        let cache = DatasetCache::from_source(InMemorySource::new("empty", Vec::new()));
        let dataset = cache.ensure_loaded().unwrap();
        assert!(dataset.is_empty());
        assert!(cache.is_loaded());
    }
}
