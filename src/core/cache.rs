//! Model caching utilities for sharing weights across registry entries.
//!
//! Several sentiment models can be backed by the same classifier weights
//! (for example the whole-comment and per-sentence ModernBERT scorers).
//! The cache hands out `Arc`s so the weights are loaded once per process.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

type CacheStorage = HashMap<(TypeId, String), Arc<dyn Any + Send + Sync>>;

pub struct ModelCache {
    cache: Mutex<CacheStorage>,
}

impl ModelCache {
    pub fn new() -> Self {
        Self {
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Get a model from the cache, or build it with `loader` and store it.
    ///
    /// Entries are keyed by both the model type and `key`, so two model
    /// types may use the same key without clashing. A failed load leaves
    /// the cache untouched and the next call retries.
    pub fn get_or_create<M, F>(&self, key: &str, loader: F) -> anyhow::Result<Arc<M>>
    where
        M: Send + Sync + 'static,
        F: FnOnce() -> anyhow::Result<M>,
    {
        let cache_key = (TypeId::of::<M>(), key.to_string());

        if let Some(model) = self.lookup::<M>(&cache_key) {
            return Ok(model);
        }

        // The lock is released while loading; loaders may take minutes.
        let model = Arc::new(loader()?);

        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.insert(cache_key, model.clone() as Arc<dyn Any + Send + Sync>);
        Ok(model)
    }

    fn lookup<M: Send + Sync + 'static>(&self, cache_key: &(TypeId, String)) -> Option<Arc<M>> {
        let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache
            .get(cache_key)
            .cloned()
            .and_then(|cached| cached.downcast::<M>().ok())
    }

    pub fn len(&self) -> usize {
        self.cache.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ModelCache {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL_MODEL_CACHE: once_cell::sync::Lazy<ModelCache> =
    once_cell::sync::Lazy::new(ModelCache::new);

/// Get a reference to the process-wide model cache.
pub fn global_cache() -> &'static ModelCache {
    &GLOBAL_MODEL_CACHE
}
