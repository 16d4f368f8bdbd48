//! Generation cache: process-lifetime key → result store shared by concurrent requests.
//!
//! Entries are `Arc`s and are only ever replaced whole. No lock is held while a
//! generator runs, so two concurrent misses on one key both generate and the later
//! write wins.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

/// A value handed out by the cache plus where it came from.
#[derive(Debug)]
pub struct Cached<V> {
  pub value: Arc<V>,
  pub from_cache: bool,
}

#[derive(Debug)]
pub struct GenerationCache<K, V> {
  entries: RwLock<HashMap<K, Arc<V>>>,
}

impl<K, V> Default for GenerationCache<K, V> {
  fn default() -> Self {
    Self { entries: RwLock::new(HashMap::new()) }
  }
}

impl<K, V> GenerationCache<K, V>
where
  K: Eq + Hash + Clone + std::fmt::Debug,
{
  pub fn new() -> Self {
    Self::default()
  }

  pub async fn get(&self, key: &K) -> Option<Arc<V>> {
    self.entries.read().await.get(key).cloned()
  }

  /// Insert or replace; last write wins.
  pub async fn put(&self, key: K, value: V) -> Arc<V> {
    let value = Arc::new(value);
    self.entries.write().await.insert(key, value.clone());
    value
  }

  pub async fn invalidate(&self, key: &K) -> bool {
    self.entries.write().await.remove(key).is_some()
  }

  pub async fn len(&self) -> usize {
    self.entries.read().await.len()
  }

  /// Serve `key` from the cache unless `force_refresh`; otherwise run `generate` and store
  /// its success. Failures are returned untouched and never stored.
  pub async fn get_or_generate<F, Fut, E>(&self, key: K, force_refresh: bool, generate: F) -> Result<Cached<V>, E>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<V, E>>,
  {
    if force_refresh {
      if self.invalidate(&key).await {
        debug!(target: "qa", ?key, "Cache entry invalidated by forced refresh");
      }
    } else if let Some(value) = self.get(&key).await {
      debug!(target: "qa", ?key, "Cache hit");
      return Ok(Cached { value, from_cache: true });
    }

    let fresh = generate().await?;
    let value = self.put(key, fresh).await;
    Ok(Cached { value, from_cache: false })
  }
}
