//! Core traits and types for the caching system.

use chrono::{DateTime, Utc};
use color_eyre::Result;
use std::collections::BTreeSet;
use tokio::task::JoinHandle;

use crate::net::Response;

/// A cached response together with the time it was written.
#[derive(Debug, Clone)]
pub struct CachedEntry {
  pub response: Response,
  pub cached_at: DateTime<Utc>,
}

/// Trait for cache storage backends.
///
/// A backend holds any number of named stores, each a map from request URL
/// to response. A store exists once something has been written to it.
pub trait CacheStorage: Send + Sync {
  /// Look up the entry for `url` in store `cache`.
  fn match_entry(&self, cache: &str, url: &str) -> Result<Option<CachedEntry>>;

  /// Insert or overwrite one entry, creating the store if needed.
  fn put(&self, cache: &str, url: &str, response: &Response) -> Result<()>;

  /// Write several entries as one unit: either all land or none do.
  fn put_all(&self, cache: &str, entries: &[(String, Response)]) -> Result<()> {
    for (url, response) in entries {
      self.put(cache, url, response)?;
    }
    Ok(())
  }

  /// Remove one entry. Returns whether it existed.
  #[allow(dead_code)]
  fn delete(&self, cache: &str, url: &str) -> Result<bool>;

  /// URLs stored in `cache`, sorted.
  fn keys(&self, cache: &str) -> Result<Vec<String>>;

  /// Names of every existing store.
  fn cache_names(&self) -> Result<BTreeSet<String>>;

  /// Drop a whole store. Returns whether it existed.
  fn delete_cache(&self, cache: &str) -> Result<bool>;
}

/// Indicates where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fresh response from the network (ok or not)
  Network,
  /// Cache hit, served without waiting on the network
  Cache,
  /// Network failed, serving the cached entry
  CacheFallback,
  /// Neither network nor cache could answer; synthetic 503
  Offline,
}

/// Result of running a fetch strategy.
#[derive(Debug)]
pub struct Served {
  /// The response handed back to the page
  pub response: Response,
  /// Where the response came from
  pub source: CacheSource,
  /// When the response was cached (if from cache)
  pub cached_at: Option<DateTime<Utc>>,
  /// Background refresh started by a cache hit
  revalidation: Option<JoinHandle<()>>,
}

impl Served {
  pub fn from_network(response: Response) -> Self {
    Self {
      response,
      source: CacheSource::Network,
      cached_at: None,
      revalidation: None,
    }
  }

  pub fn from_cache(entry: CachedEntry, revalidation: JoinHandle<()>) -> Self {
    Self {
      response: entry.response,
      source: CacheSource::Cache,
      cached_at: Some(entry.cached_at),
      revalidation: Some(revalidation),
    }
  }

  pub fn fallback(entry: CachedEntry) -> Self {
    Self {
      response: entry.response,
      source: CacheSource::CacheFallback,
      cached_at: Some(entry.cached_at),
      revalidation: None,
    }
  }

  pub fn offline() -> Self {
    Self {
      response: Response::offline(),
      source: CacheSource::Offline,
      cached_at: None,
      revalidation: None,
    }
  }

  pub fn is_revalidating(&self) -> bool {
    self.revalidation.is_some()
  }

  /// Wait for the background refresh, if any, to finish.
  ///
  /// The served response is unaffected either way.
  pub async fn wait_revalidation(&mut self) {
    if let Some(handle) = self.revalidation.take() {
      let _ = handle.await;
    }
  }
}
