//! Cache layer that applies a fetch strategy against one named store.

use std::sync::Arc;
use tracing::{debug, warn};

use super::traits::{CacheStorage, CachedEntry, Served};
use crate::net::{Fetch, Request, Response};

/// How a request is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
  /// Serve from cache, refresh in the background
  CacheFirst,
  /// Ask the network, fall back to cache only when the network is unreachable
  NetworkFirst,
}

/// Cache layer that sits between intercepted requests and the network.
///
/// Strategies never fail: every call ends in a response, synthetic if need be.
pub struct CacheLayer<S: CacheStorage, N: Fetch> {
  storage: Arc<S>,
  network: Arc<N>,
}

impl<S, N> CacheLayer<S, N>
where
  S: CacheStorage + 'static,
  N: Fetch + 'static,
{
  pub fn new(storage: Arc<S>, network: Arc<N>) -> Self {
    Self { storage, network }
  }

  pub fn storage(&self) -> &S {
    &self.storage
  }

  pub fn network(&self) -> &N {
    &self.network
  }

  /// Run `strategy` for `request` against store `cache`.
  pub async fn serve(&self, strategy: Strategy, request: &Request, cache: &str) -> Served {
    match strategy {
      Strategy::CacheFirst => self.cache_first(request, cache).await,
      Strategy::NetworkFirst => self.network_first(request, cache).await,
    }
  }

  /// Cache-first with background revalidation.
  ///
  /// 1. Cache hit: return it now, refresh the entry from the network in the background
  /// 2. Miss: fetch, store ok responses, return them
  /// 3. Miss and the network fails or answers non-ok: synthetic 503
  pub async fn cache_first(&self, request: &Request, cache: &str) -> Served {
    let key = request.cache_key();

    if let Some(entry) = self.lookup(cache, &key) {
      debug!(url = %key, cache, "Cache hit, revalidating in background");
      let revalidation = self.spawn_revalidation(request.clone(), cache.to_string(), key);
      return Served::from_cache(entry, revalidation);
    }

    match self.network.fetch(request).await {
      Ok(response) if response.is_ok() => {
        self.store(cache, &key, &response);
        Served::from_network(response)
      }
      Ok(response) => {
        debug!(url = %key, status = response.status, "Cache miss and non-ok response, serving offline response");
        Served::offline()
      }
      Err(e) => {
        debug!(url = %key, error = %e, "Cache miss and network failed, serving offline response");
        Served::offline()
      }
    }
  }

  /// Network-first with cache fallback.
  ///
  /// Any received response is returned as-is; only ok responses are stored.
  /// The cache is consulted only when the fetch itself fails.
  pub async fn network_first(&self, request: &Request, cache: &str) -> Served {
    let key = request.cache_key();

    match self.network.fetch(request).await {
      Ok(response) => {
        if response.is_ok() {
          self.store(cache, &key, &response);
        } else {
          debug!(url = %key, status = response.status, "Non-ok response passed through uncached");
        }
        Served::from_network(response)
      }
      Err(e) => {
        debug!(url = %key, error = %e, "Network failed, falling back to cache");
        match self.lookup(cache, &key) {
          Some(entry) => Served::fallback(entry),
          None => Served::offline(),
        }
      }
    }
  }

  fn spawn_revalidation(
    &self,
    request: Request,
    cache: String,
    key: String,
  ) -> tokio::task::JoinHandle<()> {
    let storage = Arc::clone(&self.storage);
    let network = Arc::clone(&self.network);

    tokio::spawn(async move {
      match network.fetch(&request).await {
        Ok(response) if response.is_ok() => match storage.put(&cache, &key, &response) {
          Ok(()) => debug!(url = %key, cache = %cache, "Revalidated cached entry"),
          Err(e) => debug!(url = %key, error = %e, "Failed to store revalidated entry"),
        },
        Ok(response) => {
          debug!(url = %key, status = response.status, "Revalidation got non-ok response, keeping entry")
        }
        Err(e) => debug!(url = %key, error = %e, "Revalidation failed, keeping entry"),
      }
    })
  }

  /// Storage errors count as a miss.
  fn lookup(&self, cache: &str, key: &str) -> Option<CachedEntry> {
    match self.storage.match_entry(cache, key) {
      Ok(entry) => entry,
      Err(e) => {
        warn!(url = key, cache, error = %e, "Cache lookup failed, treating as miss");
        None
      }
    }
  }

  fn store(&self, cache: &str, key: &str, response: &Response) {
    if let Err(e) = self.storage.put(cache, key, response) {
      warn!(url = key, cache, error = %e, "Failed to write cache entry");
    }
  }
}

impl<S: CacheStorage, N: Fetch> Clone for CacheLayer<S, N> {
  fn clone(&self) -> Self {
    Self {
      storage: Arc::clone(&self.storage),
      network: Arc::clone(&self.network),
    }
  }
}
