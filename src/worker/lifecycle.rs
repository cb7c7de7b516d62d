//! Install, activate and cache-update handling.

use color_eyre::{eyre::eyre, Result};
use futures::future::{join_all, try_join_all};
use std::fmt;
use tracing::{debug, error, info, warn};

use super::host::Host;
use super::Worker;
use crate::cache::CacheStorage;
use crate::event::{ControlMessage, Outcome};
use crate::net::{Fetch, Request, Response};

/// Worker lifecycle states
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WorkerState {
  /// No version installed, or the last install failed
  #[default]
  Uninstalled,
  /// Install event in progress, caches being populated
  Installing,
  /// Installed; waiting for the previous version to let go
  WaitingToActivate,
  /// Activated and controlling pages
  Active,
}

impl fmt::Display for WorkerState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      WorkerState::Uninstalled => write!(f, "uninstalled"),
      WorkerState::Installing => write!(f, "installing"),
      WorkerState::WaitingToActivate => write!(f, "waiting-to-activate"),
      WorkerState::Active => write!(f, "active"),
    }
  }
}

impl<S, N, H> Worker<S, N, H>
where
  S: CacheStorage + 'static,
  N: Fetch + 'static,
  H: Host,
{
  /// Populate the static and audio stores concurrently.
  ///
  /// The static store is all-or-nothing and gates the install; audio is
  /// best-effort per file.
  pub(super) async fn install(&mut self) -> Result<Outcome> {
    info!(version = %self.version, "Installing");
    self.state = WorkerState::Installing;

    let (statics, (audio_cached, audio_failed)) =
      tokio::join!(self.populate_static(), self.populate_audio());

    let static_cached = match statics {
      Ok(count) => count,
      Err(e) => {
        self.state = WorkerState::Uninstalled;
        return Err(eyre!("Install failed, static assets not cached: {}", e));
      }
    };

    info!(
      static_cached,
      audio_cached,
      audio_failed = audio_failed.len(),
      "Assets cached"
    );

    self.state = WorkerState::WaitingToActivate;
    self.skip_waiting = match self.host.skip_waiting().await {
      Ok(()) => true,
      Err(e) => {
        warn!(error = %e, "Skip waiting refused, waiting for old clients to close");
        false
      }
    };

    Ok(Outcome::Installed {
      static_cached,
      audio_cached,
      audio_failed,
      skip_waiting: self.skip_waiting,
    })
  }

  /// Delete every store outside the current allow-list, then claim clients.
  pub(super) async fn activate(&mut self) -> Result<Outcome> {
    if self.state != WorkerState::WaitingToActivate {
      debug!(state = %self.state, "Activating without a pending install");
    }
    info!(version = %self.version, "Activating");

    let storage = self.layer.storage();
    let mut deleted = Vec::new();
    for name in storage.cache_names()? {
      if !self.names.is_current(&name) {
        info!(cache = %name, "Deleting old cache");
        storage.delete_cache(&name)?;
        deleted.push(name);
      }
    }

    self.host.claim_clients().await?;
    self.skip_waiting = false;
    self.state = WorkerState::Active;
    info!("Activated");

    Ok(Outcome::Activated { deleted })
  }

  /// Handle a message from the host page. Failures are logged, never returned.
  pub(super) async fn handle_message(&self, message: &serde_json::Value) -> Outcome {
    match ControlMessage::parse(message) {
      Some(ControlMessage::UpdateCache) => {
        info!("Cache update requested");
        match self.populate_static().await {
          Ok(count) => {
            info!(count, "Static asset cache updated");
            Outcome::CacheRefreshed { refreshed: true }
          }
          Err(e) => {
            error!(error = %e, "Static asset cache update failed");
            Outcome::CacheRefreshed { refreshed: false }
          }
        }
      }
      None => {
        debug!(%message, "Ignoring unrecognized message");
        Outcome::Ignored
      }
    }
  }

  /// Fetch every static manifest entry, then store them together.
  ///
  /// A single failed or non-ok fetch aborts the whole batch and nothing is written.
  pub async fn populate_static(&self) -> Result<usize> {
    let cache = &self.names.static_cache;

    let entries = try_join_all(
      self
        .manifest
        .static_assets()
        .iter()
        .map(|path| self.fetch_for_cache(path)),
    )
    .await?;

    self.layer.storage().put_all(cache, &entries)?;
    debug!(cache = %cache, count = entries.len(), "Cached static assets");

    Ok(entries.len())
  }

  /// Fetch and store each audio entry on its own; failures are skipped.
  ///
  /// Returns the number cached and the paths that failed.
  async fn populate_audio(&self) -> (usize, Vec<String>) {
    let cache = &self.names.audio_cache;

    let results = join_all(self.manifest.audio_assets().iter().map(|path| async move {
      let result = match self.fetch_for_cache(path).await {
        Ok((key, response)) => self.layer.storage().put(cache, &key, &response),
        Err(e) => Err(e),
      };
      (path, result)
    }))
    .await;

    let mut cached = 0;
    let mut failed = Vec::new();
    for (path, result) in results {
      match result {
        Ok(()) => cached += 1,
        Err(e) => {
          warn!(path = %path, error = %e, "Failed to cache audio asset");
          failed.push(path.clone());
        }
      }
    }

    (cached, failed)
  }

  /// Fetch one manifest entry for precaching. Non-ok responses count as failures.
  async fn fetch_for_cache(&self, path: &str) -> Result<(String, Response)> {
    let request = Request::resolve(&self.origin, path)?;
    let response = self.layer.network().fetch(&request).await?;

    if !response.is_ok() {
      return Err(eyre!(
        "Request for {} returned status {}",
        request.url,
        response.status
      ));
    }

    Ok((request.cache_key(), response))
  }
}
