//! The offline worker: event dispatch, request routing and lifecycle.

mod host;
mod lifecycle;
mod notify;

use chrono::Utc;
use color_eyre::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

use crate::cache::{CacheLayer, CacheStorage, Served, Strategy};
use crate::config::{Config, NotificationConfig};
use crate::event::{Event, Outcome};
use crate::manifest::{CacheNames, Manifest};
use crate::net::{classify, is_interceptable, Category, Fetch, Request};

pub use host::{ConsoleHost, Host};
pub use lifecycle::WorkerState;
pub use notify::{Notification, PushPayload, EXPLORE_ACTION};

/// Sync tag the worker acknowledges.
pub const BACKGROUND_SYNC_TAG: &str = "background-sync";

/// Where a classified request is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route<'a> {
  pub category: Category,
  pub strategy: Strategy,
  pub cache: &'a str,
}

impl<'a> Route<'a> {
  pub fn for_category(category: Category, names: &'a CacheNames) -> Self {
    let (strategy, cache) = match category {
      Category::Audio => (Strategy::NetworkFirst, &names.audio_cache),
      Category::Image | Category::StaticDocument => (Strategy::CacheFirst, &names.static_cache),
      Category::Other => (Strategy::NetworkFirst, &names.dynamic_cache),
    };

    Self {
      category,
      strategy,
      cache,
    }
  }
}

/// Offline worker for one version of the app.
///
/// Holds the version's configuration explicitly; nothing is read from globals.
pub struct Worker<S: CacheStorage, N: Fetch, H: Host> {
  origin: Url,
  version: String,
  names: CacheNames,
  manifest: Manifest,
  notification: NotificationConfig,
  layer: CacheLayer<S, N>,
  host: H,
  state: WorkerState,
  skip_waiting: bool,
}

impl<S, N, H> Worker<S, N, H>
where
  S: CacheStorage + 'static,
  N: Fetch + 'static,
  H: Host,
{
  pub fn new(config: &Config, storage: S, network: N, host: H) -> Result<Self> {
    Ok(Self {
      origin: config.origin_url()?,
      version: config.version.clone(),
      names: config.cache_names(),
      manifest: config.manifest(),
      notification: config.notification.clone(),
      layer: CacheLayer::new(Arc::new(storage), Arc::new(network)),
      host,
      state: WorkerState::default(),
      skip_waiting: false,
    })
  }

  pub fn state(&self) -> WorkerState {
    self.state
  }

  /// Whether the last install asked to activate without waiting.
  pub fn skip_waiting_requested(&self) -> bool {
    self.skip_waiting
  }

  pub fn cache_names(&self) -> &CacheNames {
    &self.names
  }

  pub fn origin(&self) -> &Url {
    &self.origin
  }

  pub fn storage(&self) -> &S {
    self.layer.storage()
  }

  #[cfg(test)]
  pub fn network(&self) -> &N {
    self.layer.network()
  }

  #[cfg(test)]
  pub fn host(&self) -> &H {
    &self.host
  }

  /// Hand an event to its handler.
  pub async fn dispatch(&mut self, event: Event) -> Result<Outcome> {
    debug!(event = event.kind(), "Dispatching event");

    match event {
      Event::Install => self.install().await,
      Event::Activate => self.activate().await,
      Event::Fetch(request) => Ok(match self.handle_fetch(&request).await {
        Some(served) => Outcome::Responded(served),
        None => Outcome::Passthrough,
      }),
      Event::Message(message) => Ok(self.handle_message(&message).await),
      Event::Sync { tag } => Ok(self.handle_sync(tag)),
      Event::Push(data) => self.handle_push(data).await,
      Event::NotificationClick { action } => {
        self.handle_notification_click(action.as_deref()).await
      }
    }
  }

  /// Classify a request and pick its strategy and store.
  pub fn route(&self, request: &Request) -> Route<'_> {
    Route::for_category(classify(request, &self.manifest), &self.names)
  }

  /// Answer an intercepted request, or `None` to leave it to the network.
  pub async fn handle_fetch(&self, request: &Request) -> Option<Served> {
    if !is_interceptable(request, &self.origin) {
      debug!(method = %request.method, url = %request.url, "Not intercepting");
      return None;
    }

    let route = self.route(request);
    debug!(
      url = %request.url,
      category = ?route.category,
      strategy = ?route.strategy,
      cache = route.cache,
      "Routing request"
    );

    Some(self.layer.serve(route.strategy, request, route.cache).await)
  }

  fn handle_sync(&self, tag: String) -> Outcome {
    if tag == BACKGROUND_SYNC_TAG {
      info!(tag = %tag, "Background sync");
      Outcome::Synced { tag }
    } else {
      debug!(tag = %tag, "Ignoring sync tag");
      Outcome::Ignored
    }
  }

  async fn handle_push(&self, data: Option<Vec<u8>>) -> Result<Outcome> {
    let Some(data) = data else {
      debug!("Push without data");
      return Ok(Outcome::Ignored);
    };

    let payload = match PushPayload::from_bytes(&data) {
      Ok(payload) => payload,
      Err(e) => {
        warn!(error = %e, "Ignoring malformed push payload");
        return Ok(Outcome::Ignored);
      }
    };

    let notification =
      Notification::from_payload(payload, &self.notification, Utc::now().timestamp_millis());
    self.host.show_notification(&notification).await?;

    Ok(Outcome::Notified(notification))
  }

  async fn handle_notification_click(&self, action: Option<&str>) -> Result<Outcome> {
    self.host.close_notification().await?;

    if action != Some(EXPLORE_ACTION) {
      return Ok(Outcome::NotificationClicked { opened: None });
    }

    let root = self.origin.join("/")?;
    self.host.open_window(&root).await?;

    Ok(Outcome::NotificationClicked {
      opened: Some(root.to_string()),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::host::testing::RecordingHost;
  use super::*;
  use crate::cache::{CacheSource, SqliteStorage};
  use crate::net::testing::ScriptedNetwork;
  use crate::net::{Destination, Response};
  use reqwest::Method;

  type TestWorker = Worker<SqliteStorage, ScriptedNetwork, RecordingHost>;

  fn worker() -> TestWorker {
    Worker::new(
      &Config::default(),
      SqliteStorage::open_in_memory().unwrap(),
      ScriptedNetwork::new(),
      RecordingHost::default(),
    )
    .unwrap()
  }

  fn request(target: &str) -> Request {
    Request::resolve(&Url::parse("http://localhost:5173").unwrap(), target).unwrap()
  }

  fn url(path: &str) -> String {
    format!("http://localhost:5173{}", path)
  }

  async fn fetch(worker: &mut TestWorker, request: Request) -> Outcome {
    worker.dispatch(Event::Fetch(request)).await.unwrap()
  }

  #[test]
  fn test_routes() {
    let worker = worker();
    let names = worker.cache_names().clone();

    let route = worker.route(&request("/voice1.mp3"));
    assert_eq!(route.strategy, Strategy::NetworkFirst);
    assert_eq!(route.cache, names.audio_cache);

    let route = worker.route(&request("/r1.webp"));
    assert_eq!(route.category, Category::Image);
    assert_eq!(route.strategy, Strategy::CacheFirst);
    assert_eq!(route.cache, names.static_cache);

    let route = worker.route(&request("/"));
    assert_eq!(route.category, Category::StaticDocument);
    assert_eq!(route.cache, names.static_cache);

    let route = worker.route(&request("/story/2").with_destination(Destination::Document));
    assert_eq!(route.strategy, Strategy::CacheFirst);

    let route = worker.route(&request("/api/progress"));
    assert_eq!(route.category, Category::Other);
    assert_eq!(route.strategy, Strategy::NetworkFirst);
    assert_eq!(route.cache, names.dynamic_cache);
  }

  #[tokio::test]
  async fn test_image_miss_is_fetched_and_cached() {
    let mut worker = worker();
    worker.network().respond(&url("/r1.webp"), Response::new(200, "webp"));

    let outcome = fetch(&mut worker, request("/r1.webp")).await;

    let Outcome::Responded(served) = outcome else {
      panic!("expected a response");
    };
    assert_eq!(served.response.status, 200);
    let static_cache = worker.cache_names().static_cache.clone();
    assert!(worker
      .storage()
      .match_entry(&static_cache, &url("/r1.webp"))
      .unwrap()
      .is_some());
  }

  #[tokio::test]
  async fn test_audio_offline_serves_stale_entry() {
    let mut worker = worker();
    let audio_cache = worker.cache_names().audio_cache.clone();
    let stale = Response::new(200, "old narration");
    worker
      .storage()
      .put(&audio_cache, &url("/voice1.mp3"), &stale)
      .unwrap();
    worker.network().fail(&url("/voice1.mp3"));

    let outcome = fetch(&mut worker, request("/voice1.mp3")).await;

    let Outcome::Responded(served) = outcome else {
      panic!("expected a response");
    };
    assert_eq!(served.source, CacheSource::CacheFallback);
    assert_eq!(served.response, stale);
  }

  #[tokio::test]
  async fn test_other_request_uses_dynamic_store() {
    let mut worker = worker();
    worker
      .network()
      .respond(&url("/api/stories"), Response::new(200, "[]"));

    fetch(&mut worker, request("/api/stories")).await;

    let dynamic_cache = worker.cache_names().dynamic_cache.clone();
    assert_eq!(
      worker.storage().keys(&dynamic_cache).unwrap(),
      vec![url("/api/stories")]
    );
  }

  #[tokio::test]
  async fn test_cross_origin_passes_through() {
    let mut worker = worker();

    let outcome = fetch(&mut worker, request("https://cdn.example.com/r1.webp")).await;

    assert!(matches!(outcome, Outcome::Passthrough));
    assert!(worker.network().calls().is_empty());
    assert!(worker.storage().cache_names().unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_non_get_passes_through() {
    let mut worker = worker();

    let outcome = fetch(&mut worker, request("/api/progress").with_method(Method::POST)).await;

    assert!(matches!(outcome, Outcome::Passthrough));
    assert!(worker.network().calls().is_empty());
  }

  #[tokio::test]
  async fn test_push_shows_notification() {
    let mut worker = worker();
    let data = br#"{"title":"New story","body":"Read it now"}"#.to_vec();

    let outcome = worker.dispatch(Event::Push(Some(data))).await.unwrap();

    let Outcome::Notified(notification) = outcome else {
      panic!("expected a notification");
    };
    assert_eq!(notification.title, "New story");
    assert_eq!(notification.actions.len(), 2);
    assert_eq!(worker.host().calls(), vec!["show_notification:New story"]);
  }

  #[tokio::test]
  async fn test_push_without_or_with_bad_data_is_ignored() {
    let mut worker = worker();

    let outcome = worker.dispatch(Event::Push(None)).await.unwrap();
    assert!(matches!(outcome, Outcome::Ignored));

    let outcome = worker
      .dispatch(Event::Push(Some(b"{oops".to_vec())))
      .await
      .unwrap();
    assert!(matches!(outcome, Outcome::Ignored));
    assert!(worker.host().calls().is_empty());
  }

  #[tokio::test]
  async fn test_explore_click_opens_root() {
    let mut worker = worker();

    let outcome = worker
      .dispatch(Event::NotificationClick {
        action: Some("explore".to_string()),
      })
      .await
      .unwrap();

    assert!(matches!(
      outcome,
      Outcome::NotificationClicked { opened: Some(ref url) } if url == "http://localhost:5173/"
    ));
    assert_eq!(
      worker.host().calls(),
      vec!["close_notification", "open_window:http://localhost:5173/"]
    );
  }

  #[tokio::test]
  async fn test_close_click_only_dismisses() {
    let mut worker = worker();

    let outcome = worker
      .dispatch(Event::NotificationClick {
        action: Some("close".to_string()),
      })
      .await
      .unwrap();

    assert!(matches!(
      outcome,
      Outcome::NotificationClicked { opened: None }
    ));
    assert_eq!(worker.host().calls(), vec!["close_notification"]);
  }

  #[tokio::test]
  async fn test_sync() {
    let mut worker = worker();

    let outcome = worker
      .dispatch(Event::Sync {
        tag: BACKGROUND_SYNC_TAG.to_string(),
      })
      .await
      .unwrap();
    assert!(matches!(outcome, Outcome::Synced { .. }));

    let outcome = worker
      .dispatch(Event::Sync {
        tag: "other".to_string(),
      })
      .await
      .unwrap();
    assert!(matches!(outcome, Outcome::Ignored));
  }
}
