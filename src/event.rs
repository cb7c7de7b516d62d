use serde::Deserialize;

use crate::cache::Served;
use crate::net::Request;
use crate::worker::Notification;

/// Lifecycle and request events delivered to the worker
#[derive(Debug)]
pub enum Event {
  /// A new version is being installed
  Install,
  /// The new version takes over from the previous one
  Activate,
  /// A page issued a request
  Fetch(Request),
  /// Structured message posted by the host page
  Message(serde_json::Value),
  /// Background sync fired for a tag
  Sync { tag: String },
  /// Push message; `None` when the push carried no data
  Push(Option<Vec<u8>>),
  /// The user clicked a notification or one of its actions
  NotificationClick { action: Option<String> },
}

impl Event {
  pub fn kind(&self) -> &'static str {
    match self {
      Event::Install => "install",
      Event::Activate => "activate",
      Event::Fetch(_) => "fetch",
      Event::Message(_) => "message",
      Event::Sync { .. } => "sync",
      Event::Push(_) => "push",
      Event::NotificationClick { .. } => "notificationclick",
    }
  }
}

/// Messages the host page may post to the worker.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action")]
pub enum ControlMessage {
  /// Re-cache the static manifest
  #[serde(rename = "updateCache")]
  UpdateCache,
}

impl ControlMessage {
  /// `None` for anything that is not a recognized message.
  pub fn parse(value: &serde_json::Value) -> Option<Self> {
    serde_json::from_value(value.clone()).ok()
  }
}

/// What handling an event produced
#[derive(Debug)]
pub enum Outcome {
  Installed {
    static_cached: usize,
    audio_cached: usize,
    /// Audio paths that could not be cached
    audio_failed: Vec<String>,
    skip_waiting: bool,
  },
  Activated {
    /// Stores removed because they belong to another version
    deleted: Vec<String>,
  },
  /// The request was answered by the worker
  Responded(Served),
  /// The request was left to the network untouched
  Passthrough,
  /// An `updateCache` message was handled
  CacheRefreshed { refreshed: bool },
  Synced { tag: String },
  Notified(Notification),
  NotificationClicked { opened: Option<String> },
  /// The event required no action
  Ignored,
}
