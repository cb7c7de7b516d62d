//! Push messages and the notifications built from them.

use serde::{Deserialize, Serialize};

use crate::config::NotificationConfig;

pub const EXPLORE_ACTION: &str = "explore";
pub const CLOSE_ACTION: &str = "close";

/// Body of a push message.
#[derive(Debug, Clone, Deserialize)]
pub struct PushPayload {
  pub title: String,
  pub body: String,
}

impl PushPayload {
  pub fn from_bytes(data: &[u8]) -> serde_json::Result<Self> {
    serde_json::from_slice(data)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationAction {
  pub action: String,
  pub title: String,
  pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
  /// Milliseconds since the Unix epoch
  pub date_of_arrival: i64,
  pub primary_key: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
  pub title: String,
  pub body: String,
  pub icon: String,
  pub badge: String,
  pub vibrate: Vec<u32>,
  pub data: NotificationData,
  pub actions: Vec<NotificationAction>,
}

impl Notification {
  pub fn from_payload(payload: PushPayload, config: &NotificationConfig, arrived_at_ms: i64) -> Self {
    Self {
      title: payload.title,
      body: payload.body,
      icon: config.icon.clone(),
      badge: config.badge.clone(),
      vibrate: vec![100, 50, 100],
      data: NotificationData {
        date_of_arrival: arrived_at_ms,
        primary_key: 1,
      },
      actions: vec![
        NotificationAction {
          action: EXPLORE_ACTION.to_string(),
          title: config.explore_title.clone(),
          icon: config.action_icon.clone(),
        },
        NotificationAction {
          action: CLOSE_ACTION.to_string(),
          title: config.close_title.clone(),
          icon: config.action_icon.clone(),
        },
      ],
    }
  }
}
