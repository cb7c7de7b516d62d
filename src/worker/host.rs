//! The page-lifecycle and notification services the worker calls out to.

use async_trait::async_trait;
use color_eyre::Result;
use tracing::info;
use url::Url;

use super::notify::Notification;

/// Platform services outside the worker.
#[async_trait]
pub trait Host: Send + Sync {
  /// Activate the installed version without waiting for old clients to close.
  async fn skip_waiting(&self) -> Result<()>;

  /// Take control of every open page immediately.
  async fn claim_clients(&self) -> Result<()>;

  async fn show_notification(&self, notification: &Notification) -> Result<()>;

  async fn close_notification(&self) -> Result<()>;

  /// Open a page at `url`, or focus it if one is already open.
  async fn open_window(&self, url: &Url) -> Result<()>;
}

/// Host for the command line: reports what a browser would do.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleHost;

#[async_trait]
impl Host for ConsoleHost {
  async fn skip_waiting(&self) -> Result<()> {
    info!("Skipping the waiting phase");
    Ok(())
  }

  async fn claim_clients(&self) -> Result<()> {
    info!("Claiming open clients");
    Ok(())
  }

  async fn show_notification(&self, notification: &Notification) -> Result<()> {
    println!("[notification] {}", notification.title);
    if !notification.body.is_empty() {
      println!("  {}", notification.body);
    }
    for action in &notification.actions {
      println!("  ({}) {}", action.action, action.title);
    }
    Ok(())
  }

  async fn close_notification(&self) -> Result<()> {
    info!("Notification closed");
    Ok(())
  }

  async fn open_window(&self, url: &Url) -> Result<()> {
    println!("open {}", url);
    Ok(())
  }
}

#[cfg(test)]
pub mod testing {
  use super::*;
  use std::sync::Mutex;

  /// Host that records every call.
  #[derive(Default)]
  pub struct RecordingHost {
    calls: Mutex<Vec<String>>,
    refuse_skip_waiting: bool,
  }

  impl RecordingHost {
    /// A host whose `skip_waiting` always fails.
    pub fn refusing_skip_waiting() -> Self {
      Self {
        refuse_skip_waiting: true,
        ..Self::default()
      }
    }

    pub fn calls(&self) -> Vec<String> {
      self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
      self.calls.lock().unwrap().push(call);
    }
  }

  #[async_trait]
  impl Host for RecordingHost {
    async fn skip_waiting(&self) -> Result<()> {
      self.record("skip_waiting".to_string());
      if self.refuse_skip_waiting {
        return Err(color_eyre::eyre::eyre!("skip waiting refused"));
      }
      Ok(())
    }

    async fn claim_clients(&self) -> Result<()> {
      self.record("claim_clients".to_string());
      Ok(())
    }

    async fn show_notification(&self, notification: &Notification) -> Result<()> {
      self.record(format!("show_notification:{}", notification.title));
      Ok(())
    }

    async fn close_notification(&self) -> Result<()> {
      self.record("close_notification".to_string());
      Ok(())
    }

    async fn open_window(&self, url: &Url) -> Result<()> {
      self.record(format!("open_window:{}", url));
      Ok(())
    }
  }
}
