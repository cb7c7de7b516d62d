//! Command-line driver: each subcommand delivers one event to the worker.

use clap::Subcommand;
use color_eyre::{eyre::eyre, Result};
use reqwest::Method;

use crate::cache::{CacheSource, SqliteStorage};
use crate::event::{Event, Outcome};
use crate::net::{Destination, Fetch, Request};
use crate::worker::{Host, Worker};

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Precache the manifests, then activate the new version
  Install,
  /// Delete stores that belong to other versions
  Activate,
  /// Send a request through the worker
  Fetch {
    /// Root-relative path or absolute URL
    target: String,
    #[arg(short, long, default_value = "GET")]
    method: String,
    #[arg(short, long, value_enum, default_value_t = Destination::Empty)]
    destination: Destination,
  },
  /// Re-cache the static manifest
  UpdateCache,
  /// Post a JSON message to the worker
  Message { json: String },
  /// Fire a background sync
  Sync {
    #[arg(default_value = crate::worker::BACKGROUND_SYNC_TAG)]
    tag: String,
  },
  /// Deliver a push message with a JSON payload
  Push { json: Option<String> },
  /// Click a notification
  Click {
    #[arg(short, long)]
    action: Option<String>,
  },
  /// List cache stores and entry counts
  Caches,
}

pub async fn run<N, H>(command: Command, worker: &mut Worker<SqliteStorage, N, H>) -> Result<()>
where
  N: Fetch + 'static,
  H: Host,
{
  match command {
    Command::Install => {
      let outcome = worker.dispatch(Event::Install).await?;
      report(outcome).await;
      if worker.skip_waiting_requested() {
        let outcome = worker.dispatch(Event::Activate).await?;
        report(outcome).await;
      }
    }
    Command::Activate => report(worker.dispatch(Event::Activate).await?).await,
    Command::Fetch {
      target,
      method,
      destination,
    } => {
      let method: Method = method
        .to_uppercase()
        .parse()
        .map_err(|e| eyre!("Invalid method '{}': {}", method, e))?;
      let request = Request::resolve(worker.origin(), &target)?
        .with_method(method)
        .with_destination(destination);
      report(worker.dispatch(Event::Fetch(request)).await?).await;
    }
    Command::UpdateCache => {
      let message = serde_json::json!({ "action": "updateCache" });
      report(worker.dispatch(Event::Message(message)).await?).await;
    }
    Command::Message { json } => {
      let message =
        serde_json::from_str(&json).map_err(|e| eyre!("Message is not valid JSON: {}", e))?;
      report(worker.dispatch(Event::Message(message)).await?).await;
    }
    Command::Sync { tag } => report(worker.dispatch(Event::Sync { tag }).await?).await,
    Command::Push { json } => {
      let data = json.map(String::into_bytes);
      report(worker.dispatch(Event::Push(data)).await?).await;
    }
    Command::Click { action } => {
      report(worker.dispatch(Event::NotificationClick { action }).await?).await
    }
    Command::Caches => {
      let names = worker.cache_names().clone();
      for (name, count) in worker.storage().entry_counts()? {
        let marker = if names.is_current(&name) { "" } else { " (stale)" };
        println!("{:<32} {:>5} entries{}", name, count, marker);
      }
    }
  }

  Ok(())
}

/// Print an outcome. Waits for background revalidation so it is not cut off at exit.
async fn report(outcome: Outcome) {
  match outcome {
    Outcome::Installed {
      static_cached,
      audio_cached,
      audio_failed,
      ..
    } => {
      println!(
        "installed: {} static, {} audio cached",
        static_cached, audio_cached
      );
      for path in audio_failed {
        println!("  not cached: {}", path);
      }
    }
    Outcome::Activated { deleted } => {
      println!("activated, {} old cache(s) deleted", deleted.len());
      for name in deleted {
        println!("  deleted {}", name);
      }
    }
    Outcome::Responded(mut served) => {
      let source = match served.source {
        CacheSource::Network => "network",
        CacheSource::Cache => "cache",
        CacheSource::CacheFallback => "cache (network failed)",
        CacheSource::Offline => "offline",
      };
      println!(
        "{} {} from {}, {} bytes",
        served.response.status,
        served.response.status_text,
        source,
        served.response.body.len()
      );
      if let Some(content_type) = served.response.header("content-type") {
        println!("  content-type: {}", content_type);
      }
      if served.is_revalidating() {
        println!("  refreshing cached copy");
        served.wait_revalidation().await;
      }
    }
    Outcome::Passthrough => println!("not intercepted"),
    Outcome::CacheRefreshed { refreshed } => {
      if refreshed {
        println!("static cache updated");
      } else {
        println!("static cache update failed");
      }
    }
    Outcome::Synced { tag } => println!("synced {}", tag),
    Outcome::Notified(notification) => println!("notification shown: {}", notification.title),
    Outcome::NotificationClicked { opened } => match opened {
      Some(url) => println!("opened {}", url),
      None => println!("notification dismissed"),
    },
    Outcome::Ignored => println!("ignored"),
  }
}
