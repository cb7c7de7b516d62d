//! Scripted network used by unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};

use super::client::Fetch;
use super::types::{Request, Response};

#[derive(Debug, Clone)]
enum Reply {
  Respond(Response),
  Fail,
  /// Never resolves
  Hang,
}

/// Network that answers from a per-URL script. Unscripted URLs fail as if offline.
#[derive(Default)]
pub struct ScriptedNetwork {
  replies: Mutex<HashMap<String, Reply>>,
  calls: Mutex<Vec<String>>,
}

impl ScriptedNetwork {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn respond(&self, url: &str, response: Response) {
    self.set(url, Reply::Respond(response));
  }

  pub fn fail(&self, url: &str) {
    self.set(url, Reply::Fail);
  }

  pub fn hang(&self, url: &str) {
    self.set(url, Reply::Hang);
  }

  /// URLs fetched so far, in call order.
  pub fn calls(&self) -> Vec<String> {
    self.calls.lock().unwrap().clone()
  }

  fn set(&self, url: &str, reply: Reply) {
    self.replies.lock().unwrap().insert(url.to_string(), reply);
  }
}

#[async_trait]
impl Fetch for ScriptedNetwork {
  async fn fetch(&self, request: &Request) -> Result<Response> {
    let url = request.url.to_string();
    self.calls.lock().unwrap().push(url.clone());

    let reply = self.replies.lock().unwrap().get(&url).cloned();
    match reply {
      Some(Reply::Respond(response)) => Ok(response),
      Some(Reply::Hang) => futures::future::pending().await,
      Some(Reply::Fail) | None => Err(eyre!("network unreachable: {}", url)),
    }
  }
}
