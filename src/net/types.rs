//! Request and response values passed between the worker, the cache and the network.

use color_eyre::{eyre::eyre, Result};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

/// Body of the synthetic response served when neither network nor cache can answer.
pub const OFFLINE_BODY: &str = "Offline - Resource not available";

/// What the page intends to do with the fetched resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
  /// Plain `fetch()` from script
  #[default]
  Empty,
  /// Full page navigation
  Document,
  Image,
  Audio,
  Script,
  Style,
  Font,
  Manifest,
}

/// An intercepted request.
#[derive(Debug, Clone)]
pub struct Request {
  pub method: Method,
  pub url: Url,
  pub destination: Destination,
}

impl Request {
  /// Create a GET request with no particular destination.
  pub fn get(url: Url) -> Self {
    Self {
      method: Method::GET,
      url,
      destination: Destination::Empty,
    }
  }

  /// Build a GET request for a root-relative path or an absolute URL.
  ///
  /// Relative targets are resolved against `origin`.
  pub fn resolve(origin: &Url, target: &str) -> Result<Self> {
    let url = Url::parse(target)
      .or_else(|_| origin.join(target))
      .map_err(|e| eyre!("Invalid request target '{}': {}", target, e))?;
    Ok(Self::get(url))
  }

  pub fn with_method(mut self, method: Method) -> Self {
    self.method = method;
    self
  }

  pub fn with_destination(mut self, destination: Destination) -> Self {
    self.destination = destination;
    self
  }

  /// Key under which the response to this request is cached.
  ///
  /// Fragments never reach the server, so they are not part of the key.
  pub fn cache_key(&self) -> String {
    let mut url = self.url.clone();
    url.set_fragment(None);
    url.into()
  }
}

/// A response, either received from the network or read back from a cache store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
  pub status: u16,
  pub status_text: String,
  pub headers: Vec<(String, String)>,
  pub body: Vec<u8>,
}

impl Response {
  pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
    let status_text = StatusCode::from_u16(status)
      .ok()
      .and_then(|s| s.canonical_reason())
      .unwrap_or_default()
      .to_string();

    Self {
      status,
      status_text,
      headers: Vec::new(),
      body: body.into(),
    }
  }

  /// The response served when a request cannot be satisfied offline (503).
  pub fn offline() -> Self {
    Self::new(StatusCode::SERVICE_UNAVAILABLE.as_u16(), OFFLINE_BODY)
      .with_header("content-type", "text/plain; charset=utf-8")
  }

  pub fn with_header(mut self, name: &str, value: &str) -> Self {
    self.headers.push((name.to_string(), value.to_string()));
    self
  }

  /// Case-insensitive header lookup.
  pub fn header(&self, name: &str) -> Option<&str> {
    self
      .headers
      .iter()
      .find(|(n, _)| n.eq_ignore_ascii_case(name))
      .map(|(_, v)| v.as_str())
  }

  /// True for 2xx statuses. Only these responses are ever written to a cache.
  pub fn is_ok(&self) -> bool {
    (200..300).contains(&self.status)
  }
}
