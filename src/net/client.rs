use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use reqwest::header::HeaderMap;
use reqwest::Client;
use tracing::debug;

use super::types::{Request, Response};

/// Something that can perform a single network fetch.
///
/// An `Err` means the request never produced a response (offline, DNS failure,
/// connection reset). A response with an error status is still `Ok`.
#[async_trait]
pub trait Fetch: Send + Sync {
  async fn fetch(&self, request: &Request) -> Result<Response>;
}

/// HTTP client backed by reqwest.
///
/// No timeout is configured: a stalled request stays pending until the
/// connection gives up.
#[derive(Clone)]
pub struct HttpClient {
  client: Client,
}

impl HttpClient {
  pub fn new() -> Result<Self> {
    let client = Client::builder()
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { client })
  }
}

#[async_trait]
impl Fetch for HttpClient {
  async fn fetch(&self, request: &Request) -> Result<Response> {
    let response = self
      .client
      .request(request.method.clone(), request.url.clone())
      .send()
      .await
      .map_err(|e| eyre!("Failed to fetch {}: {}", request.url, e))?;

    let status = response.status();
    let headers = header_pairs(response.headers());

    let body = response
      .bytes()
      .await
      .map_err(|e| eyre!("Failed to read body of {}: {}", request.url, e))?;

    Ok(Response {
      status: status.as_u16(),
      status_text: status.canonical_reason().unwrap_or_default().to_string(),
      headers,
      body: body.to_vec(),
    })
  }
}

/// Header values are kept as UTF-8 text; invalid bytes are replaced.
fn header_pairs(headers: &HeaderMap) -> Vec<(String, String)> {
  headers
    .iter()
    .map(|(name, value)| {
      let text = String::from_utf8_lossy(value.as_bytes());
      if std::str::from_utf8(value.as_bytes()).is_err() {
        debug!(header = %name, "Header value is not valid UTF-8");
      }
      (name.as_str().to_string(), text.into_owned())
    })
    .collect()
}
