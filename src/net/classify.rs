//! Request classification: which requests are intercepted, and what kind of asset each one is.

use reqwest::Method;
use url::Url;

use super::types::{Destination, Request};
use crate::manifest::Manifest;

pub const AUDIO_EXTENSIONS: &[&str] = &[".mp3", ".wav", ".ogg", ".m4a"];
pub const IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".webp", ".gif"];

/// Content category of an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
  Audio,
  Image,
  /// Listed in the static manifest, or a page navigation
  StaticDocument,
  Other,
}

/// Only same-origin GET requests are handled; everything else goes straight
/// to the network untouched.
pub fn is_interceptable(request: &Request, origin: &Url) -> bool {
  request.method == Method::GET && request.url.origin() == origin.origin()
}

pub fn is_audio(request: &Request) -> bool {
  has_extension(request.url.path(), AUDIO_EXTENSIONS)
}

pub fn is_image(request: &Request) -> bool {
  has_extension(request.url.path(), IMAGE_EXTENSIONS)
}

/// Exact path match against the static manifest. `Url::path` already
/// excludes the query and fragment.
pub fn is_static_asset(request: &Request, manifest: &Manifest) -> bool {
  manifest.contains_static(request.url.path())
}

/// Classify a request. First match wins: audio, image, static document, other.
pub fn classify(request: &Request, manifest: &Manifest) -> Category {
  if is_audio(request) {
    Category::Audio
  } else if is_image(request) {
    Category::Image
  } else if is_static_asset(request, manifest) || request.destination == Destination::Document {
    Category::StaticDocument
  } else {
    Category::Other
  }
}

fn has_extension(path: &str, extensions: &[&str]) -> bool {
  let path = path.to_lowercase();
  extensions.iter().any(|ext| path.ends_with(ext))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn origin() -> Url {
    Url::parse("http://localhost:5173").unwrap()
  }

  fn request(target: &str) -> Request {
    Request::resolve(&origin(), target).unwrap()
  }

  #[test]
  fn test_audio_extensions_any_case() {
    let manifest = Manifest::default();
    for path in ["/a.mp3", "/b.WAV", "/c.Ogg", "/d/e.m4a", "/voice1.mp3?v=3"] {
      assert_eq!(classify(&request(path), &manifest), Category::Audio, "{path}");
    }
  }

  #[test]
  fn test_audio_wins_over_document_destination() {
    let manifest = Manifest::new(vec!["/story.mp3".to_string()], Vec::new());
    let req = request("/story.mp3").with_destination(Destination::Document);
    assert_eq!(classify(&req, &manifest), Category::Audio);
  }

  #[test]
  fn test_image_extensions() {
    let manifest = Manifest::default();
    for path in ["/a.png", "/b.JPG", "/c.jpeg", "/r1.webp", "/e.gif"] {
      assert_eq!(classify(&request(path), &manifest), Category::Image, "{path}");
    }
  }

  #[test]
  fn test_manifest_entry_is_static_document() {
    let manifest = Manifest::default();
    assert_eq!(classify(&request("/"), &manifest), Category::StaticDocument);
    assert_eq!(
      classify(&request("/manifest.json"), &manifest),
      Category::StaticDocument
    );
  }

  #[test]
  fn test_manifest_match_ignores_query_and_fragment() {
    let manifest = Manifest::default();
    assert_eq!(
      classify(&request("/index.html?utm=1#intro"), &manifest),
      Category::StaticDocument
    );
  }

  #[test]
  fn test_navigation_is_static_document() {
    let manifest = Manifest::default();
    let req = request("/stories/3").with_destination(Destination::Document);
    assert_eq!(classify(&req, &manifest), Category::StaticDocument);
  }

  #[test]
  fn test_everything_else_is_other() {
    let manifest = Manifest::default();
    assert_eq!(classify(&request("/api/progress"), &manifest), Category::Other);
    assert_eq!(classify(&request("/app.js"), &manifest), Category::Other);
  }

  #[test]
  fn test_cross_origin_not_interceptable() {
    let req = request("https://fonts.example.com/a.woff2");
    assert!(!is_interceptable(&req, &origin()));
  }

  #[test]
  fn test_other_port_not_interceptable() {
    let req = request("http://localhost:8080/r1.webp");
    assert!(!is_interceptable(&req, &origin()));
  }

  #[test]
  fn test_non_get_not_interceptable() {
    let req = request("/api/progress").with_method(Method::POST);
    assert!(!is_interceptable(&req, &origin()));
  }

  #[test]
  fn test_same_origin_get_interceptable() {
    assert!(is_interceptable(&request("/r1.webp"), &origin()));
  }
}
