//! Asset manifests and versioned cache store names.

pub const DEFAULT_APP_NAME: &str = "asanstorybook";
pub const DEFAULT_VERSION: &str = "v2";

/// Pages and images precached at install time.
pub fn default_static_assets() -> Vec<String> {
  let mut assets = vec![
    "/".to_string(),
    "/index.html".to_string(),
    "/asan_logo.jpg".to_string(),
  ];
  assets.extend((1..=10).map(|n| format!("/r{}.webp", n)));
  assets.push("/manifest.json".to_string());
  assets
}

/// Narration tracks precached at install time.
pub fn default_audio_assets() -> Vec<String> {
  (1..=10).map(|n| format!("/voice{}.mp3", n)).collect()
}

/// The two deploy-time asset lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
  static_assets: Vec<String>,
  audio_assets: Vec<String>,
}

impl Manifest {
  pub fn new(static_assets: Vec<String>, audio_assets: Vec<String>) -> Self {
    Self {
      static_assets,
      audio_assets,
    }
  }

  pub fn static_assets(&self) -> &[String] {
    &self.static_assets
  }

  pub fn audio_assets(&self) -> &[String] {
    &self.audio_assets
  }

  /// Exact, case-sensitive membership in the static manifest.
  pub fn contains_static(&self, path: &str) -> bool {
    self.static_assets.iter().any(|p| p == path)
  }
}

impl Default for Manifest {
  fn default() -> Self {
    Self::new(default_static_assets(), default_audio_assets())
  }
}

/// Names of the three cache stores owned by one version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheNames {
  pub static_cache: String,
  pub dynamic_cache: String,
  pub audio_cache: String,
}

impl CacheNames {
  pub fn new(app_name: &str, version: &str) -> Self {
    Self {
      static_cache: format!("{}-static-{}", app_name, version),
      dynamic_cache: format!("{}-dynamic-{}", app_name, version),
      audio_cache: format!("{}-audio-{}", app_name, version),
    }
  }

  /// Stores that survive activation.
  pub fn allow_list(&self) -> [&str; 3] {
    [
      self.static_cache.as_str(),
      self.dynamic_cache.as_str(),
      self.audio_cache.as_str(),
    ]
  }

  pub fn is_current(&self, name: &str) -> bool {
    self.allow_list().contains(&name)
  }
}

impl Default for CacheNames {
  fn default() -> Self {
    Self::new(DEFAULT_APP_NAME, DEFAULT_VERSION)
  }
}
