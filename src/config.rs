use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

use crate::cache::SqliteStorage;
use crate::manifest::{self, CacheNames, Manifest};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Origin the storybook is served from; root-relative paths resolve here
  pub origin: String,
  /// Prefix of every cache store name
  pub app_name: String,
  /// Version tag; bumping it retires all stores of the previous version
  pub version: String,
  #[serde(deserialize_with = "deserialize_asset_paths")]
  pub static_assets: Vec<String>,
  #[serde(deserialize_with = "deserialize_asset_paths")]
  pub audio_assets: Vec<String>,
  /// Cache database location (defaults to the user data directory)
  pub database: Option<PathBuf>,
  pub notification: NotificationConfig,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      origin: "http://localhost:5173".to_string(),
      app_name: manifest::DEFAULT_APP_NAME.to_string(),
      version: manifest::DEFAULT_VERSION.to_string(),
      static_assets: manifest::default_static_assets(),
      audio_assets: manifest::default_audio_assets(),
      database: None,
      notification: NotificationConfig::default(),
    }
  }
}

/// Presentation of push notifications.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
  pub icon: String,
  pub badge: String,
  pub action_icon: String,
  pub explore_title: String,
  pub close_title: String,
}

impl Default for NotificationConfig {
  fn default() -> Self {
    Self {
      icon: "/icon-192x192.png".to_string(),
      badge: "/icon-72x72.png".to_string(),
      action_icon: "/icon-96x96.png".to_string(),
      explore_title: "이야기 보기".to_string(),
      close_title: "닫기".to_string(),
    }
  }
}

/// Asset paths are trimmed; blank entries are dropped.
fn deserialize_asset_paths<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
  D: serde::Deserializer<'de>,
{
  let v: Vec<String> = Vec::deserialize(deserializer)?;
  Ok(
    v.into_iter()
      .map(|s| s.trim().to_string())
      .filter(|s| !s.is_empty())
      .collect(),
  )
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./storycache.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/storycache/config.yaml
  ///
  /// Falls back to the built-in defaults when no file is found.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("storycache.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("storycache").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents)?;
    config.validate()?;
    Ok(config)
  }

  /// Apply command line overrides. The merged config is validated like a file would be.
  pub fn with_overrides(self, origin: Option<String>, version: Option<String>) -> Result<Self> {
    let config = Config {
      origin: origin.unwrap_or(self.origin),
      version: version.unwrap_or(self.version),
      ..self
    };
    config.validate()?;
    Ok(config)
  }

  fn validate(&self) -> Result<()> {
    self.origin_url()?;

    if self.version.trim().is_empty() {
      return Err(eyre!("version must not be empty"));
    }
    if self.app_name.trim().is_empty() {
      return Err(eyre!("app_name must not be empty"));
    }

    Ok(())
  }

  /// The app origin as a URL.
  pub fn origin_url(&self) -> Result<Url> {
    Url::parse(&self.origin).map_err(|e| eyre!("Invalid origin '{}': {}", self.origin, e))
  }

  pub fn manifest(&self) -> Manifest {
    Manifest::new(self.static_assets.clone(), self.audio_assets.clone())
  }

  pub fn cache_names(&self) -> CacheNames {
    CacheNames::new(&self.app_name, &self.version)
  }

  pub fn database_path(&self) -> Result<PathBuf> {
    match &self.database {
      Some(path) => Ok(path.clone()),
      None => SqliteStorage::default_path(),
    }
  }
}
