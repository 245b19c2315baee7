use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub api: ApiConfig,
  /// Rows per list page
  #[serde(default = "default_page_size")]
  pub page_size: u64,
  /// How long a fetched result counts as fresh
  #[serde(default = "default_stale_time")]
  pub stale_time_secs: u64,
  /// Auto-refresh period for list pages (off when unset)
  pub refresh_interval_secs: Option<u64>,
  /// Where audit exports are written (defaults to the current directory)
  pub export_dir: Option<PathBuf>,
  #[serde(default = "default_notification_ttl")]
  pub notification_ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  pub url: String,
  #[serde(default = "default_timeout")]
  pub timeout_secs: u64,
}

fn default_page_size() -> u64 {
  crate::pagination::DEFAULT_PAGE_SIZE
}

fn default_stale_time() -> u64 {
  60
}

fn default_notification_ttl() -> u64 {
  5
}

fn default_timeout() -> u64 {
  30
}

impl Config {
  /// Configuration with only the API URL set.
  pub fn with_url(url: impl Into<String>) -> Self {
    Self {
      api: ApiConfig {
        url: url.into(),
        timeout_secs: default_timeout(),
      },
      page_size: default_page_size(),
      stale_time_secs: default_stale_time(),
      refresh_interval_secs: None,
      export_dir: None,
      notification_ttl_secs: default_notification_ttl(),
    }
  }

  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./elder-console.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/elder-console/config.yaml
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
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/elder-console/config.yaml\n\
                 or pass --url."
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("elder-console.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("elder-console").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  pub fn parse(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents)?;
    if config.api.url.trim().is_empty() {
      return Err(eyre!("api.url must not be empty"));
    }
    Ok(config)
  }

  /// Get the Elder API token from `ELDER_API_TOKEN`, if set.
  ///
  /// A missing token is not an error: the health check works without one.
  pub fn get_api_token() -> Option<String> {
    std::env::var("ELDER_API_TOKEN")
      .ok()
      .filter(|t| !t.trim().is_empty())
  }

  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.api.timeout_secs)
  }

  pub fn stale_time(&self) -> Duration {
    Duration::from_secs(self.stale_time_secs)
  }

  pub fn refresh_interval(&self) -> Option<Duration> {
    self
      .refresh_interval_secs
      .filter(|s| *s > 0)
      .map(Duration::from_secs)
  }

  pub fn notification_ttl(&self) -> Duration {
    Duration::from_secs(self.notification_ttl_secs)
  }

  pub fn export_dir(&self) -> PathBuf {
    self
      .export_dir
      .clone()
      .unwrap_or_else(|| PathBuf::from("."))
  }
}
