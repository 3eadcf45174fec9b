//! Configuration loading.
//!
//! The host reads `termplex.toml` (or a path it was given) into a [`Config`].
//! Every field has a default, and unknown fields are ignored, so a missing or
//! partial file is fine.

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::error::Result;

/// The file looked for when no path is given.
pub const DEFAULT_PATH: &str = "termplex.toml";

/// A font, by name and point size.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct FontSpec {
  pub name: String,
  pub size: u32,
}

impl FontSpec {
  pub fn new(name: impl Into<String>, size: u32) -> Self {
    Self {
      name: name.into(),
      size,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FontConfig {
  #[serde(default = "FontConfig::default_system")]
  pub system: FontSpec,
  #[serde(default = "FontConfig::default_game")]
  pub game: FontSpec,
}

impl Default for FontConfig {
  fn default() -> Self {
    Self {
      system: Self::default_system(),
      game: Self::default_game(),
    }
  }
}

impl FontConfig {
  fn default_system() -> FontSpec {
    FontSpec::new("6x10x.fon", 10)
  }
  fn default_game() -> FontSpec {
    FontSpec::new("8x13x.fon", 13)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
  /// A backend that must be used; failing to start it is fatal.
  #[serde(default)]
  pub backend: Option<String>,
  /// Backends to try, in order, when none is requested.
  #[serde(default = "Config::default_backends")]
  pub backends: Vec<String>,
  #[serde(default = "Config::default_max_transients")]
  pub max_transients: usize,
  #[serde(default = "Config::default_idle_poll_ms")]
  pub idle_poll_ms: u64,
  #[serde(default)]
  pub redraw_delay_ms: u64,
  /// Pixel distance within which dragged subwindows snap to neighbors.
  #[serde(default = "Config::default_snap_tolerance")]
  pub snap_tolerance: i32,
  #[serde(default)]
  pub layout_file: Option<PathBuf>,
  #[serde(default)]
  pub fonts: FontConfig,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      backend: None,
      backends: Self::default_backends(),
      max_transients: Self::default_max_transients(),
      idle_poll_ms: Self::default_idle_poll_ms(),
      redraw_delay_ms: 0,
      snap_tolerance: Self::default_snap_tolerance(),
      layout_file: None,
      fonts: FontConfig::default(),
    }
  }
}

impl Config {
  fn default_backends() -> Vec<String> {
    vec!["term".to_string(), "headless".to_string()]
  }
  const fn default_max_transients() -> usize {
    16
  }
  const fn default_idle_poll_ms() -> u64 {
    20
  }
  const fn default_snap_tolerance() -> i32 {
    8
  }

  /// Parses a config from TOML text.
  pub fn parse(text: &str) -> Result<Self> {
    Ok(toml::from_str(text)?)
  }

  /// Loads the config at `path`, or the default config if there is no file
  /// there.
  pub fn load(path: &Path) -> Result<Self> {
    if !path.exists() {
      tracing::info!(path = %path.display(), "no config file, using defaults");
      return Ok(Self::default());
    }
    let text = fs::read_to_string(path)?;
    let config = Self::parse(&text)?;
    tracing::info!(path = %path.display(), "loaded config");
    Ok(config)
  }

  /// The fixed period at which blocking reads poll the backend.
  pub fn idle_poll(&self) -> Duration {
    Duration::from_millis(self.idle_poll_ms)
  }

  /// The artificial delay applied after animation redraws.
  pub fn redraw_delay(&self) -> Duration {
    Duration::from_millis(self.redraw_delay_ms)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_file_gives_defaults() {
    assert_eq!(Config::parse("").unwrap(), Config::default());
  }

  #[test]
  fn partial_file_keeps_other_defaults() {
    let config = Config::parse(
      r#"
        backend = "term"
        max_transients = 4

        [fonts.game]
        name = "10x20.fon"
        size = 20
      "#,
    )
    .unwrap();
    assert_eq!(config.backend.as_deref(), Some("term"));
    assert_eq!(config.max_transients, 4);
    assert_eq!(config.idle_poll_ms, 20);
    assert_eq!(config.fonts.game, FontSpec::new("10x20.fon", 20));
    assert_eq!(config.fonts.system, FontConfig::default_system());
  }

  #[test]
  fn bad_types_are_errors() {
    assert!(Config::parse("max_transients = \"lots\"").is_err());
  }
}
