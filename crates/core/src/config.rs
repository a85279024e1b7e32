//! Configuration for bulk with a project file and user-level fallback.
//!
//! Config priority: explicit path > ./bulk.toml > user (~/.config/bulk/config.toml) > defaults

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Name of the project-relative config file
pub const PROJECT_CONFIG_FILE: &str = "bulk.toml";

// ============================================================================
// Batch Configuration
// ============================================================================

/// Batching policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
  /// Number of commands that closes a batch (default: 3, minimum 1)
  pub size: usize,

  /// Maximum subscriber flushes running at once (default: 0 = unbounded)
  pub max_parallel_flushes: usize,
}

impl Default for BatchConfig {
  fn default() -> Self {
    Self {
      size: 3,
      max_parallel_flushes: 0,
    }
  }
}

// ============================================================================
// Marker Configuration
// ============================================================================

/// Literal tokens that open and close a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
  pub open: String,
  pub close: String,
}

impl Default for MarkerConfig {
  fn default() -> Self {
    Self {
      open: "{".to_string(),
      close: "}".to_string(),
    }
  }
}

// ============================================================================
// Output Configuration
// ============================================================================

/// Settings for the built-in console and file sinks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
  /// Text written before each batch (default: "bulk: ")
  pub prefix: String,

  /// Print each batch to stdout
  pub console: bool,

  /// Write each batch to its own log file
  pub file: bool,

  /// Directory for batch log files (default: current directory)
  pub directory: PathBuf,
}

impl Default for OutputConfig {
  fn default() -> Self {
    Self {
      prefix: "bulk: ".to_string(),
      console: true,
      file: true,
      directory: PathBuf::from("."),
    }
  }
}

// ============================================================================
// Logging Configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
  /// Log level: off, error, warn, info, debug, trace (default: warn)
  pub level: String,
}

impl Default for LoggingConfig {
  fn default() -> Self {
    Self {
      level: "warn".to_string(),
    }
  }
}

// ============================================================================
// Main Configuration
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub batch: BatchConfig,

  #[serde(default)]
  pub markers: MarkerConfig,

  #[serde(default)]
  pub output: OutputConfig,

  #[serde(default)]
  pub logging: LoggingConfig,
}

/// Error loading an explicitly requested config file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("Failed to read {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("Failed to parse {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },
}

impl Config {
  /// Load a specific config file
  pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
      path: path.to_path_buf(),
      source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })
  }

  /// Load config for a working directory, with fallback to user config
  pub fn load_for_dir(dir: &Path) -> Self {
    // Try project-relative first
    let project_config = Self::project_config_path(dir);
    if project_config.exists()
      && let Ok(config) = Self::load_from(&project_config)
    {
      return config;
    }

    // Fall back to user config
    if let Some(user_config_path) = Self::user_config_path()
      && user_config_path.exists()
      && let Ok(config) = Self::load_from(&user_config_path)
    {
      return config;
    }

    Self::default()
  }

  /// Get the user-level config path
  pub fn user_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("BULK_CONFIG_DIR") {
      return Some(PathBuf::from(path).join("config.toml"));
    }

    if let Ok(path) = std::env::var("XDG_CONFIG_HOME") {
      return Some(PathBuf::from(path).join("bulk").join("config.toml"));
    }

    dirs::config_dir().map(|p: PathBuf| p.join("bulk").join("config.toml"))
  }

  /// Get the project-relative config path
  pub fn project_config_path(dir: &Path) -> PathBuf {
    dir.join(PROJECT_CONFIG_FILE)
  }

  /// Generate a default config file as a string
  pub fn generate_template() -> String {
    let defaults = Self::default();
    format!(
      r#"# bulk configuration
# Place in ./{project_file} or ~/.config/bulk/config.toml

# ============================================================================
# Batching
# ============================================================================
[batch]
# Commands per batch
size = {size}
# Subscriber flushes running at once (0 = unbounded)
max_parallel_flushes = {max_parallel}

# ============================================================================
# Block markers
# ============================================================================
[markers]
open = "{open}"
close = "{close}"

# ============================================================================
# Output
# ============================================================================
[output]
prefix = "{prefix}"
console = {console}
file = {file}
directory = "{directory}"

# ============================================================================
# Logging
# ============================================================================
[logging]
# off, error, warn, info, debug, trace (RUST_LOG overrides)
level = "{level}"
"#,
      project_file = PROJECT_CONFIG_FILE,
      size = defaults.batch.size,
      max_parallel = defaults.batch.max_parallel_flushes,
      open = defaults.markers.open,
      close = defaults.markers.close,
      prefix = defaults.output.prefix,
      console = defaults.output.console,
      file = defaults.output.file,
      directory = defaults.output.directory.display(),
      level = defaults.logging.level,
    )
  }
}
