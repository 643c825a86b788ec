//! Configuration system for the `Sheetboard` client.
//!
//! Supports layered configuration with the following priority (highest
//! first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/sheetboard/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error. The endpoint URL has
//! no compiled default -- it identifies *your* spreadsheet and must come
//! from one of the layers above.

use std::path::PathBuf;
use std::time::Duration;

use crate::store::StatusSet;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),

    /// No endpoint URL in any configuration layer.
    #[error("no endpoint configured (set --endpoint, SHEETBOARD_ENDPOINT, or `endpoint` in the config file)")]
    NoEndpoint,
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    endpoint: Option<String>,
    board: BoardFileConfig,
    sync: SyncFileConfig,
    http: HttpFileConfig,
}

/// `[board]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct BoardFileConfig {
    statuses: Option<Vec<String>>,
    default_board: Option<String>,
}

/// `[sync]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct SyncFileConfig {
    quiet_window_ms: Option<u64>,
}

/// `[http]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct HttpFileConfig {
    timeout_secs: Option<u64>,
    connect_timeout_secs: Option<u64>,
}

// ---------------------------------------------------------------------------
// Resolved configuration (concrete types, all fields populated)
// ---------------------------------------------------------------------------

/// Fully resolved client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Apps Script web-app URL of the sheet endpoint.
    pub endpoint: String,
    /// Board to select at startup; `None` means discover and take the
    /// first listed.
    pub default_board: Option<String>,
    /// Status column labels, in display order.
    pub statuses: StatusSet,
    /// Mutation-free interval before a snapshot is persisted.
    pub quiet_window: Duration,
    /// Overall per-request HTTP timeout.
    pub http_timeout: Duration,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
}

/// Quiet window the persistence contract specifies.
const DEFAULT_QUIET_WINDOW: Duration = Duration::from_millis(1500);

impl ClientConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit config file cannot be read
    /// or parsed, or if no layer provides an endpoint URL.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Self::resolve(cli, &file)
    }

    /// Resolve a `ClientConfig` from CLI args and a parsed config file.
    ///
    /// Priority: CLI > file > default. Separated from `load()` to enable
    /// unit testing without CLI parsing.
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Result<Self, ConfigError> {
        let endpoint = cli
            .endpoint
            .clone()
            .or_else(|| file.endpoint.clone())
            .ok_or(ConfigError::NoEndpoint)?;

        Ok(Self {
            endpoint,
            default_board: cli
                .board
                .clone()
                .or_else(|| file.board.default_board.clone()),
            statuses: file
                .board
                .statuses
                .clone()
                .map_or_else(StatusSet::default, StatusSet::new),
            quiet_window: file
                .sync
                .quiet_window_ms
                .map_or(DEFAULT_QUIET_WINDOW, Duration::from_millis),
            http_timeout: file
                .http
                .timeout_secs
                .map_or(Duration::from_secs(30), Duration::from_secs),
            connect_timeout: file
                .http
                .connect_timeout_secs
                .map_or(Duration::from_secs(10), Duration::from_secs),
        })
    }
}

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Kanban task board backed by a Google Sheet")]
pub struct CliArgs {
    /// Apps Script web-app URL of the sheet endpoint.
    #[arg(long, env = "SHEETBOARD_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Board (sheet) to open instead of the first one listed.
    #[arg(long, env = "SHEETBOARD_BOARD")]
    pub board: Option<String>,

    /// Path to config file (default: `~/.config/sheetboard/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "warn", env = "SHEETBOARD_LOG")]
    pub log_level: String,

    /// What to do once connected.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// One-shot commands the binary can run against the board.
#[derive(clap::Subcommand, Debug, Clone)]
pub enum Command {
    /// List the available boards.
    Boards,
    /// Show the selected board, grouped by status column.
    Show,
}

/// Load and parse a TOML config file.
///
/// If `explicit_path` is `Some`, the file must exist (error if not).
/// If `explicit_path` is `None`, the default path is tried and a missing
/// file is treated as empty config.
fn load_config_file(explicit_path: Option<&std::path::Path>) -> Result<ConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            // No config dir available -- use defaults.
            return Ok(ConfigFile::default());
        };
        config_dir.join("sheetboard").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
