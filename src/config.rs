//! TOML configuration.
//!
//! Every timeout, delay and channel path the pipeline uses lives here so
//! none of them is a hard-coded protocol constant. A missing file means
//! defaults; a file that fails to parse is a startup error.

use std::{
    env, fs,
    path::{Path, PathBuf},
    result::Result as StdResult,
    time::Duration,
};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Environment variable pointing at an explicit config file.
pub const CONFIG_ENV: &str = "SIDECAR_TUI_CONFIG";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub suggest: SuggestConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub inject: InjectConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    /// Load from `explicit`, else `$SIDECAR_TUI_CONFIG`, else the user config dir.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = explicit.map_or_else(resolve_config_path, Path::to_path_buf);
        if !path.exists() {
            if explicit.is_some() {
                return Err(Error::Config {
                    path,
                    reason: "file not found".to_string(),
                });
            }
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(&path)?;
        Self::parse(&raw).map_err(|reason| Error::Config { path, reason })
    }

    /// Parse TOML text; unknown keys are ignored, missing keys take defaults.
    pub fn parse(raw: &str) -> StdResult<Self, String> {
        toml::from_str(raw).map_err(|e| e.to_string())
    }
}

fn resolve_config_path() -> PathBuf {
    if let Ok(path) = env::var(CONFIG_ENV) {
        return PathBuf::from(path);
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sidecar-tui/config.toml")
}

/// Directory holding both socket files. Prefers the per-user runtime dir.
fn socket_dir() -> PathBuf {
    dirs::runtime_dir()
        .or_else(dirs::cache_dir)
        .unwrap_or_else(env::temp_dir)
        .join("sidecar-tui")
}

// ============================================================================
// Transport
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct TransportConfig {
    /// Well-known path of the segment channel shared by both processes.
    #[serde(default = "default_socket_path")]
    pub socket_path: PathBuf,
    /// Path of the channel carrying `Inject` actions back to the host tool.
    #[serde(default = "default_inject_socket_path")]
    pub inject_socket_path: PathBuf,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// How long the reader waits for one writer to finish its message.
    /// Falls back to the connect timeout.
    #[serde(default)]
    pub read_timeout_ms: Option<u64>,
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
    /// Pause before the reader rebinds after a listener failure.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_max_message_bytes")]
    pub max_message_bytes: usize,
}

impl TransportConfig {
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms.unwrap_or(self.connect_timeout_ms))
    }

    pub const fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    pub const fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
            inject_socket_path: default_inject_socket_path(),
            connect_timeout_ms: default_connect_timeout_ms(),
            read_timeout_ms: None,
            shutdown_grace_ms: default_shutdown_grace_ms(),
            retry_delay_ms: default_retry_delay_ms(),
            max_message_bytes: default_max_message_bytes(),
        }
    }
}

fn default_socket_path() -> PathBuf {
    socket_dir().join("segment.sock")
}

fn default_inject_socket_path() -> PathBuf {
    socket_dir().join("inject.sock")
}

const fn default_connect_timeout_ms() -> u64 {
    1000
}

const fn default_shutdown_grace_ms() -> u64 {
    2000
}

const fn default_retry_delay_ms() -> u64 {
    1000
}

const fn default_max_message_bytes() -> usize {
    1024 * 1024
}

// ============================================================================
// Suggestion timing
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct SuggestConfig {
    /// Quiet period after the last edit before a suggestion is requested.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Start a suggestion cycle right after a new segment is loaded.
    #[serde(default = "default_true")]
    pub suggest_on_load: bool,
}

impl SuggestConfig {
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for SuggestConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            suggest_on_load: true,
        }
    }
}

const fn default_debounce_ms() -> u64 {
    500
}

const fn default_true() -> bool {
    true
}

// ============================================================================
// Suggestion backend
// ============================================================================

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Ollama,
    Mock,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_backend_kind")]
    pub kind: BackendKind,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_backend_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_num_predict")]
    pub num_predict: u32,
    #[serde(default = "default_mock_delay_ms")]
    pub mock_delay_ms: u64,
}

impl BackendConfig {
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: default_backend_kind(),
            base_url: default_base_url(),
            model: default_model(),
            timeout_ms: default_backend_timeout_ms(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            num_predict: default_num_predict(),
            mock_delay_ms: default_mock_delay_ms(),
        }
    }
}

const fn default_backend_kind() -> BackendKind {
    BackendKind::Ollama
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama2".to_string()
}

const fn default_backend_timeout_ms() -> u64 {
    30_000
}

const fn default_temperature() -> f32 {
    0.7
}

const fn default_top_p() -> f32 {
    0.9
}

const fn default_num_predict() -> u32 {
    100
}

const fn default_mock_delay_ms() -> u64 {
    800
}

// ============================================================================
// Injection
// ============================================================================

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InjectMode {
    /// Send an `Inject` action over the injection socket.
    Socket,
    /// Pipe the text into an external program.
    Command,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InjectConfig {
    #[serde(default = "default_inject_mode")]
    pub mode: InjectMode,
    /// Program followed by its arguments; the text arrives on stdin.
    #[serde(default)]
    pub command: Vec<String>,
}

impl Default for InjectConfig {
    fn default() -> Self {
        Self {
            mode: default_inject_mode(),
            command: Vec::new(),
        }
    }
}

const fn default_inject_mode() -> InjectMode {
    InjectMode::Socket
}

// ============================================================================
// Logging
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_path")]
    pub path: PathBuf,
    /// `EnvFilter` directive; `RUST_LOG` is applied on top.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: default_log_path(),
            filter: default_log_filter(),
        }
    }
}

fn default_log_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(env::temp_dir)
        .join("sidecar-tui/sidecar-tui.log")
}

fn default_log_filter() -> String {
    "sidecar_tui=info".to_string()
}
