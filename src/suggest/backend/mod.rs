//! Language-model backends that produce suggestions.
//!
//! A backend is slow and untrusted: it may take seconds, fail, or return
//! nothing useful. The coordinator treats every failure as "no suggestion".

mod mock;
mod ollama;
mod prompt;

use std::{error::Error as StdError, fmt, result::Result as StdResult, sync::Arc};

use async_trait::async_trait;
pub use mock::MockBackend;
pub use ollama::OllamaBackend;
pub use prompt::build_prompt;

use crate::{
    config::{BackendConfig, BackendKind},
    error::Result,
};

/// What the backend is asked to complete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendRequest {
    pub source_text: String,
    pub current_translation: String,
    pub source_lang: String,
    pub target_lang: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Could not reach the backend.
    Network(String),
    /// The backend answered with a non-success status.
    Status { code: u16, body: String },
    /// The response body was not what we expected.
    Parse(String),
    Timeout,
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "backend unreachable: {msg}"),
            Self::Status { code, body } if body.is_empty() => write!(f, "backend returned {code}"),
            Self::Status { code, body } => write!(f, "backend returned {code}: {body}"),
            Self::Parse(msg) => write!(f, "unreadable backend response: {msg}"),
            Self::Timeout => write!(f, "backend timed out"),
        }
    }
}

impl StdError for BackendError {}

/// Something that turns a partial translation into a suggestion.
#[async_trait]
pub trait SuggestionBackend: Send + Sync {
    async fn generate(&self, request: &BackendRequest) -> StdResult<String, BackendError>;

    /// Whether the backend looks reachable right now.
    async fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &str;
}

/// Build the backend selected in the config.
pub fn from_config(config: &BackendConfig) -> Result<Arc<dyn SuggestionBackend>> {
    let backend: Arc<dyn SuggestionBackend> = match config.kind {
        BackendKind::Ollama => Arc::new(OllamaBackend::new(config)?),
        BackendKind::Mock => Arc::new(MockBackend::new(config.mock_delay_ms)),
    };
    tracing::info!("Suggestion backend: {}", backend.name());
    Ok(backend)
}
