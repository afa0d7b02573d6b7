//! Offline backend for demos: canned suggestions after a fixed delay.

use std::{result::Result as StdResult, time::Duration};

use async_trait::async_trait;
use tokio::time::sleep;

use super::{BackendError, BackendRequest, SuggestionBackend};

pub struct MockBackend {
    delay: Duration,
}

impl MockBackend {
    pub const fn new(delay_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
        }
    }
}

#[async_trait]
impl SuggestionBackend for MockBackend {
    async fn generate(&self, request: &BackendRequest) -> StdResult<String, BackendError> {
        sleep(self.delay).await;

        let current = request.current_translation.trim();
        if current.chars().count() < 5 {
            return Ok(format!("[AI Suggestion for: \"{}\"]", request.source_text));
        }
        if current.split_whitespace().count() < 3 {
            return Ok(" continued text here".to_string());
        }
        Ok(String::new())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
