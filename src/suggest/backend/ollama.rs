//! Local Ollama server (`/api/generate`, non-streaming).

use std::result::Result as StdResult;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{build_prompt, BackendError, BackendRequest, SuggestionBackend};
use crate::{config::BackendConfig, error::Result};

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    top_p: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

pub struct OllamaBackend {
    client: Client,
    base_url: String,
    model: String,
    temperature: f32,
    top_p: f32,
    num_predict: u32,
}

impl OllamaBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            top_p: config.top_p,
            num_predict: config.num_predict,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

fn request_error(e: &reqwest::Error) -> BackendError {
    if e.is_timeout() {
        BackendError::Timeout
    } else {
        BackendError::Network(e.to_string())
    }
}

/// Keep leading spaces (they matter for continuations) but drop the
/// newlines models like to open with, and all trailing whitespace.
fn clean_suggestion(raw: &str) -> String {
    raw.trim_start_matches(['\r', '\n']).trim_end().to_string()
}

#[async_trait]
impl SuggestionBackend for OllamaBackend {
    async fn generate(&self, request: &BackendRequest) -> StdResult<String, BackendError> {
        let body = GenerateRequest {
            model: &self.model,
            prompt: build_prompt(request),
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
                top_p: self.top_p,
                num_predict: self.num_predict,
            },
        };

        let response = self
            .client
            .post(self.url("/api/generate"))
            .json(&body)
            .send()
            .await
            .map_err(|e| request_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                code: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))?;

        tracing::debug!(
            "Ollama '{}' returned {} chars",
            self.model,
            parsed.response.len()
        );
        Ok(clean_suggestion(&parsed.response))
    }

    async fn is_available(&self) -> bool {
        match self.client.get(self.url("/api/tags")).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::info!("Ollama not reachable at {}: {e}", self.base_url);
                false
            }
        }
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
