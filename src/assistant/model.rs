use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::LlmConfig;

/// The local model could not produce text. Never leaves the assistant.
#[derive(Error, Debug)]
#[error("Language model unavailable: {0}")]
pub struct ModelUnavailable(pub String);

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, ModelUnavailable>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Text completion against an Ollama-style `/api/generate` endpoint.
pub struct OllamaModel {
    base_url: String,
    model: String,
    temperature: f32,
    http: reqwest::Client,
}

impl OllamaModel {
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature.clamp(0.0, 1.0),
            http: reqwest::Client::new(),
        }
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }
}

#[async_trait]
impl LanguageModel for OllamaModel {
    async fn complete(&self, prompt: &str) -> Result<String, ModelUnavailable> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions { temperature: self.temperature },
        };

        let res = self.http
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| ModelUnavailable(e.to_string()))?;

        if !res.status().is_success() {
            return Err(ModelUnavailable(format!("model responded with {}", res.status())));
        }

        let body: GenerateResponse = res
            .json()
            .await
            .map_err(|e| ModelUnavailable(e.to_string()))?;
        Ok(body.response)
    }
}
