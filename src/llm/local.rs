//! 本地推理客户端（Ollama `/api/generate`）
//!
//! 非流式调用：请求体带 model / prompt / stream=false / options(temperature, num_predict)，
//! 响应取 `response` 字段并 trim。超时默认两分钟，不重试。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::LocalLlmSection;
use crate::llm::{LlmClient, LlmError};

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
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}

/// Ollama 客户端：持有 reqwest Client（内部为 Arc，可廉价克隆）与生成参数
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    url: String,
    model: String,
    temperature: f32,
    num_predict: u32,
}

impl OllamaClient {
    pub fn new(section: &LocalLlmSection) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(section.timeout_secs))
            .build()
            .map_err(|e| LlmError::Request(format!("failed to build HTTP client: {e}")))?;

        let endpoint = section.endpoint.trim_end_matches('/');
        Ok(Self {
            client,
            url: format!("{}/api/generate", endpoint),
            model: section.model.clone(),
            temperature: section.temperature,
            num_predict: section.num_predict,
        })
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let payload = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
                num_predict: self.num_predict,
            },
        };

        tracing::debug!(
            model = %self.model,
            prompt_len = prompt.len(),
            "sending local generate request"
        );

        let response = self.client.post(&self.url).json(&payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: GenerateResponse = response.json().await?;
        body.response
            .map(|text| text.trim().to_string())
            .ok_or_else(|| LlmError::Malformed("missing 'response' field".to_string()))
    }

    fn model(&self) -> &str {
        &self.model
    }
}
