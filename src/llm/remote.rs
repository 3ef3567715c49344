//! 远端推理客户端（OpenAI 兼容 `/chat/completions`）
//!
//! 通过 async_openai 调用；消息固定为两条：system 人设 + user prompt，并带输出 token 上限。
//! 只有在配置了凭据时才会被构造，因此客户端本身假定 api_key 存在。

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::chat::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CompletionUsage, CreateChatCompletionRequest,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;

use crate::config::RemoteLlmSection;
use crate::core::prompts::REMOTE_SYSTEM_PERSONA;
use crate::llm::{LlmClient, LlmError};

/// 远端调用累计的 token 用量，total 由两项相加得出
#[derive(Debug, Default)]
pub struct TokenUsage {
    prompt: AtomicU64,
    completion: AtomicU64,
}

impl TokenUsage {
    fn record(&self, usage: &CompletionUsage) {
        self.prompt
            .fetch_add(u64::from(usage.prompt_tokens), Ordering::Relaxed);
        self.completion
            .fetch_add(u64::from(usage.completion_tokens), Ordering::Relaxed);
    }

    /// (prompt, completion, total)
    pub fn snapshot(&self) -> (u64, u64, u64) {
        let prompt = self.prompt.load(Ordering::Relaxed);
        let completion = self.completion.load(Ordering::Relaxed);
        (prompt, completion, prompt + completion)
    }
}

/// OpenAI 兼容客户端：持有 Client 与 model 名，complete 时取首条 choice 的 content
pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    model: String,
    max_tokens: u32,
    usage: TokenUsage,
}

impl OpenAiClient {
    pub fn new(section: &RemoteLlmSection, api_key: &str) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(section.timeout_secs))
            .build()
            .map_err(|e| LlmError::Request(format!("failed to build HTTP client: {e}")))?;

        let config = OpenAIConfig::new()
            .with_api_base(section.base_url.trim_end_matches('/'))
            .with_api_key(api_key);

        // 失败一次即返回，429 / 5xx 也不重试
        let no_retry = ExponentialBackoffBuilder::new()
            .with_max_elapsed_time(Some(Duration::ZERO))
            .build();

        Ok(Self {
            client: Client::with_config(config)
                .with_http_client(http)
                .with_backoff(no_retry),
            model: section.model.clone(),
            max_tokens: section.max_tokens,
            usage: TokenUsage::default(),
        })
    }

    fn build_request(&self, prompt: &str) -> Result<CreateChatCompletionRequest, OpenAIError> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(REMOTE_SYSTEM_PERSONA)
                .build()?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()?
                .into(),
        ];

        CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .max_completion_tokens(self.max_tokens)
            .build()
    }
}

fn map_openai_error(e: OpenAIError) -> LlmError {
    match e {
        OpenAIError::JSONDeserialize(..) => LlmError::Malformed(e.to_string()),
        other => LlmError::Request(other.to_string()),
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let request = self.build_request(prompt).map_err(map_openai_error)?;

        tracing::debug!(
            model = %self.model,
            prompt_len = prompt.len(),
            "sending remote chat completion request"
        );

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(map_openai_error)?;

        if let Some(usage) = &response.usage {
            self.usage.record(usage);
        }

        response
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .map(|content| content.trim().to_string())
            .ok_or_else(|| LlmError::Malformed("response has no choice content".to_string()))
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn token_usage(&self) -> (u64, u64, u64) {
        self.usage.snapshot()
    }
}
