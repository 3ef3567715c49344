//! LLM 客户端抽象
//!
//! 本地（Ollama）与远端（OpenAI）后端都实现 LlmClient：输入一段 prompt，返回去除首尾空白的完整文本。
//! 不做流式、不做内部重试；任何传输/状态码/解析失败统一以 LlmError 上抛，调用方一律视为「后端不可用」。

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// 最终回答由哪个后端生成（写入审计日志与 HTTP 响应）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Backend {
    #[serde(rename = "local")]
    Local,
    /// 线上标识沿用前端与历史日志里的 "external"
    #[serde(rename = "external")]
    Remote,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Local => "local",
            Backend::Remote => "external",
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "external" | "remote" => Backend::Remote,
            _ => Backend::Local,
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 推理后端错误；对上层而言三种情况语义相同：后端不可用
#[derive(Error, Debug)]
pub enum LlmError {
    /// 网络错误或超时
    #[error("request failed: {0}")]
    Request(String),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// 响应缺字段或 JSON 不合法
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            LlmError::Malformed(e.to_string())
        } else {
            LlmError::Request(e.to_string())
        }
    }
}

/// LLM 客户端 trait：单轮非流式完成
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// 发送 prompt，等待完整回复（已 trim）
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;

    /// 模型名，仅用于日志与健康检查
    fn model(&self) -> &str;

    /// 获取累计 token 使用统计：(prompt_tokens, completion_tokens, total_tokens)
    /// 默认返回 (0, 0, 0)，具体实现可覆盖
    fn token_usage(&self) -> (u64, u64, u64) {
        (0, 0, 0)
    }
}
