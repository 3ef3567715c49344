//! 难度判定器
//!
//! 用本地模型回答 yes / no。判定规则：回复中（忽略大小写）包含子串 "yes" 即视为可本地回答，
//! 其余任何内容（空、含糊、格式错误）一律升级走脱敏路径。模型调用失败直接上抛，不重试。

use std::sync::Arc;

use crate::core::prompts::classifier_prompt;
use crate::llm::{LlmClient, LlmError};

/// 把模型的自由文本收敛为布尔值
pub fn is_affirmative(reply: &str) -> bool {
    reply.to_lowercase().contains("yes")
}

pub struct DifficultyClassifier {
    local: Arc<dyn LlmClient>,
}

impl DifficultyClassifier {
    pub fn new(local: Arc<dyn LlmClient>) -> Self {
        Self { local }
    }

    /// true = 足够简单，可由本地模型直接回答
    pub async fn classify(&self, message: &str) -> Result<bool, LlmError> {
        let reply = self.local.complete(&classifier_prompt(message)).await?;
        let easy = is_affirmative(&reply);
        tracing::debug!(reply = %reply, easy, "difficulty classified");
        Ok(easy)
    }
}
