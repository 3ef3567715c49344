//! 脱敏器
//!
//! 始终使用本地模型改写消息，原文不出本地边界。模型输出原样作为脱敏结果，不做后置校验；
//! 命中的类别由占位符扫描得出，仅用于审计。

use std::sync::Arc;

use crate::core::prompts::anonymizer_prompt;
use crate::llm::{LlmClient, LlmError};
use crate::privacy::{detect_categories, Category};

/// 脱敏后的消息与其中出现的占位符类别
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnonymizedMessage {
    text: String,
    detected: Vec<Category>,
}

impl AnonymizedMessage {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let detected = detect_categories(&text);
        Self { text, detected }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn detected(&self) -> &[Category] {
        &self.detected
    }

    pub fn into_parts(self) -> (String, Vec<Category>) {
        (self.text, self.detected)
    }
}

pub struct Anonymizer {
    local: Arc<dyn LlmClient>,
}

impl Anonymizer {
    pub fn new(local: Arc<dyn LlmClient>) -> Self {
        Self { local }
    }

    pub async fn anonymize(&self, message: &str) -> Result<AnonymizedMessage, LlmError> {
        let redacted = self.local.complete(&anonymizer_prompt(message)).await?;
        Ok(AnonymizedMessage::new(redacted))
    }
}
