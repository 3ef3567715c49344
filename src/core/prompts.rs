//! 固定 Prompt 模板
//!
//! 人设（SAK）对所有路径一致，用户无法修改；用户输入只作为模板尾部的数据插入。

use crate::privacy::Category;

/// 远端 chat 请求的 system 消息
pub const REMOTE_SYSTEM_PERSONA: &str =
    "You are SAK, a trusted Safe Sport Advisor. Always identify yourself as SAK.";

const PERSONA_GUIDANCE: &str = "Always identify yourself as SAK.
Provide evidence-based, practical guidance on sports performance, injury prevention, or recovery.
Use a professional but approachable tone.
Respond concisely and confidently.";

/// 难度判定：只允许回答 yes / no
pub fn classifier_prompt(message: &str) -> String {
    format!(
        "You are a routing agent for a Safe Sport Advisor. Reply ONLY \"yes\" or \"no\".
Is this question simple enough to be answered by a local sports advisor without external help?
Question: \"{message}\""
    )
}

/// 脱敏：列出七个类别及其占位符，只返回脱敏后的文本
pub fn anonymizer_prompt(message: &str) -> String {
    let placeholders = Category::ALL
        .iter()
        .map(|c| format!("- {} → {}", c.description(), c.placeholder()))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are a privacy guard for a sports health advisor. REDACT any personal, medical, or biometric data.
Use these placeholders:
{placeholders}

Preserve context. Return only the redacted message, with no commentary.

Input: \"{message}\""
    )
}

/// 简单问题：原文直接交给本地模型
pub fn direct_answer_prompt(message: &str) -> String {
    format!(
        "You are \"SAK\", a world-class Safe Sport Advisor.
{PERSONA_GUIDANCE}
User message: {message}"
    )
}

/// 升级路径：只包含脱敏后的文本
pub fn advisor_prompt(anonymized: &str) -> String {
    format!(
        "You are \"SAK\", a trusted Safe Sport Advisor.
{PERSONA_GUIDANCE}
User input (anonymized): {anonymized}"
    )
}
