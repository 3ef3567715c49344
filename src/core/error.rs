//! 请求处理错误
//!
//! 输入错误直接告知调用方；推理后端在任一阶段失败都是致命的，对外只返回通用的「顾问不可用」，
//! 具体原因只进日志。

use thiserror::Error;

use crate::llm::LlmError;

/// 后端调用发生在流水线的哪一步
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Classification,
    Anonymization,
    Answer,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Stage::Classification => "classification",
            Stage::Anonymization => "anonymization",
            Stage::Answer => "answer",
        })
    }
}

#[derive(Error, Debug)]
pub enum AdvisorError {
    /// message 缺失、非字符串或为空
    #[error("Message is required")]
    InvalidInput,

    #[error("{stage} backend unavailable: {source}")]
    BackendUnavailable {
        stage: Stage,
        #[source]
        source: LlmError,
    },
}

impl AdvisorError {
    pub fn backend(stage: Stage) -> impl FnOnce(LlmError) -> AdvisorError {
        move |source| AdvisorError::BackendUnavailable { stage, source }
    }

    pub fn is_client_error(&self) -> bool {
        matches!(self, AdvisorError::InvalidInput)
    }
}
