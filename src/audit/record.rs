use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::llm::Backend;
use crate::privacy::Category;

/// 单条审计记录
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatLogRecord {
    /// 实际发往下游的文本：简单问题为原文，升级路径为脱敏结果
    pub anonymized_message: String,
    pub detected_data_types: Vec<Category>,
    pub routed_to: Backend,
    pub anonymized: bool,
    /// 请求处理完成的时刻；为空时由存储端填写入时间
    pub created_at: Option<DateTime<Utc>>,
}

impl ChatLogRecord {
    pub fn new(
        message: impl Into<String>,
        detected_data_types: Vec<Category>,
        routed_to: Backend,
        anonymized: bool,
    ) -> Self {
        Self {
            anonymized_message: message.into(),
            detected_data_types,
            routed_to,
            anonymized,
            created_at: Some(Utc::now()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_is_stamped_when_built() {
        let before = Utc::now();
        let record = ChatLogRecord::new("q", vec![], Backend::Local, false);
        let after = Utc::now();

        let at = record.created_at.unwrap();
        assert!(before <= at && at <= after);
    }
}
