//! 内存审计存储（测试与无数据库运行时使用）

use std::sync::Mutex;

use chrono::Utc;

use crate::audit::{AuditError, AuditStore, ChatLogRecord};

#[derive(Debug, Default)]
pub struct MemoryAuditStore {
    records: Mutex<Vec<ChatLogRecord>>,
}

impl MemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 全部记录，按写入顺序
    pub fn records(&self) -> Vec<ChatLogRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditStore for MemoryAuditStore {
    fn append(&self, record: &ChatLogRecord) -> Result<(), AuditError> {
        let mut stored = record.clone();
        stored.created_at.get_or_insert_with(Utc::now);
        self.records
            .lock()
            .map_err(|_| AuditError::Poisoned)?
            .push(stored);
        Ok(())
    }

    fn recent(&self, limit: usize) -> Result<Vec<ChatLogRecord>, AuditError> {
        let records = self.records.lock().map_err(|_| AuditError::Poisoned)?;
        Ok(records.iter().rev().take(limit).cloned().collect())
    }
}
