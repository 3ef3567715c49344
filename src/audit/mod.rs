//! 审计日志：每个处理完成的请求追加一条记录（发往下游的文本、命中类别、后端、是否脱敏、时间）
//!
//! 只追加，不更新、不删除。写入经由异步队列与回复解耦：写失败只记日志，不影响已经算出的回答。

pub mod logger;
pub mod memory;
pub mod record;
pub mod sqlite;

use thiserror::Error;

pub use logger::AuditLogger;
pub use memory::MemoryAuditStore;
pub use record::ChatLogRecord;
pub use sqlite::SqliteAuditStore;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("serialize error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("audit queue is full")]
    QueueFull,

    #[error("audit worker has stopped")]
    Closed,

    #[error("audit store lock poisoned")]
    Poisoned,
}

/// 审计存储：同步接口，由 AuditLogger 在 spawn_blocking 中调用
pub trait AuditStore: Send + Sync {
    fn append(&self, record: &ChatLogRecord) -> Result<(), AuditError>;

    /// 最近的记录，新的在前
    fn recent(&self, limit: usize) -> Result<Vec<ChatLogRecord>, AuditError>;
}
