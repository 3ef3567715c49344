//! SQLite 审计存储（rusqlite，同步）
//!
//! 表 chat_logs 只做 INSERT / SELECT。detected_data_types 以 JSON 数组文本存储；
//! created_at 缺省时由数据库填当前 UTC 时间。

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use crate::audit::{AuditError, AuditStore, ChatLogRecord};
use crate::llm::Backend;
use crate::privacy::Category;

const NOW_SQL: &str = "strftime('%Y-%m-%d %H:%M:%f+00:00', 'now')";

pub struct SqliteAuditStore {
    conn: Mutex<Connection>,
}

impl SqliteAuditStore {
    /// 打开（或创建）数据库文件；父目录不存在时自动创建
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                // 目录创建失败时交给 Connection::open 报错
                let _ = std::fs::create_dir_all(parent);
            }
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, AuditError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, AuditError> {
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS chat_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                anonymized_message TEXT NOT NULL,
                detected_data_types TEXT NOT NULL DEFAULT '[]',
                routed_to TEXT NOT NULL,
                anonymized INTEGER NOT NULL,
                created_at TEXT NOT NULL DEFAULT ({NOW_SQL})
            );
            CREATE INDEX IF NOT EXISTS idx_chat_logs_created ON chat_logs(created_at);"
        ))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl AuditStore for SqliteAuditStore {
    fn append(&self, record: &ChatLogRecord) -> Result<(), AuditError> {
        let detected = serde_json::to_string(&record.detected_data_types)?;
        let conn = self.conn.lock().map_err(|_| AuditError::Poisoned)?;
        conn.execute(
            &format!(
                "INSERT INTO chat_logs (anonymized_message, detected_data_types, routed_to, anonymized, created_at)
                 VALUES (?1, ?2, ?3, ?4, COALESCE(?5, {NOW_SQL}))"
            ),
            params![
                record.anonymized_message,
                detected,
                record.routed_to.as_str(),
                record.anonymized,
                record.created_at,
            ],
        )?;
        Ok(())
    }

    fn recent(&self, limit: usize) -> Result<Vec<ChatLogRecord>, AuditError> {
        let conn = self.conn.lock().map_err(|_| AuditError::Poisoned)?;
        let mut stmt = conn.prepare(
            "SELECT anonymized_message, detected_data_types, routed_to, anonymized, created_at
             FROM chat_logs ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, bool>(3)?,
                row.get::<_, DateTime<Utc>>(4)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (message, detected, routed_to, anonymized, created_at) = row?;
            let detected_data_types: Vec<Category> = serde_json::from_str(&detected)?;
            records.push(ChatLogRecord {
                anonymized_message: message,
                detected_data_types,
                routed_to: Backend::from_str_lossy(&routed_to),
                anonymized,
                created_at: Some(created_at),
            });
        }
        Ok(records)
    }
}
