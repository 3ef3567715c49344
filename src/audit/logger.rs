//! 异步审计写入
//!
//! AuditLogger 是可克隆的发送端；record() 用 try_send 入队，从不阻塞也不向调用方报错。
//! 后台 worker 逐条取出，在 spawn_blocking 中调用同步的 AuditStore。
//! 所有发送端被 drop 后 worker 写完剩余记录再退出，main 在关闭时等待它以免丢失日志。

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::audit::{AuditError, AuditStore, ChatLogRecord};

#[derive(Clone)]
pub struct AuditLogger {
    tx: mpsc::Sender<ChatLogRecord>,
}

impl AuditLogger {
    /// 启动 worker，返回发送端与 worker 句柄
    pub fn spawn(store: Arc<dyn AuditStore>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(run_worker(store, rx));
        (Self { tx }, handle)
    }

    /// 入队一条记录；队列满或 worker 已退出时只记错误日志
    pub fn record(&self, record: ChatLogRecord) {
        if let Err(e) = self.try_record(record) {
            tracing::error!("Failed to enqueue chat log: {}", e);
        }
    }

    pub fn try_record(&self, record: ChatLogRecord) -> Result<(), AuditError> {
        self.tx.try_send(record).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => AuditError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => AuditError::Closed,
        })
    }
}

async fn run_worker(store: Arc<dyn AuditStore>, mut rx: mpsc::Receiver<ChatLogRecord>) {
    while let Some(record) = rx.recv().await {
        let store = Arc::clone(&store);
        let result = tokio::task::spawn_blocking(move || store.append(&record)).await;
        match result {
            Ok(Ok(())) => tracing::debug!("Chat log persisted"),
            Ok(Err(e)) => tracing::error!("Failed to persist chat log: {}", e),
            Err(e) => tracing::error!("Chat log writer task panicked: {}", e),
        }
    }
    tracing::debug!("Audit worker stopped");
}
