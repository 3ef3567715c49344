//! SAK 后端入口
//!
//! 加载 .env 与配置、初始化日志、打开审计库并启动 HTTP 服务；Ctrl+C 时优雅关闭并等待审计队列写完。

use std::sync::Arc;

use anyhow::Context;
use sak::audit::{AuditLogger, SqliteAuditStore};
use sak::config::load_config;
use sak::core::AdvisorRouter;
use sak::web::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 可选
    let _ = dotenvy::dotenv();
    sak::observability::init();

    let config = Arc::new(load_config(None).context("Failed to load config")?);

    let store = SqliteAuditStore::open(&config.audit.db_path).with_context(|| {
        format!(
            "Failed to open audit database: {}",
            config.audit.db_path.display()
        )
    })?;
    let (audit, audit_worker) = AuditLogger::spawn(Arc::new(store), config.audit.queue_capacity);

    let advisor =
        AdvisorRouter::from_config(&config, audit).context("Failed to build LLM clients")?;
    if advisor.remote_enabled() {
        tracing::info!("Remote LLM enabled ({})", config.llm.remote.model);
    } else {
        tracing::warn!("No OpenAI key configured, escalated questions will use the local LLM");
    }

    let state = Arc::new(AppState { advisor });
    let app = create_router(Arc::clone(&state));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Safe Sport Advisor backend running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Ok(()) = tokio::signal::ctrl_c().await {
                tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
            }
        })
        .await
        .context("Server failed")?;

    // 最后一个 AuditLogger 随 state 释放后，worker 写完剩余记录退出
    drop(state);
    audit_worker.await.context("Audit worker failed")?;
    tracing::info!("Shutdown complete");
    Ok(())
}
