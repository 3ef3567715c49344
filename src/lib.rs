//! SAK - 隐私优先的运动顾问路由
//!
//! 每条消息先由本地模型判定难度：简单问题本地直接回答；其余问题先在本地脱敏，再交给远端模型
//! （未配置凭据时仍由本地回答），最后写一条审计日志。
//!
//! 模块划分：
//! - **audit**: 审计记录、SQLite / 内存存储、异步写入队列
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: Prompt 模板、难度判定、路由决策与请求流水线
//! - **llm**: LLM 客户端抽象与实现（Ollama / OpenAI / Mock）
//! - **observability**: 日志初始化
//! - **privacy**: 脱敏类别、脱敏器、残留数据扫描
//! - **web**: axum HTTP 接口

pub mod audit;
pub mod config;
pub mod core;
pub mod llm;
pub mod observability;
pub mod privacy;
pub mod web;
