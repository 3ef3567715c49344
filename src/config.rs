//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `SAK__*` 覆盖（双下划线表示嵌套，如 `SAK__LLM__LOCAL__MODEL=llama3`），
//! 最后兼容旧部署的 `PORT`、`LOCAL_LLM_MODEL`、`OPENAI_API_KEY`。
//! 进程启动时加载一次，之后只读，以 `Arc<AppConfig>` 注入各组件。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSection,
    pub llm: LlmSection,
    pub privacy: PrivacySection,
    pub audit: AuditSection,
}

/// [server] 段：监听地址
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// [llm] 段：本地与远端两个后端
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LlmSection {
    pub local: LocalLlmSection,
    pub remote: RemoteLlmSection,
}

/// [llm.local] 段：Ollama 端点、模型与生成参数
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LocalLlmSection {
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    /// 最大输出 token 数（Ollama 的 num_predict）
    pub num_predict: u32,
    /// 本地模型可能很慢，默认两分钟
    pub timeout_secs: u64,
}

impl Default for LocalLlmSection {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "llama3".to_string(),
            temperature: 0.7,
            num_predict: 512,
            timeout_secs: 120,
        }
    }
}

/// [llm.remote] 段：OpenAI 兼容端点；api_key 为空视为未配置，路由将降级到本地
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RemoteLlmSection {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for RemoteLlmSection {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            max_tokens: 512,
            timeout_secs: 60,
        }
    }
}

/// [privacy] 段
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PrivacySection {
    /// 发往远端前对脱敏文本做正则二次扫描；命中则改走本地
    pub verify_before_remote: bool,
}

/// [audit] 段：SQLite 路径与异步写入队列容量
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuditSection {
    pub db_path: PathBuf,
    pub queue_capacity: usize,
}

impl Default for AuditSection {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("data/chat_logs.db"),
            queue_capacity: 1024,
        }
    }
}

impl AppConfig {
    /// 远端凭据：仅在非空时返回，Router 以此判断能否走远端
    pub fn remote_api_key(&self) -> Option<&str> {
        self.llm
            .remote
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    /// 兼容旧部署的环境变量（优先级高于文件与 SAK__*）
    fn apply_legacy_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(port) = lookup("PORT").and_then(|p| p.trim().parse().ok()) {
            self.server.port = port;
        }
        if let Some(model) = lookup("LOCAL_LLM_MODEL").filter(|m| !m.trim().is_empty()) {
            self.llm.local.model = model;
        }
        if let Some(key) = lookup("OPENAI_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.llm.remote.api_key = Some(key);
        }
    }
}

/// 从 config 目录加载配置，环境变量 SAK__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 叠加环境变量 SAK__*（双下划线表示嵌套键）
/// 4. 最后应用 PORT / LOCAL_LLM_MODEL / OPENAI_API_KEY
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("SAK")
            .separator("__")
            .try_parsing(true),
    );

    let mut cfg: AppConfig = builder.build()?.try_deserialize()?;
    cfg.apply_legacy_env(|name| std::env::var(name).ok());
    Ok(cfg)
}
