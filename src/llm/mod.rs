//! LLM 层：客户端抽象与实现（本地 Ollama / 远端 OpenAI / Mock）

pub mod local;
pub mod mock;
pub mod remote;
pub mod traits;

pub use local::OllamaClient;
pub use mock::MockLlmClient;
pub use remote::{OpenAiClient, TokenUsage};
pub use traits::{Backend, LlmClient, LlmError};
