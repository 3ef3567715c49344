//! 核心路由层：Prompt 模板、难度判定、路由决策、请求流水线与错误

pub mod classifier;
pub mod decision;
pub mod error;
pub mod prompts;
pub mod router;

pub use classifier::{is_affirmative, DifficultyClassifier};
pub use decision::RoutingDecision;
pub use error::{AdvisorError, Stage};
pub use router::{AdvisorReply, AdvisorRouter};
