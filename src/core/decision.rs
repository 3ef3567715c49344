//! 路由决策：每个请求只确定一次，之后不可变

use serde::Serialize;

use crate::llm::Backend;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoutingDecision {
    /// 简单问题，原文交给本地模型
    LocalDirect,
    /// 升级路径，但没有远端凭据（或残留扫描未通过），脱敏文本交给本地模型
    LocalAfterAnonymization,
    /// 升级路径，脱敏文本交给远端模型
    RemoteAfterAnonymization,
}

impl RoutingDecision {
    pub fn backend(&self) -> Backend {
        match self {
            RoutingDecision::RemoteAfterAnonymization => Backend::Remote,
            _ => Backend::Local,
        }
    }

    pub fn is_anonymized(&self) -> bool {
        !matches!(self, RoutingDecision::LocalDirect)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RoutingDecision::LocalDirect => "local-direct",
            RoutingDecision::LocalAfterAnonymization => "local-after-anonymization",
            RoutingDecision::RemoteAfterAnonymization => "remote-after-anonymization",
        }
    }
}

impl std::fmt::Display for RoutingDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
