//! 顾问路由器：单个请求的完整流水线
//!
//! start → classified → {local-direct | escalation} → answered → logged → done
//!
//! - 简单问题：原文 + 人设交给本地模型
//! - 其余问题：先用本地模型脱敏，之后只使用脱敏文本；有远端凭据走远端，否则走本地
//! - 所有推理调用严格串行；任一阶段失败立即终止，不写审计
//! - 审计写入异步进行，失败不影响已算出的回答

use std::sync::Arc;

use crate::audit::{AuditLogger, ChatLogRecord};
use crate::config::AppConfig;
use crate::core::classifier::DifficultyClassifier;
use crate::core::decision::RoutingDecision;
use crate::core::error::{AdvisorError, Stage};
use crate::core::prompts::{advisor_prompt, direct_answer_prompt};
use crate::llm::{Backend, LlmClient, OllamaClient, OpenAiClient};
use crate::privacy::{AnonymizedMessage, Anonymizer, Category, ResidualScanner};

/// 一次请求的处理结果
#[derive(Debug, Clone)]
pub struct AdvisorReply {
    pub reply: String,
    pub decision: RoutingDecision,
    pub detected: Vec<Category>,
}

impl AdvisorReply {
    pub fn routed_to(&self) -> Backend {
        self.decision.backend()
    }

    pub fn anonymized(&self) -> bool {
        self.decision.is_anonymized()
    }
}

pub struct AdvisorRouter {
    classifier: DifficultyClassifier,
    anonymizer: Anonymizer,
    local: Arc<dyn LlmClient>,
    /// 仅在配置了凭据时存在
    remote: Option<Arc<dyn LlmClient>>,
    /// 启用后，远端发送前对脱敏文本做残留扫描
    redaction_gate: Option<ResidualScanner>,
    audit: AuditLogger,
}

impl AdvisorRouter {
    pub fn new(
        local: Arc<dyn LlmClient>,
        remote: Option<Arc<dyn LlmClient>>,
        audit: AuditLogger,
    ) -> Self {
        Self {
            classifier: DifficultyClassifier::new(Arc::clone(&local)),
            anonymizer: Anonymizer::new(Arc::clone(&local)),
            local,
            remote,
            redaction_gate: None,
            audit,
        }
    }

    pub fn with_redaction_gate(mut self, scanner: ResidualScanner) -> Self {
        self.redaction_gate = Some(scanner);
        self
    }

    /// 按配置构造真实后端：远端客户端只在凭据非空时创建
    pub fn from_config(config: &AppConfig, audit: AuditLogger) -> anyhow::Result<Self> {
        let local: Arc<dyn LlmClient> = Arc::new(OllamaClient::new(&config.llm.local)?);

        let remote: Option<Arc<dyn LlmClient>> = match config.remote_api_key() {
            Some(key) => {
                let client: Arc<dyn LlmClient> =
                    Arc::new(OpenAiClient::new(&config.llm.remote, key)?);
                Some(client)
            }
            None => None,
        };

        let mut router = Self::new(local, remote, audit);
        if config.privacy.verify_before_remote {
            router = router.with_redaction_gate(ResidualScanner::new()?);
        }
        Ok(router)
    }

    pub fn remote_enabled(&self) -> bool {
        self.remote.is_some()
    }

    pub fn local_model(&self) -> &str {
        self.local.model()
    }

    /// 远端累计 token（未配置远端时为 0）
    pub fn remote_token_usage(&self) -> (u64, u64, u64) {
        self.remote
            .as_ref()
            .map(|r| r.token_usage())
            .unwrap_or((0, 0, 0))
    }

    pub async fn handle(&self, message: &str) -> Result<AdvisorReply, AdvisorError> {
        // 只拒绝空白消息，原文不做修改地交给模型
        if message.trim().is_empty() {
            return Err(AdvisorError::InvalidInput);
        }

        let easy = self
            .classifier
            .classify(message)
            .await
            .map_err(AdvisorError::backend(Stage::Classification))?;

        let (reply, decision, sent_text, detected) = if easy {
            tracing::info!("Easy question, answering with local LLM");
            let reply = self
                .local
                .complete(&direct_answer_prompt(message))
                .await
                .map_err(AdvisorError::backend(Stage::Answer))?;
            (reply, RoutingDecision::LocalDirect, message.to_string(), Vec::new())
        } else {
            tracing::info!("Complex or sensitive question, anonymizing");
            let anonymized = self
                .anonymizer
                .anonymize(message)
                .await
                .map_err(AdvisorError::backend(Stage::Anonymization))?;

            let (decision, client) = self.escalation_target(&anonymized);
            let reply = client
                .complete(&advisor_prompt(anonymized.text()))
                .await
                .map_err(AdvisorError::backend(Stage::Answer))?;

            let (text, detected) = anonymized.into_parts();
            (reply, decision, text, detected)
        };

        self.audit.record(ChatLogRecord::new(
            sent_text,
            detected.clone(),
            decision.backend(),
            decision.is_anonymized(),
        ));

        tracing::info!(decision = %decision, "Advisor reply ready");
        Ok(AdvisorReply {
            reply,
            decision,
            detected,
        })
    }

    /// 升级路径选后端：无凭据或残留扫描命中时降级到本地
    fn escalation_target(
        &self,
        anonymized: &AnonymizedMessage,
    ) -> (RoutingDecision, &Arc<dyn LlmClient>) {
        let Some(remote) = self.remote.as_ref() else {
            tracing::warn!("No remote API key, answering anonymized input with local LLM");
            return (RoutingDecision::LocalAfterAnonymization, &self.local);
        };

        if let Some(gate) = &self.redaction_gate {
            let residual = gate.residual_categories(anonymized.text());
            if !residual.is_empty() {
                tracing::warn!(
                    ?residual,
                    "Anonymized text still looks like personal data, keeping it local"
                );
                return (RoutingDecision::LocalAfterAnonymization, &self.local);
            }
        }

        tracing::info!("Sending anonymized message to remote LLM");
        (RoutingDecision::RemoteAfterAnonymization, remote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryAuditStore;
    use crate::llm::MockLlmClient;
    use tokio::task::JoinHandle;

    const RAW: &str = "My heart rate was 190 at age 34, is that dangerous?";
    const REDACTED: &str = "My heart rate was [HEART_RATE] at age [AGE], is that dangerous?";

    struct Mocks {
        local: Arc<MockLlmClient>,
        remote: Arc<MockLlmClient>,
        store: Arc<MemoryAuditStore>,
    }

    fn build(with_remote: bool) -> (AdvisorRouter, Mocks, JoinHandle<()>) {
        let local = Arc::new(MockLlmClient::new());
        let remote = Arc::new(MockLlmClient::new());
        let store = Arc::new(MemoryAuditStore::new());
        let (audit, handle) = AuditLogger::spawn(store.clone(), 16);

        let remote_client = with_remote.then(|| remote.clone() as Arc<dyn LlmClient>);
        let router = AdvisorRouter::new(local.clone(), remote_client, audit);
        (router, Mocks { local, remote, store }, handle)
    }

    /// drop 掉 router（最后一个发送端）后等待审计 worker 写完
    async fn finish(router: AdvisorRouter, handle: JoinHandle<()>) {
        drop(router);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_easy_question_answered_locally_with_raw_text() {
        let (router, h, handle) = build(true);
        h.local.push_reply("yes");
        h.local.push_reply("Drink 400-600 ml two hours before.");

        let result = router
            .handle("How much water should I drink before a 5k?")
            .await
            .unwrap();

        assert_eq!(result.decision, RoutingDecision::LocalDirect);
        assert_eq!(result.routed_to(), Backend::Local);
        assert!(!result.anonymized());
        assert!(result.detected.is_empty());
        assert_eq!(result.reply, "Drink 400-600 ml two hours before.");

        finish(router, handle).await;
        assert_eq!(h.remote.call_count(), 0);
        let prompts = h.local.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[1].contains("User message: How much water should I drink before a 5k?"));

        let records = h.store.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].anonymized_message, "How much water should I drink before a 5k?");
        assert!(records[0].detected_data_types.is_empty());
        assert!(!records[0].anonymized);
        assert_eq!(records[0].routed_to, Backend::Local);
    }

    #[tokio::test]
    async fn test_escalation_without_credential_stays_local() {
        let (router, h, handle) = build(false);
        h.local.push_reply("no");
        h.local.push_reply(REDACTED);
        h.local.push_reply("SAK here: that can be normal during max effort.");

        let result = router.handle(RAW).await.unwrap();

        assert_eq!(result.decision, RoutingDecision::LocalAfterAnonymization);
        assert_eq!(result.routed_to(), Backend::Local);
        assert!(result.anonymized());
        assert_eq!(result.detected, vec![Category::Age, Category::HeartRate]);

        finish(router, handle).await;
        let prompts = h.local.prompts();
        assert_eq!(prompts.len(), 3);
        assert!(prompts[2].contains(REDACTED));
        assert!(!prompts[2].contains("190"));

        let records = h.store.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].anonymized_message, REDACTED);
        assert!(records[0].anonymized);
        assert_eq!(
            records[0].detected_data_types,
            vec![Category::Age, Category::HeartRate]
        );
    }

    #[tokio::test]
    async fn test_escalation_with_credential_goes_remote_with_redacted_text_only() {
        let (router, h, handle) = build(true);
        h.local.push_reply("No.");
        h.local.push_reply(REDACTED);
        h.remote.push_reply("SAK: see a cardiologist if symptomatic.");

        let result = router.handle(RAW).await.unwrap();

        assert_eq!(result.decision, RoutingDecision::RemoteAfterAnonymization);
        assert_eq!(result.routed_to(), Backend::Remote);
        assert_eq!(result.reply, "SAK: see a cardiologist if symptomatic.");
        assert_eq!(result.detected, vec![Category::Age, Category::HeartRate]);

        finish(router, handle).await;
        assert_eq!(h.local.call_count(), 2);
        let remote_prompts = h.remote.prompts();
        assert_eq!(remote_prompts.len(), 1);
        assert!(remote_prompts[0].contains(REDACTED));
        assert!(!remote_prompts[0].contains(RAW));

        assert_eq!(h.store.records()[0].routed_to, Backend::Remote);
    }

    #[tokio::test]
    async fn test_ambiguous_classifier_output_escalates() {
        for classifier_reply in ["", "maybe", "I'm not sure", "NO"] {
            let (router, h, _handle) = build(false);
            h.local.push_reply(classifier_reply);
            h.local.push_reply("redacted");
            h.local.push_reply("answer");

            let result = router.handle("question").await.unwrap();
            assert_eq!(
                result.decision,
                RoutingDecision::LocalAfterAnonymization,
                "classifier reply {classifier_reply:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_blank_message_is_rejected_before_any_backend_call() {
        let (router, h, handle) = build(true);
        for message in ["", "   ", "\n\t"] {
            let err = router.handle(message).await.unwrap_err();
            assert!(err.is_client_error());
        }

        finish(router, handle).await;
        assert_eq!(h.local.call_count(), 0);
        assert_eq!(h.remote.call_count(), 0);
        assert!(h.store.is_empty());
    }

    #[tokio::test]
    async fn test_classifier_failure_aborts_without_audit() {
        let (router, h, handle) = build(true);
        h.local.push_failure("timeout");

        let err = router.handle(RAW).await.unwrap_err();
        assert!(matches!(
            err,
            AdvisorError::BackendUnavailable {
                stage: Stage::Classification,
                ..
            }
        ));

        finish(router, handle).await;
        assert_eq!(h.local.call_count(), 1);
        assert_eq!(h.remote.call_count(), 0);
        assert!(h.store.is_empty());
    }

    #[tokio::test]
    async fn test_anonymizer_failure_never_reaches_remote() {
        let (router, h, handle) = build(true);
        h.local.push_reply("no");
        h.local.push_failure("model crashed");

        let err = router.handle(RAW).await.unwrap_err();
        assert!(matches!(
            err,
            AdvisorError::BackendUnavailable {
                stage: Stage::Anonymization,
                ..
            }
        ));

        finish(router, handle).await;
        assert_eq!(h.remote.call_count(), 0);
        assert!(h.store.is_empty());
    }

    #[tokio::test]
    async fn test_remote_failure_is_fatal_without_fallback() {
        let (router, h, handle) = build(true);
        h.local.push_reply("no");
        h.local.push_reply(REDACTED);
        h.remote.push_failure("503");

        let err = router.handle(RAW).await.unwrap_err();
        assert!(matches!(
            err,
            AdvisorError::BackendUnavailable {
                stage: Stage::Answer,
                ..
            }
        ));

        finish(router, handle).await;
        assert_eq!(h.local.call_count(), 2);
        assert!(h.store.is_empty());
    }

    #[tokio::test]
    async fn test_redaction_gate_keeps_leaky_text_local() {
        let (router, h, handle) = build(true);
        let router = router.with_redaction_gate(ResidualScanner::new().unwrap());
        h.local.push_reply("no");
        // 模型漏掉了心率
        h.local.push_reply("My heart rate was 190 at age [AGE], is that dangerous?");
        h.local.push_reply("local answer");

        let result = router.handle(RAW).await.unwrap();
        assert_eq!(result.decision, RoutingDecision::LocalAfterAnonymization);
        assert_eq!(result.reply, "local answer");
        assert_eq!(result.detected, vec![Category::Age]);

        finish(router, handle).await;
        assert_eq!(h.remote.call_count(), 0);
    }

    #[tokio::test]
    async fn test_redaction_gate_passes_clean_text_to_remote() {
        let (router, h, handle) = build(true);
        let router = router.with_redaction_gate(ResidualScanner::new().unwrap());
        h.local.push_reply("no");
        h.local.push_reply(REDACTED);
        h.remote.push_reply("remote answer");

        let result = router.handle(RAW).await.unwrap();
        assert_eq!(result.decision, RoutingDecision::RemoteAfterAnonymization);

        finish(router, handle).await;
        assert_eq!(h.remote.call_count(), 1);
        assert_eq!(h.store.len(), 1);
    }

    #[tokio::test]
    async fn test_message_is_forwarded_without_trimming() {
        let (router, h, handle) = build(true);
        h.local.push_reply("yes");
        h.local.push_reply("sure");
        let message = "  How long should I warm up?\n";

        router.handle(message).await.unwrap();

        let prompts = h.local.prompts();
        assert!(prompts[0].contains(message));
        assert!(prompts[1].contains(message));
        finish(router, handle).await;
        assert_eq!(h.store.records()[0].anonymized_message, message);
    }

    #[tokio::test]
    async fn test_audit_failure_does_not_suppress_reply() {
        struct BrokenStore;

        impl crate::audit::AuditStore for BrokenStore {
            fn append(&self, _record: &ChatLogRecord) -> Result<(), crate::audit::AuditError> {
                Err(crate::audit::AuditError::Poisoned)
            }

            fn recent(
                &self,
                _limit: usize,
            ) -> Result<Vec<ChatLogRecord>, crate::audit::AuditError> {
                Ok(Vec::new())
            }
        }

        let local = Arc::new(MockLlmClient::with_replies(["yes", "stay hydrated"]));
        let (audit, handle) = AuditLogger::spawn(Arc::new(BrokenStore), 4);
        let router = AdvisorRouter::new(local, None, audit);

        let result = router.handle("Should I stretch?").await.unwrap();
        assert_eq!(result.reply, "stay hydrated");
        finish(router, handle).await;
    }

    #[tokio::test]
    async fn test_from_config_enables_remote_only_with_key() {
        let (audit, _handle) = AuditLogger::spawn(Arc::new(MemoryAuditStore::new()), 4);

        let mut config = AppConfig::default();
        let router = AdvisorRouter::from_config(&config, audit.clone()).unwrap();
        assert!(!router.remote_enabled());
        assert_eq!(router.local_model(), config.llm.local.model);

        config.llm.remote.api_key = Some("sk-test".to_string());
        let router = AdvisorRouter::from_config(&config, audit).unwrap();
        assert!(router.remote_enabled());
        assert_eq!(router.remote_token_usage(), (0, 0, 0));
    }
}
