//! Per-turn orchestration.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};
use uuid::Uuid;

use agora_context::{detect_workflow_type, ContextManager, ContextStore};
use agora_core::{
    ActionDescriptor, AssistantConfig, Entity, Feedback, Intent, Message,
};
use agora_llm::{build_history, build_system_prompt, should_use_llm, FallbackService};
use agora_nlp::{fuzzy_contains, normalize, NlpEngine};

use crate::error::ChatError;
use crate::response::ResponseGenerator;
use crate::types::Enrichment;

/// Receives resolved platform actions. Implemented by the host application;
/// dispatch is fire-and-forget, so a slow sink never delays the reply.
#[async_trait]
pub trait ActionSink: Send + Sync {
    async fn dispatch(&self, user_id: &str, action: &ActionDescriptor);
}

/// Sink that drops every action. Useful for tests and headless hosts.
pub struct NoopActionSink;

#[async_trait]
impl ActionSink for NoopActionSink {
    async fn dispatch(&self, _user_id: &str, _action: &ActionDescriptor) {}
}

/// Receives user feedback events, e.g. for quality dashboards. Forwarding is
/// fire-and-forget; the feedback is already stored on the message.
#[async_trait]
pub trait FeedbackSink: Send + Sync {
    async fn record(&self, user_id: &str, message_id: Uuid, feedback: Feedback);
}

/// Sink that drops every feedback event.
pub struct NoopFeedbackSink;

#[async_trait]
impl FeedbackSink for NoopFeedbackSink {
    async fn record(&self, _user_id: &str, _message_id: Uuid, _feedback: Feedback) {}
}

/// Wordings that abandon an in-progress workflow.
static CANCEL_PHRASES: &[&str] = &["annuler", "annule", "cancel", "stop", "laisse tomber"];

/// Drives one conversation turn end to end: validate, classify, enrich
/// against context and workflow, route to rules or the LLM, dispatch the
/// action, persist the exchange.
pub struct Orchestrator {
    config: AssistantConfig,
    nlp: NlpEngine,
    contexts: ContextManager,
    llm: FallbackService,
    generator: ResponseGenerator,
    sink: Arc<dyn ActionSink>,
    feedback_sink: Arc<dyn FeedbackSink>,
}

impl Orchestrator {
    pub fn new(
        config: AssistantConfig,
        store: Arc<dyn ContextStore>,
        sink: Arc<dyn ActionSink>,
    ) -> Self {
        let nlp = NlpEngine::new(config.chat.unknown_confidence);
        let contexts = ContextManager::new(
            store,
            Duration::from_millis(config.persistence.debounce_ms),
            config.chat.max_messages,
        );
        let llm = FallbackService::new(&config.llm);
        Self {
            config,
            nlp,
            contexts,
            llm,
            generator: ResponseGenerator::new(),
            sink,
            feedback_sink: Arc::new(NoopFeedbackSink),
        }
    }

    /// Replace the feedback sink. Defaults to a no-op.
    pub fn with_feedback_sink(mut self, sink: Arc<dyn FeedbackSink>) -> Self {
        self.feedback_sink = sink;
        self
    }

    /// Handle one user utterance and return the bot's reply message.
    ///
    /// The reply is already recorded in the conversation history when this
    /// returns. An LLM failure never surfaces here: the turn falls through
    /// to the rule templates.
    pub async fn handle_turn(&self, user_id: &str, input: &str) -> Result<Message, ChatError> {
        if !self.config.chat.enabled {
            return Err(ChatError::Disabled);
        }
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        let max = self.config.chat.max_message_chars;
        if trimmed.chars().count() > max {
            return Err(ChatError::MessageTooLong { max });
        }

        let nlp = self.nlp.classify(trimmed);
        debug!(user = user_id, intent = %nlp.intent, confidence = nlp.confidence, "turn classified");

        let context = self.contexts.context(user_id).await;
        let enrichment = self.enrich(user_id, trimmed, nlp, &context).await;

        let workflow_active = enrichment
            .workflow
            .as_ref()
            .is_some_and(|w| !w.is_complete());
        let response = if self.llm.is_enabled()
            && !enrichment.cancelled
            && should_use_llm(
                &enrichment.nlp,
                workflow_active,
                trimmed,
                &self.config.routing,
            ) {
            // The prompt sees this turn's workflow snapshot, not last turn's.
            let mut prompt_context = context.clone();
            prompt_context.workflow = enrichment.workflow.clone();
            let system = build_system_prompt(&enrichment.nlp, &prompt_context);
            let messages = build_history(&system, &prompt_context, trimmed);
            match self.llm.generate(&messages).await {
                Some(llm_response) => self.generator.decorate_llm(llm_response, &enrichment),
                None => self.generator.generate(&enrichment, &context),
            }
        } else {
            self.generator.generate(&enrichment, &context)
        };

        if !response.action.is_none() {
            let sink = Arc::clone(&self.sink);
            let action = response.action.clone();
            let uid = user_id.to_string();
            tokio::spawn(async move {
                debug!(user = %uid, ?action, "dispatching action");
                sink.dispatch(&uid, &action).await;
            });
        }

        let timestamp = chrono::Utc::now().timestamp();
        let user_msg = Message::from_user(trimmed, timestamp);
        let bot_msg = Message::from_response(&response, timestamp);
        self.contexts
            .record_turn(user_id, user_msg, bot_msg.clone())
            .await;
        Ok(bot_msg)
    }

    /// Resolve this turn's workflow involvement.
    async fn enrich(
        &self,
        user_id: &str,
        trimmed: &str,
        nlp: agora_core::NlpResult,
        context: &agora_context::UserContext,
    ) -> Enrichment {
        let normalized = normalize(trimmed);
        let mut enrichment = Enrichment::plain(nlp);

        let was_active = context.workflow.as_ref().is_some_and(|w| !w.is_complete());

        if was_active && CANCEL_PHRASES.iter().any(|p| fuzzy_contains(&normalized, p)) {
            self.contexts.clear_workflow(user_id).await;
            info!(user = user_id, "workflow cancelled");
            enrichment.cancelled = true;
            return enrichment;
        }

        let mut engaged = was_active;
        if enrichment.nlp.intent == Intent::CreateListing && !was_active {
            let workflow_type = detect_workflow_type(&normalized);
            self.contexts.start_workflow(user_id, workflow_type).await;
            engaged = true;
        }

        if engaged {
            let mut entities = enrichment.nlp.entities.clone();

            // A mid-workflow reply like "je déménage" carries no typed
            // entity; when the pending field accepts free text, the whole
            // utterance fills it.
            if was_active && enrichment.nlp.intent == Intent::Unknown {
                if let Some(next) = context.workflow.as_ref().and_then(|w| w.next_missing()) {
                    if next.is_free_text() && !entities.iter().any(|e| e.kind == next) {
                        entities.push(Entity::new(next, trimmed, (0, normalized.len())));
                    }
                }
            }

            if let Some((state, captured)) =
                self.contexts.advance_workflow(user_id, &entities).await
            {
                if state.is_complete() {
                    info!(user = user_id, workflow = %state.workflow_type, "workflow completed");
                }
                enrichment.workflow = Some(state);
                enrichment.newly_captured = captured;
            }
        }

        enrichment
    }

    /// Attach user feedback to a bot message. Returns whether it was found;
    /// found feedback is also forwarded to the feedback sink.
    pub async fn record_feedback(
        &self,
        user_id: &str,
        message_id: Uuid,
        feedback: Feedback,
    ) -> bool {
        let found = self.contexts.set_feedback(user_id, message_id, feedback).await;
        if found {
            let sink = Arc::clone(&self.feedback_sink);
            let uid = user_id.to_string();
            tokio::spawn(async move {
                sink.record(&uid, message_id, feedback).await;
            });
        }
        found
    }

    /// Conversation history snapshot for a user.
    pub async fn history(&self, user_id: &str) -> Vec<Message> {
        self.contexts.context(user_id).await.history
    }

    pub async fn set_display_name(&self, user_id: &str, name: Option<String>) {
        self.contexts.set_display_name(user_id, name).await;
    }

    pub async fn set_page(&self, user_id: &str, page: Option<String>) {
        self.contexts.set_page(user_id, page).await;
    }

    /// Flush pending context writes. Call before process exit.
    pub async fn shutdown(&self) -> agora_core::Result<()> {
        info!("assistant shutting down, flushing contexts");
        self.contexts.flush().await
    }
}

// =============================================================================
// Tests
// =============================================================================
