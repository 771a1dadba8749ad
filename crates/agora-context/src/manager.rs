//! Per-user conversation state and its single writer.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use agora_core::{Entity, EntityKind, Feedback, Message, Result, WorkflowType};

use crate::persist::{ContextStore, DebouncedWriter};
use crate::workflow::WorkflowState;

/// Where the user currently is in the host application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformContext {
    /// Current page path, if the host reports one.
    pub page: Option<String>,
}

/// Everything the engine remembers about one user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserContext {
    pub display_name: Option<String>,
    /// Conversation history, oldest first, capped by the manager.
    pub history: Vec<Message>,
    /// Active or completed guided workflow, if any.
    pub workflow: Option<WorkflowState>,
    pub platform: PlatformContext,
}

/// Owns the per-user context cache and schedules durable writes.
///
/// Contexts are loaded lazily from the store on first access (session
/// rehydration) and mutated only through methods here, each of which
/// schedules a debounced save.
pub struct ContextManager {
    store: Arc<dyn ContextStore>,
    writer: DebouncedWriter,
    cache: Mutex<HashMap<String, UserContext>>,
    max_messages: usize,
}

impl ContextManager {
    pub fn new(store: Arc<dyn ContextStore>, debounce: Duration, max_messages: usize) -> Self {
        let writer = DebouncedWriter::new(Arc::clone(&store), debounce);
        Self {
            store,
            writer,
            cache: Mutex::new(HashMap::new()),
            max_messages,
        }
    }

    /// Snapshot of a user's context, loading it from the store on first
    /// access. A load failure logs and starts fresh rather than blocking
    /// the conversation.
    pub async fn context(&self, user_id: &str) -> UserContext {
        let mut cache = self.cache.lock().await;
        if let Some(ctx) = cache.get(user_id) {
            return ctx.clone();
        }
        let loaded = match self.store.load(user_id).await {
            Ok(Some(ctx)) => {
                info!("Rehydrated context for {} ({} messages)", user_id, ctx.history.len());
                ctx
            }
            Ok(None) => UserContext::default(),
            Err(e) => {
                tracing::warn!("Failed to load context for {}: {}. Starting fresh.", user_id, e);
                UserContext::default()
            }
        };
        cache.insert(user_id.to_string(), loaded.clone());
        loaded
    }

    /// Mutate a user's context in the cache and schedule a durable write.
    async fn mutate<T>(
        &self,
        user_id: &str,
        f: impl FnOnce(&mut UserContext) -> T,
    ) -> T {
        let snapshot;
        let out;
        {
            let mut cache = self.cache.lock().await;
            let ctx = cache.entry(user_id.to_string()).or_default();
            out = f(ctx);
            snapshot = ctx.clone();
        }
        self.writer.schedule(user_id, snapshot).await;
        out
    }

    pub async fn set_display_name(&self, user_id: &str, name: Option<String>) {
        self.mutate(user_id, |ctx| ctx.display_name = name).await;
    }

    pub async fn set_page(&self, user_id: &str, page: Option<String>) {
        self.mutate(user_id, |ctx| ctx.platform.page = page).await;
    }

    /// Start a guided workflow, replacing any previous one.
    pub async fn start_workflow(&self, user_id: &str, workflow_type: WorkflowType) -> WorkflowState {
        debug!("Starting {} workflow for {}", workflow_type, user_id);
        self.mutate(user_id, |ctx| {
            let state = WorkflowState::new(workflow_type);
            ctx.workflow = Some(state.clone());
            state
        })
        .await
    }

    /// Feed this turn's entities into the active workflow.
    ///
    /// Returns the updated state and the kinds newly captured, or `None`
    /// when no workflow is active.
    pub async fn advance_workflow(
        &self,
        user_id: &str,
        entities: &[Entity],
    ) -> Option<(WorkflowState, Vec<EntityKind>)> {
        self.mutate(user_id, |ctx| {
            ctx.workflow.as_mut().map(|w| {
                let captured = w.absorb(entities);
                (w.clone(), captured)
            })
        })
        .await
    }

    /// Abandon the active workflow, if any. Returns whether one was cleared.
    pub async fn clear_workflow(&self, user_id: &str) -> bool {
        self.mutate(user_id, |ctx| ctx.workflow.take().is_some()).await
    }

    /// Append a user/bot message pair to the history, trimming the oldest
    /// entries beyond the cap.
    pub async fn record_turn(&self, user_id: &str, user_msg: Message, bot_msg: Message) {
        let max = self.max_messages;
        self.mutate(user_id, move |ctx| {
            ctx.history.push(user_msg);
            ctx.history.push(bot_msg);
            if ctx.history.len() > max {
                let excess = ctx.history.len() - max;
                ctx.history.drain(..excess);
            }
        })
        .await;
    }

    /// Attach feedback to a stored bot message. Returns whether the message
    /// was found.
    pub async fn set_feedback(&self, user_id: &str, message_id: Uuid, feedback: Feedback) -> bool {
        self.mutate(user_id, |ctx| {
            match ctx.history.iter_mut().find(|m| m.id == message_id) {
                Some(msg) => {
                    msg.feedback = Some(feedback);
                    true
                }
                None => false,
            }
        })
        .await
    }

    /// Write all pending context snapshots now. Call on shutdown.
    pub async fn flush(&self) -> Result<()> {
        self.writer.flush().await;
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::MemoryStore;
    use agora_core::{BotResponse, ActionDescriptor, ResponseSource};

    fn manager(store: Arc<MemoryStore>) -> ContextManager {
        ContextManager::new(store, Duration::from_millis(10), 6)
    }

    fn bot_message(text: &str, ts: i64) -> Message {
        Message::from_response(
            &BotResponse {
                text: text.into(),
                suggestions: vec![],
                action: ActionDescriptor::None,
                source: ResponseSource::Rule,
                confidence: 0.9,
            },
            ts,
        )
    }

    // ---- Rehydration ----

    #[tokio::test]
    async fn test_context_starts_empty() {
        let m = manager(Arc::new(MemoryStore::new()));
        let ctx = m.context("alice").await;
        assert!(ctx.history.is_empty());
        assert!(ctx.workflow.is_none());
    }

    #[tokio::test]
    async fn test_context_rehydrates_from_store() {
        let store = Arc::new(MemoryStore::new());
        let mut saved = UserContext::default();
        saved.display_name = Some("Alice".into());
        saved.history.push(Message::from_user("bonjour", 1));
        store.save("alice", &saved).await.unwrap();

        let m = manager(store);
        let ctx = m.context("alice").await;
        assert_eq!(ctx.display_name.as_deref(), Some("Alice"));
        assert_eq!(ctx.history.len(), 1);
    }

    #[tokio::test]
    async fn test_contexts_are_isolated_per_user() {
        let m = manager(Arc::new(MemoryStore::new()));
        m.start_workflow("alice", WorkflowType::Sell).await;
        assert!(m.context("alice").await.workflow.is_some());
        assert!(m.context("bob").await.workflow.is_none());
    }

    // ---- Workflow lifecycle ----

    #[tokio::test]
    async fn test_start_and_advance_workflow() {
        let m = manager(Arc::new(MemoryStore::new()));
        m.start_workflow("alice", WorkflowType::Sell).await;

        let (state, captured) = m
            .advance_workflow(
                "alice",
                &[Entity::new(EntityKind::ProductName, "livre", (0, 5))],
            )
            .await
            .unwrap();
        assert_eq!(captured, vec![EntityKind::ProductName]);
        assert_eq!(state.step(), 2);
    }

    #[tokio::test]
    async fn test_advance_without_workflow_is_none() {
        let m = manager(Arc::new(MemoryStore::new()));
        let out = m.advance_workflow("alice", &[]).await;
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn test_clear_workflow() {
        let m = manager(Arc::new(MemoryStore::new()));
        assert!(!m.clear_workflow("alice").await);
        m.start_workflow("alice", WorkflowType::Gift).await;
        assert!(m.clear_workflow("alice").await);
        assert!(m.context("alice").await.workflow.is_none());
    }

    #[tokio::test]
    async fn test_start_workflow_replaces_previous() {
        let m = manager(Arc::new(MemoryStore::new()));
        m.start_workflow("alice", WorkflowType::Sell).await;
        m.advance_workflow(
            "alice",
            &[Entity::new(EntityKind::ProductName, "livre", (0, 5))],
        )
        .await;
        let state = m.start_workflow("alice", WorkflowType::Gift).await;
        assert_eq!(state.workflow_type, WorkflowType::Gift);
        assert_eq!(state.step(), 1);
    }

    // ---- History ----

    #[tokio::test]
    async fn test_record_turn_appends_pair() {
        let m = manager(Arc::new(MemoryStore::new()));
        m.record_turn("alice", Message::from_user("bonjour", 1), bot_message("Salut !", 1))
            .await;
        let ctx = m.context("alice").await;
        assert_eq!(ctx.history.len(), 2);
        assert_eq!(ctx.history[0].text, "bonjour");
        assert_eq!(ctx.history[1].text, "Salut !");
    }

    #[tokio::test]
    async fn test_history_is_capped() {
        let m = manager(Arc::new(MemoryStore::new()));
        for i in 0..10 {
            m.record_turn(
                "alice",
                Message::from_user(format!("msg {}", i), i),
                bot_message("ok", i),
            )
            .await;
        }
        let ctx = m.context("alice").await;
        assert_eq!(ctx.history.len(), 6);
        // Oldest messages were discarded.
        assert_eq!(ctx.history[0].text, "msg 7");
    }

    // ---- Feedback ----

    #[tokio::test]
    async fn test_set_feedback_on_stored_message() {
        let m = manager(Arc::new(MemoryStore::new()));
        let bot = bot_message("Voilà", 1);
        let bot_id = bot.id;
        m.record_turn("alice", Message::from_user("ok", 1), bot).await;

        assert!(m.set_feedback("alice", bot_id, Feedback::Positive).await);
        let ctx = m.context("alice").await;
        assert_eq!(ctx.history[1].feedback, Some(Feedback::Positive));
    }

    #[tokio::test]
    async fn test_set_feedback_unknown_message() {
        let m = manager(Arc::new(MemoryStore::new()));
        assert!(!m.set_feedback("alice", Uuid::new_v4(), Feedback::Negative).await);
    }

    // ---- Persistence ----

    #[tokio::test(start_paused = true)]
    async fn test_mutations_reach_store_after_debounce() {
        let store = Arc::new(MemoryStore::new());
        let m = manager(store.clone());
        m.record_turn("alice", Message::from_user("bonjour", 1), bot_message("Salut", 1))
            .await;

        tokio::time::sleep(Duration::from_millis(50)).await;
        tokio::task::yield_now().await;

        let saved = store.load("alice").await.unwrap().unwrap();
        assert_eq!(saved.history.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_persists_without_waiting() {
        let store = Arc::new(MemoryStore::new());
        let m = ContextManager::new(store.clone(), Duration::from_secs(60), 100);
        m.start_workflow("alice", WorkflowType::Swap).await;
        m.flush().await.unwrap();
        let saved = store.load("alice").await.unwrap().unwrap();
        assert!(saved.workflow.is_some());
    }
}
