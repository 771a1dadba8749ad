//! Durable context storage and write debouncing.
//!
//! Stores are pluggable behind [`ContextStore`]; the engine ships an
//! in-memory store for tests and a JSON-file store for real deployments.
//! Writes are funneled through [`DebouncedWriter`] so a burst of turns
//! produces one durable write instead of one per mutation.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use agora_core::Result;

use crate::manager::UserContext;

/// Durable storage for per-user conversation context.
#[async_trait]
pub trait ContextStore: Send + Sync {
    /// Load a user's context. `Ok(None)` means no context has been saved yet.
    async fn load(&self, user_id: &str) -> Result<Option<UserContext>>;

    /// Persist a user's context, replacing any previous snapshot.
    async fn save(&self, user_id: &str, context: &UserContext) -> Result<()>;
}

// =============================================================================
// In-memory store
// =============================================================================

/// Volatile store backed by a map. Used in tests and as a null backend.
#[derive(Default)]
pub struct MemoryStore {
    contexts: Mutex<HashMap<String, UserContext>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of saved contexts. Test hook.
    pub async fn len(&self) -> usize {
        self.contexts.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.contexts.lock().await.is_empty()
    }
}

#[async_trait]
impl ContextStore for MemoryStore {
    async fn load(&self, user_id: &str) -> Result<Option<UserContext>> {
        Ok(self.contexts.lock().await.get(user_id).cloned())
    }

    async fn save(&self, user_id: &str, context: &UserContext) -> Result<()> {
        self.contexts
            .lock()
            .await
            .insert(user_id.to_string(), context.clone());
        Ok(())
    }
}

// =============================================================================
// JSON file store
// =============================================================================

/// One JSON file per user under a base directory.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File path for a user, with the id sanitized so it cannot escape the
    /// base directory.
    fn path_for(&self, user_id: &str) -> PathBuf {
        let safe: String = user_id
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", safe))
    }
}

#[async_trait]
impl ContextStore for JsonFileStore {
    async fn load(&self, user_id: &str) -> Result<Option<UserContext>> {
        let path = self.path_for(user_id);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, user_id: &str, context: &UserContext) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(user_id);
        let content = serde_json::to_string_pretty(context)?;
        tokio::fs::write(&path, content).await?;
        debug!("Context saved to {}", path.display());
        Ok(())
    }
}

// =============================================================================
// Debounced writer
// =============================================================================

struct Pending {
    generation: u64,
    context: UserContext,
}

/// Coalesces saves: each schedule resets the user's timer, and only the last
/// snapshot within the debounce window is written.
///
/// Cancellation is by generation counter rather than task handles: a sleeping
/// writer wakes up, finds its generation stale, and does nothing.
pub struct DebouncedWriter {
    store: Arc<dyn ContextStore>,
    delay: Duration,
    pending: Arc<Mutex<HashMap<String, Pending>>>,
}

impl DebouncedWriter {
    pub fn new(store: Arc<dyn ContextStore>, delay: Duration) -> Self {
        Self {
            store,
            delay,
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Schedule a durable write of `context` after the debounce delay,
    /// superseding any write already pending for this user.
    pub async fn schedule(&self, user_id: &str, context: UserContext) {
        let generation = {
            let mut pending = self.pending.lock().await;
            let entry = pending.entry(user_id.to_string()).or_insert(Pending {
                generation: 0,
                context: context.clone(),
            });
            entry.generation += 1;
            entry.context = context;
            entry.generation
        };

        let store = Arc::clone(&self.store);
        let pending = Arc::clone(&self.pending);
        let delay = self.delay;
        let user_id = user_id.to_string();

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let snapshot = {
                let mut map = pending.lock().await;
                match map.get(&user_id) {
                    Some(p) if p.generation == generation => {
                        map.remove(&user_id).map(|p| p.context)
                    }
                    _ => None,
                }
            };
            if let Some(context) = snapshot {
                if let Err(e) = store.save(&user_id, &context).await {
                    warn!("Failed to persist context for {}: {}", user_id, e);
                }
            }
        });
    }

    /// Write every pending snapshot immediately. Used on shutdown.
    pub async fn flush(&self) {
        let drained: Vec<(String, UserContext)> = {
            let mut pending = self.pending.lock().await;
            pending
                .drain()
                .map(|(user_id, p)| (user_id, p.context))
                .collect()
        };
        for (user_id, context) in drained {
            if let Err(e) = self.store.save(&user_id, &context).await {
                warn!("Failed to flush context for {}: {}", user_id, e);
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
