// ABOUTME: Shared application state for the switchyard HTTP server.
// ABOUTME: Holds one blueprint and runner per app plus the live session map; nothing is persisted.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use ulid::Ulid;

use switchyard_agent::{AppBlueprint, ChatSession, ModelClient, RunConfig, Runner, blueprint};
use switchyard_core::AppKind;

use crate::config::SwitchyardConfig;

/// A session behind its own lock; one turn at a time per session.
pub type SessionHandle = Arc<Mutex<ChatSession>>;

/// A registered session and when it was last looked up.
pub struct LiveSession {
    pub handle: SessionHandle,
    pub last_active: Instant,
}

/// Blueprint plus the runner built from it.
pub struct AppEntry {
    pub blueprint: AppBlueprint,
    pub runner: Arc<Runner>,
}

/// Shared application state accessible by all Axum handlers.
pub struct AppState {
    pub sessions: RwLock<HashMap<Ulid, LiveSession>>,
    apps: HashMap<AppKind, AppEntry>,
    provider: String,
    model: String,
}

/// Type alias for the Arc-wrapped state used with Axum's State extractor.
pub type SharedState = Arc<AppState>;

impl AppState {
    /// Build every app around `client`.
    pub fn new(client: Arc<dyn ModelClient>, run_config: RunConfig) -> Self {
        let apps = AppKind::ALL
            .into_iter()
            .map(|kind| {
                let blueprint = blueprint(kind, Arc::clone(&client));
                let runner = Arc::new(blueprint.runner(Arc::clone(&client), run_config));
                (kind, AppEntry { blueprint, runner })
            })
            .collect();

        Self {
            sessions: RwLock::new(HashMap::new()),
            apps,
            provider: client.provider_name().to_string(),
            model: client.model_name().to_string(),
        }
    }

    /// Build the model client from the environment. Fails when the provider's
    /// API key is missing, so the server never starts without one.
    pub fn from_config(config: &SwitchyardConfig) -> Result<Self, anyhow::Error> {
        let client =
            switchyard_agent::create_model_client(&config.provider, config.model.as_deref())?;
        tracing::info!(
            provider = client.provider_name(),
            model = client.model_name(),
            "model client ready"
        );
        Ok(Self::new(client, config.run_config()))
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn app(&self, kind: AppKind) -> Option<&AppEntry> {
        self.apps.get(&kind)
    }

    /// Start a session of `kind` and register it. Returns its id and the app entry.
    pub async fn create_session(&self, kind: AppKind) -> Option<(Ulid, &AppEntry)> {
        let entry = self.apps.get(&kind)?;
        let chat = ChatSession::start(&entry.blueprint, Arc::clone(&entry.runner));
        let id = chat.id();
        self.sessions.write().await.insert(
            id,
            LiveSession {
                handle: Arc::new(Mutex::new(chat)),
                last_active: Instant::now(),
            },
        );
        Some((id, entry))
    }

    /// Look up a session and mark it active.
    pub async fn session(&self, id: Ulid) -> Option<SessionHandle> {
        let mut sessions = self.sessions.write().await;
        let live = sessions.get_mut(&id)?;
        live.last_active = Instant::now();
        Some(Arc::clone(&live.handle))
    }

    /// Drop a session. Returns false if it did not exist.
    pub async fn remove_session(&self, id: Ulid) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            tracing::info!(session_id = %id, "session closed");
        }
        removed
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop sessions not looked up for at least `idle`. A session with a turn
    /// in progress is kept. Returns how many were dropped.
    pub async fn sweep_idle(&self, idle: Duration) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, live| {
            let expired = now.saturating_duration_since(live.last_active) >= idle;
            let busy = live.handle.try_lock().is_err();
            if expired && !busy {
                tracing::info!(session_id = %id, "idle session dropped");
                false
            } else {
                true
            }
        });
        before - sessions.len()
    }
}

/// Periodically drop sessions idle for `idle`, covering clients that went
/// away without sending DELETE.
pub fn spawn_idle_sweeper(state: SharedState, idle: Duration) -> JoinHandle<()> {
    let period = (idle / 4).max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let dropped = state.sweep_idle(idle).await;
            if dropped > 0 {
                tracing::debug!(dropped, "idle sweep finished");
            }
        }
    })
}
