// cmdmate_core/src/session.rs
// Per-client shell state and the registry that hands it out

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex as AsyncMutex;

use crate::config::{Config, SessionConfig};
use crate::cwd_tracker::CwdTracker;
use crate::history::HistoryStore;

/// Generate a unique ID with prefix
pub fn make_id(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4())
}

/// -----------------
/// Session
/// -----------------

pub struct Session {
    pub id: String,
    pub cwd: CwdTracker,
    pub history: HistoryStore,
    pub created_at: DateTime<Utc>,
    closed: bool,
}

impl Session {
    /// Start a session: history is loaded (or degraded to empty) immediately
    pub fn new(cwd: CwdTracker, mut history: HistoryStore) -> Self {
        history.load_or_empty();
        let session = Self {
            id: make_id("session"),
            cwd,
            history,
            created_at: Utc::now(),
            closed: false,
        };
        tracing::info!(session = %session.id, cwd = %session.cwd.get_cwd_string(), "session started");
        session
    }

    pub fn from_config(config: &Config, initial_dir: Option<PathBuf>) -> Self {
        Self::new(
            CwdTracker::new(initial_dir),
            HistoryStore::from_config(&config.history),
        )
    }

    /// In-memory session rooted at `dir` (useful for testing)
    pub fn ephemeral(dir: impl Into<PathBuf>) -> Self {
        Self::new(CwdTracker::new(Some(dir.into())), HistoryStore::in_memory())
    }

    /// Flush history and mark the session finished
    pub fn close(&mut self) {
        if let Err(e) = self.history.flush() {
            tracing::warn!(session = %self.id, "could not save history: {}", e);
        }
        self.closed = true;
        tracing::info!(session = %self.id, "session closed");
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

/// -----------------
/// Session registry
/// -----------------

pub type SharedSession = Arc<AsyncMutex<Session>>;

struct Slot {
    session: SharedSession,
    last_access: Instant,
}

/// Hands out one `Session` per opaque client id.
///
/// Each session sits behind its own async mutex, so two requests for the same
/// id are processed one after the other while different ids proceed
/// independently. Growth is bounded by an idle TTL and a capacity limit with
/// least-recently-used eviction; evicted sessions flush their history.
pub struct SessionRegistry {
    slots: Mutex<HashMap<String, Slot>>,
    factory: Box<dyn Fn() -> Session + Send + Sync>,
    max_sessions: usize,
    idle_ttl: Duration,
}

impl SessionRegistry {
    pub fn new(
        limits: &SessionConfig,
        factory: impl Fn() -> Session + Send + Sync + 'static,
    ) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            factory: Box::new(factory),
            max_sessions: limits.max_sessions.max(1),
            idle_ttl: Duration::from_secs(limits.idle_ttl_secs),
        }
    }

    /// Registry whose sessions are built from `config`
    pub fn from_config(config: Config) -> Self {
        let limits = config.sessions.clone();
        Self::new(&limits, move || Session::from_config(&config, None))
    }

    /// Look up a live session or create one. Returns the id actually used.
    pub fn get_or_create(&self, id: Option<&str>) -> (String, SharedSession) {
        let now = Instant::now();
        let mut evicted = Vec::new();

        let result = {
            let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
            evicted.extend(self.take_expired(&mut slots, now));

            if let Some(slot) = id.and_then(|id| slots.get_mut(id)) {
                slot.last_access = now;
                (id.unwrap_or_default().to_string(), Arc::clone(&slot.session))
            } else {
                if slots.len() >= self.max_sessions {
                    evicted.extend(self.take_least_recent(&mut slots));
                }

                let session = (self.factory)();
                let key = id.map(str::to_string).unwrap_or_else(|| session.id.clone());
                let shared = Arc::new(AsyncMutex::new(session));
                slots.insert(
                    key.clone(),
                    Slot {
                        session: Arc::clone(&shared),
                        last_access: now,
                    },
                );
                (key, shared)
            }
        };

        for (key, session) in evicted {
            close_evicted(&key, session);
        }
        result
    }

    /// Drop sessions idle longer than the TTL; returns how many were removed
    pub fn evict_expired(&self) -> usize {
        let expired = {
            let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
            self.take_expired(&mut slots, Instant::now())
        };
        let count = expired.len();
        for (key, session) in expired {
            close_evicted(&key, session);
        }
        count
    }

    pub fn remove(&self, id: &str) -> bool {
        let removed = {
            let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
            slots.remove(id)
        };
        match removed {
            Some(slot) => {
                close_evicted(id, slot.session);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn take_expired(
        &self,
        slots: &mut HashMap<String, Slot>,
        now: Instant,
    ) -> Vec<(String, SharedSession)> {
        let expired: Vec<String> = slots
            .iter()
            .filter(|(_, slot)| now.duration_since(slot.last_access) >= self.idle_ttl)
            .map(|(key, _)| key.clone())
            .collect();

        expired
            .into_iter()
            .filter_map(|key| slots.remove(&key).map(|slot| (key, slot.session)))
            .collect()
    }

    fn take_least_recent(&self, slots: &mut HashMap<String, Slot>) -> Option<(String, SharedSession)> {
        let oldest = slots
            .iter()
            .min_by_key(|(_, slot)| slot.last_access)
            .map(|(key, _)| key.clone())?;
        slots.remove(&oldest).map(|slot| (oldest, slot.session))
    }
}

/// Flush an evicted session if nobody is using it; a busy session is flushed
/// by whoever holds it when they close it.
fn close_evicted(key: &str, session: SharedSession) {
    match session.try_lock() {
        Ok(mut guard) => {
            if !guard.is_closed() {
                guard.close();
            }
        }
        Err(_) => tracing::debug!(session = key, "evicted session busy, skipping flush"),
    }
    tracing::info!(session = key, "session evicted");
}
