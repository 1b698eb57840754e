//! Preview session storage: capacity-bounded, time-expiring HTML blobs.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Length of a preview id: a 16-hex-char digest prefix keeps URLs short
/// while making accidental collisions vanishingly rare at these capacities.
pub const ID_LEN: usize = 16;

/// A rendered document held for delivery to the browser.
#[derive(Debug)]
pub struct PreviewSession {
    pub content: String,
    pub source: PathBuf,
    pub created_at: Instant,
    pub last_accessed: Instant,
}

/// Thread-safe handle to the session store.
pub type SharedStore = Arc<RwLock<SessionStore>>;

/// In-memory map of live preview sessions, keyed by preview id.
///
/// Capacity is enforced at registration time (oldest entry evicted first)
/// and idle sessions are reclaimed by periodic sweeps. All operations are
/// single in-memory passes; nothing here does I/O.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<String, PreviewSession>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store rendered HTML and return a fresh preview id for it.
    ///
    /// When the store is already at `max_sessions`, the entry with the
    /// oldest `created_at` is evicted first, so registration always
    /// succeeds.
    pub fn register(&mut self, content: String, source: &Path, max_sessions: usize) -> String {
        if self.sessions.len() >= max_sessions.max(1) {
            if let Some(evicted) = self.evict_oldest() {
                debug!(id = %evicted, "evicted oldest preview session to make room");
            }
        }

        // Re-roll on the off chance a prefix collides with a live session.
        let id = loop {
            let candidate = generate_id(source);
            if !self.sessions.contains_key(&candidate) {
                break candidate;
            }
        };

        let now = Instant::now();
        self.sessions.insert(
            id.clone(),
            PreviewSession {
                content,
                source: source.to_path_buf(),
                created_at: now,
                last_accessed: now,
            },
        );
        debug!(id = %id, source = %source.display(), "registered preview session");
        id
    }

    /// Look up a session's HTML, refreshing its idle timer on hit.
    pub fn get(&mut self, id: &str) -> Option<&str> {
        self.sessions.get_mut(id).map(|session| {
            session.last_accessed = Instant::now();
            session.content.as_str()
        })
    }

    /// Remove the session with the oldest `created_at`, if any.
    ///
    /// Ties on `created_at` go to the first minimal entry in map iteration
    /// order.
    pub fn evict_oldest(&mut self) -> Option<String> {
        let oldest = self
            .sessions
            .iter()
            .min_by_key(|(_, session)| session.created_at)
            .map(|(id, _)| id.clone())?;
        self.sessions.remove(&oldest);
        Some(oldest)
    }

    /// Remove every session idle for longer than `timeout`, returning how
    /// many were dropped. `now` is passed in so callers control the clock.
    pub fn sweep_expired(&mut self, now: Instant, timeout: Duration) -> usize {
        let expired: Vec<String> = self
            .sessions
            .iter()
            .filter(|(_, session)| now.duration_since(session.last_accessed) > timeout)
            .map(|(id, _)| id.clone())
            .collect();

        for id in &expired {
            self.sessions.remove(id);
        }
        expired.len()
    }

    /// Drop all sessions. Used on server shutdown.
    pub fn clear(&mut self) {
        self.sessions.clear();
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Whether `s` has the exact shape of a preview id (16 lowercase hex chars).
pub fn is_preview_id(s: &str) -> bool {
    s.len() == ID_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Derive an unguessable, non-sequential id from the source path plus a
/// timestamp and fresh randomness.
fn generate_id(source: &Path) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();

    let mut hasher = Sha256::new();
    hasher.update(source.to_string_lossy().as_bytes());
    hasher.update(nanos.to_le_bytes());
    hasher.update(Uuid::new_v4().as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..ID_LEN].to_string()
}
