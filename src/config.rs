//! Server configuration and runtime config updates.

use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MAX_SESSIONS: usize = 50;
pub const DEFAULT_SESSION_TIMEOUT_MINUTES: u64 = 30;

/// Tunable settings for the preview server.
///
/// `port` is a preference: when it is taken the server walks upward to the
/// next free one. Limits and timeout changes apply to future eviction and
/// sweep decisions; a port change applies to the next start.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub max_sessions: usize,
    pub session_timeout_minutes: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            max_sessions: DEFAULT_MAX_SESSIONS,
            session_timeout_minutes: DEFAULT_SESSION_TIMEOUT_MINUTES,
        }
    }
}

impl ServerConfig {
    /// Idle time after which a session is eligible for the sweep.
    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_minutes * 60)
    }

    /// Capacity limit with a floor of one, so registration always has room
    /// to insert after evicting.
    pub fn effective_max_sessions(&self) -> usize {
        self.max_sessions.max(1)
    }

    /// Merge a partial update, leaving absent fields untouched.
    pub fn apply(&mut self, update: ConfigUpdate) {
        if let Some(port) = update.port {
            self.port = port;
        }
        if let Some(max_sessions) = update.max_sessions {
            self.max_sessions = max_sessions.max(1);
        }
        if let Some(minutes) = update.session_timeout_minutes {
            self.session_timeout_minutes = minutes;
        }
    }
}

/// Partial configuration change, applied over the current settings.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct ConfigUpdate {
    pub port: Option<u16>,
    pub max_sessions: Option<usize>,
    pub session_timeout_minutes: Option<u64>,
}
