//! Preview server lifecycle: port selection, background tasks, config.

use crate::config::{ConfigUpdate, ServerConfig};
use crate::http::{self, AppState};
use crate::store::{SessionStore, SharedStore};
use std::io;
use std::net::Ipv4Addr;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, error, info};

/// How often the expiry sweep runs. Fixed, independent of the session
/// timeout it enforces.
const SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// How many consecutive ports to try before giving up.
const MAX_BIND_ATTEMPTS: u32 = 100;

/// Pause between stop and start during a restart, giving the OS a moment
/// to release the listener port.
const RESTART_GRACE: Duration = Duration::from_millis(250);

/// Errors from starting the preview server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("no free port within {attempts} tries starting from {preferred}")]
    BindExhausted { preferred: u16, attempts: u32 },
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Point-in-time snapshot for status displays.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ServerStatus {
    pub running: bool,
    pub port: u16,
    pub session_count: usize,
    pub max_sessions: usize,
}

struct ServerRuntime {
    port: u16,
    serve_task: JoinHandle<()>,
    sweep_task: JoinHandle<()>,
}

/// The preview server: owns the session store, the listener and sweep
/// tasks, and the live configuration.
///
/// Constructed explicitly and shared by reference. The runtime handle sits
/// behind a lock, so concurrent starts and stops serialize and both calls
/// stay idempotent.
pub struct PreviewServer {
    store: SharedStore,
    config: Arc<RwLock<ServerConfig>>,
    runtime: Mutex<Option<ServerRuntime>>,
}

impl PreviewServer {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            store: Arc::new(RwLock::new(SessionStore::new())),
            config: Arc::new(RwLock::new(config)),
            runtime: Mutex::new(None),
        }
    }

    /// Bind on loopback and serve. When already running this returns the
    /// bound port without touching anything.
    pub async fn start(&self) -> Result<u16, ServerError> {
        let mut runtime = self.runtime.lock().await;
        if let Some(rt) = runtime.as_ref() {
            return Ok(rt.port);
        }

        let preferred = self.config.read().await.port;
        let listener = bind_on_loopback(preferred).await?;
        let port = listener.local_addr()?.port();

        let app = http::router(AppState {
            store: self.store.clone(),
            port,
        });
        let serve_task = tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app).await {
                error!(%err, "preview server terminated");
            }
        });
        let sweep_task = tokio::spawn(sweep_loop(self.store.clone(), self.config.clone()));

        *runtime = Some(ServerRuntime {
            port,
            serve_task,
            sweep_task,
        });
        info!(port, "preview server listening on 127.0.0.1");
        Ok(port)
    }

    /// Shut down and drop all sessions. A no-op when already stopped.
    pub async fn stop(&self) {
        let mut runtime = self.runtime.lock().await;
        let Some(rt) = runtime.take() else {
            return;
        };
        // Aborting closes the listener and cancels the sweep timer;
        // in-flight requests are best-effort.
        rt.sweep_task.abort();
        rt.serve_task.abort();
        self.store.write().await.clear();
        info!(port = rt.port, "preview server stopped");
    }

    /// Stop, give the OS a moment to release the port, start again.
    pub async fn restart(&self) -> Result<u16, ServerError> {
        self.stop().await;
        tokio::time::sleep(RESTART_GRACE).await;
        self.start().await
    }

    /// Merge a partial config change. A new port takes effect on the next
    /// start; limits and timeout steer future evictions and sweeps.
    pub async fn update_config(&self, update: ConfigUpdate) {
        let mut config = self.config.write().await;
        config.apply(update);
        debug!(config = ?*config, "configuration updated");
    }

    pub async fn status(&self) -> ServerStatus {
        let running_port = self.runtime.lock().await.as_ref().map(|rt| rt.port);
        let config = self.config.read().await.clone();
        let session_count = self.store.read().await.len();
        ServerStatus {
            running: running_port.is_some(),
            port: running_port.unwrap_or(config.port),
            session_count,
            max_sessions: config.max_sessions,
        }
    }

    /// Store rendered HTML under a fresh preview id.
    ///
    /// Registration is independent of the listener: sessions registered
    /// while stopped become reachable on the next start.
    pub async fn register_preview(&self, content: String, source: &Path) -> String {
        let max_sessions = self.config.read().await.effective_max_sessions();
        self.store.write().await.register(content, source, max_sessions)
    }

    /// Browser-facing URL for a preview id.
    pub async fn preview_url(&self, id: &str) -> String {
        let port = match self.runtime.lock().await.as_ref() {
            Some(rt) => rt.port,
            None => self.config.read().await.port,
        };
        format!("http://127.0.0.1:{port}/preview/{id}")
    }
}

/// Walk upward from the preferred port until a loopback bind succeeds.
async fn bind_on_loopback(preferred: u16) -> Result<TcpListener, ServerError> {
    let mut port = preferred;
    for _ in 0..MAX_BIND_ATTEMPTS {
        match TcpListener::bind((Ipv4Addr::LOCALHOST, port)).await {
            Ok(listener) => {
                if port != preferred {
                    info!(preferred, port, "preferred port busy, fell back");
                }
                return Ok(listener);
            }
            Err(err) if err.kind() == io::ErrorKind::AddrInUse => {
                debug!(port, "port in use");
                match port.checked_add(1) {
                    Some(next) => port = next,
                    // Ran off the end of the port space.
                    None => break,
                }
            }
            Err(err) => return Err(ServerError::Io(err)),
        }
    }
    Err(ServerError::BindExhausted {
        preferred,
        attempts: MAX_BIND_ATTEMPTS,
    })
}

async fn sweep_loop(store: SharedStore, config: Arc<RwLock<ServerConfig>>) {
    let mut interval = interval(SWEEP_INTERVAL);
    loop {
        interval.tick().await;
        let timeout = config.read().await.session_timeout();
        let removed = store.write().await.sweep_expired(Instant::now(), timeout);
        if removed > 0 {
            info!(removed, "swept expired preview sessions");
        }
    }
}
