pub mod state_machine;

use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use crate::{config::AppConfig, dao::game_store::StorageBackend, error::ServiceError};

/// Cheaply clonable handle to the shared application state.
pub type SharedState = Arc<AppState>;

/// Central application state: the installed storage backend and the engine
/// configuration. Game state itself lives in storage; nothing game-specific is
/// cached between requests.
pub struct AppState {
    backend: RwLock<Option<Arc<dyn StorageBackend>>>,
    degraded: watch::Sender<bool>,
    config: AppConfig,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            backend: RwLock::new(None),
            degraded: degraded_tx,
            config,
        })
    }

    /// Engine configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the current storage backend, if one is installed.
    pub async fn backend(&self) -> Option<Arc<dyn StorageBackend>> {
        let guard = self.backend.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the storage backend or fail with the degraded-mode error.
    pub async fn require_backend(&self) -> Result<Arc<dyn StorageBackend>, ServiceError> {
        self.backend().await.ok_or(ServiceError::Degraded)
    }

    /// Install a storage backend and leave degraded mode.
    pub async fn set_backend(&self, backend: Arc<dyn StorageBackend>) {
        {
            let mut guard = self.backend.write().await;
            *guard = Some(backend);
        }
        self.update_degraded(false).await;
    }

    /// Remove the current storage backend and enter degraded mode.
    pub async fn clear_backend(&self) {
        {
            let mut guard = self.backend.write().await;
            guard.take();
        }
        self.update_degraded(true).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub async fn update_degraded(&self, value: bool) {
        if *self.degraded.borrow() == value {
            return;
        }

        let _ = self.degraded.send(value);
    }
}
