//! Shared application state and the domain aggregates it guards.

pub mod quiz;
pub mod room;
pub mod timer;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock, watch};

use crate::{config::AppConfig, dao::room_store::RoomStore, error::ServiceError};

/// Cheaply clonable handle to the process-wide state.
pub type SharedState = Arc<AppState>;

/// Central application state: the installable room store, the degraded flag,
/// and the per-room mutation locks.
///
/// The lock registry is what serializes read-modify-write cycles per room so
/// concurrent mutations on the same code cannot lose updates locally;
/// cross-process races are caught by the store's version check instead.
pub struct AppState {
    config: AppConfig,
    room_store: RwLock<Option<Arc<dyn RoomStore>>>,
    room_locks: DashMap<String, Arc<Mutex<()>>>,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`].
    ///
    /// The application starts in degraded mode until a storage backend is
    /// installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            config,
            room_store: RwLock::new(None),
            room_locks: DashMap::new(),
            degraded: degraded_tx,
        })
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the current room store, if one is installed.
    pub async fn room_store(&self) -> Option<Arc<dyn RoomStore>> {
        let guard = self.room_store.read().await;
        guard.as_ref().cloned()
    }

    /// Room store handle or a degraded-mode error.
    pub async fn require_room_store(&self) -> Result<Arc<dyn RoomStore>, ServiceError> {
        self.room_store
            .read()
            .await
            .as_ref()
            .cloned()
            .ok_or(ServiceError::Degraded)
    }

    /// Install a storage backend and leave degraded mode.
    pub async fn install_room_store(&self, store: Arc<dyn RoomStore>) {
        {
            let mut guard = self.room_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Remove the current storage backend and enter degraded mode.
    pub async fn clear_room_store(&self) {
        {
            let mut guard = self.room_store.write().await;
            guard.take();
        }
        self.update_degraded(true).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Broadcast a new degraded value when it changed.
    pub async fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            let changed = *current != value;
            *current = value;
            changed
        });
    }

    /// Mutation lock for a room code; created on first use and shared by
    /// every subsequent mutation of the same room.
    pub fn room_lock(&self, code: &str) -> Arc<Mutex<()>> {
        self.room_locks
            .entry(code.to_owned())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop the mutation lock of a destroyed room.
    pub fn forget_room_lock(&self, code: &str) {
        self.room_locks.remove(code);
    }
}
