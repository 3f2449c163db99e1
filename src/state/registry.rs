//! Room registry: code allocation, lookup, and reaping of abandoned rooms.

use std::sync::Arc;

use dashmap::DashMap;
use rand::seq::IndexedRandom;
use tracing::info;

use crate::{
    config::AppConfig,
    content::ContentLibrary,
    dto::validation::{ROOM_CODE_CHARSET, ROOM_CODE_LEN},
    state::room::{Room, RoomHandle, RoomMessage},
};

/// Concurrent map of live rooms, keyed by code. The only state shared
/// across room actors.
pub struct RoomRegistry {
    rooms: DashMap<String, RoomHandle>,
    config: Arc<AppConfig>,
    content: Arc<dyn ContentLibrary>,
}

impl RoomRegistry {
    /// Create an empty registry.
    pub fn new(config: Arc<AppConfig>, content: Arc<dyn ContentLibrary>) -> Self {
        Self {
            rooms: DashMap::new(),
            config,
            content,
        }
    }

    /// Allocate a code, spawn the room actor, and register its handle.
    pub fn create_room(&self) -> RoomHandle {
        let code = self.generate_code();
        let handle = Room::spawn(code.clone(), self.config.clone(), self.content.clone());
        self.rooms.insert(code.clone(), handle.clone());
        info!(code = %code, rooms = self.rooms.len(), "room registered");
        handle
    }

    /// Look up a room by code.
    pub fn get(&self, code: &str) -> Option<RoomHandle> {
        self.rooms.get(code).map(|entry| entry.clone())
    }

    /// Number of live rooms.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Whether no room is registered.
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Random unused code over the unambiguous alphabet. After repeated
    /// collisions the code grows a character so allocation always ends.
    fn generate_code(&self) -> String {
        let mut len = ROOM_CODE_LEN;
        let mut attempts = 0usize;
        loop {
            let code: String = (0..len)
                .map(|_| {
                    let b = ROOM_CODE_CHARSET
                        .choose(&mut rand::rng())
                        .copied()
                        .unwrap_or(b'A');
                    b as char
                })
                .collect();
            if !self.rooms.contains_key(&code) {
                return code;
            }
            attempts += 1;
            if attempts % 16 == 0 {
                len += 1;
            }
        }
    }

    /// Drop rooms that have been empty longer than the configured grace.
    pub fn sweep(&self) {
        let grace = self.config.room_grace;
        let stale: Vec<String> = self
            .rooms
            .iter()
            .filter(|entry| entry.idle_for().is_some_and(|idle| idle >= grace))
            .map(|entry| entry.key().clone())
            .collect();
        for code in stale {
            if let Some((_, handle)) = self.rooms.remove(&code) {
                handle.send(RoomMessage::Shutdown);
                info!(code = %code, "reaped empty room");
            }
        }
    }

    /// Periodic sweep task, spawned once at startup.
    pub async fn sweep_loop(self: Arc<Self>) {
        let mut ticker = tokio::time::interval(self.config.sweep_interval);
        // The first tick fires immediately; skip it.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            self.sweep();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{content::BuiltinLibrary, dto::validation};

    fn registry(room_grace: Duration) -> RoomRegistry {
        let config = AppConfig {
            room_grace,
            ..AppConfig::default()
        };
        RoomRegistry::new(Arc::new(config), Arc::new(BuiltinLibrary::new()))
    }

    #[tokio::test]
    async fn created_rooms_get_valid_unique_codes() {
        let registry = registry(Duration::from_secs(300));
        let a = registry.create_room();
        let b = registry.create_room();
        assert!(validation::room_code(&a.code).is_ok());
        assert_ne!(a.code, b.code);
        assert_eq!(registry.len(), 2);
        assert!(registry.get(&a.code).is_some());
    }

    #[tokio::test]
    async fn sweep_reaps_rooms_past_the_grace() {
        let registry = registry(Duration::ZERO);
        let handle = registry.create_room();
        // Never-joined rooms count as empty since creation.
        registry.sweep();
        assert!(registry.get(&handle.code).is_none());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn sweep_keeps_rooms_inside_the_grace() {
        let registry = registry(Duration::from_secs(300));
        let handle = registry.create_room();
        registry.sweep();
        assert!(registry.get(&handle.code).is_some());
    }
}
