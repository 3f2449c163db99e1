//! Server-side state: room actors, their registry, and the shared
//! application context handed to every route.

pub mod phase;
pub mod player;
pub mod registry;
pub mod room;

use std::sync::Arc;

use crate::{config::AppConfig, content::ContentLibrary, state::registry::RoomRegistry};

/// Application-wide context shared by all routes and sockets.
pub struct AppState {
    /// Immutable runtime configuration.
    pub config: Arc<AppConfig>,
    /// Live rooms.
    pub registry: Arc<RoomRegistry>,
}

/// Cheap clonable handle to [`AppState`].
pub type SharedState = Arc<AppState>;

impl AppState {
    /// Assemble the shared state from configuration and a content source.
    pub fn new(config: AppConfig, content: Arc<dyn ContentLibrary>) -> SharedState {
        let config = Arc::new(config);
        let registry = Arc::new(RoomRegistry::new(config.clone(), content));
        Arc::new(Self { config, registry })
    }
}
