//! Shared handler state

use warden_store::ClientRegistry;

/// State shared by every handler
pub struct AppState {
    pub registry: ClientRegistry,
}

impl AppState {
    pub fn new(registry: ClientRegistry) -> Self {
        Self { registry }
    }
}
