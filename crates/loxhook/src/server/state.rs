use std::sync::Arc;

use loxhook_api::MiniserverClient;
use loxhook_core::{RateLimiter, Registry};

/// Shared, read-only request context. The rate limiter is the only part
/// with interior mutability.
#[derive(Clone)]
pub struct AppState {
    registry: Arc<Registry>,
    miniserver: Arc<MiniserverClient>,
    limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(registry: Registry, miniserver: MiniserverClient, limiter: RateLimiter) -> Self {
        Self {
            registry: Arc::new(registry),
            miniserver: Arc::new(miniserver),
            limiter: Arc::new(limiter),
        }
    }

    pub(crate) fn registry(&self) -> &Registry {
        &self.registry
    }

    pub(crate) fn miniserver(&self) -> &MiniserverClient {
        &self.miniserver
    }

    pub(crate) fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }
}
