use crate::config::Config;
use crate::gateway::RecordGateway;
use crate::middleware::rate_limit::RateLimiter;
use crate::store::RecordStore;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub gateway: RecordGateway,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>, config: &Config) -> Self {
        Self {
            gateway: RecordGateway::new(store),
            rate_limiter: Arc::new(RateLimiter::from_config(config)),
        }
    }
}
