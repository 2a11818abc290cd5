//! Services consulted by the resolvers besides data access

pub mod throttle;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::{Config, ThrottleBackend};

pub use throttle::{InMemoryThrottle, RedisThrottle, Throttle, ThrottlePolicy};

/// Build the throttle selected by configuration
pub async fn create_throttle(config: &Config) -> Result<Arc<dyn Throttle>> {
    match &config.throttle_backend {
        ThrottleBackend::Memory => {
            info!(backend = "memory", "Throttle initialized");
            Ok(Arc::new(InMemoryThrottle::new()))
        }
        ThrottleBackend::Redis { url } => {
            let throttle = RedisThrottle::connect(url)
                .await
                .context("Failed to connect throttle to Redis")?;
            info!(backend = "redis", "Throttle initialized");
            Ok(Arc::new(throttle))
        }
    }
}

/// Throttle policy from configuration
pub fn throttle_policy(config: &Config) -> ThrottlePolicy {
    ThrottlePolicy {
        limit: config.throttle_limit,
        window: config.throttle_window,
    }
}
