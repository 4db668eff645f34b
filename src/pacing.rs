//! Delay abstraction for rate-limited sends, so tests can observe pauses
//! without sleeping.

use std::time::Duration;

use async_trait::async_trait;

#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, duration: Duration);
}

/// Live implementation: delegates to `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
