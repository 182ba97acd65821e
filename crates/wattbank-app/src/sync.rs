//! Remote synchronization boundary.
//!
//! The real wire protocol lives outside this core. [`SyncEndpoint`]
//! abstracts the round trip so the aggregator's commit-or-leave-unchanged
//! logic is implementation-agnostic; [`MockEndpoint`] stands in for the
//! network with configurable latency and failure injection.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{Error, Result};

/// One round trip with the remote account service.
#[async_trait]
pub trait SyncEndpoint: Send + Sync {
    /// Push pending local state and pull remote updates.
    ///
    /// Success means the caller may record a sync event; on failure no
    /// observable state may change.
    async fn round_trip(&self) -> Result<()>;
}

/// A mock sync endpoint for testing and offline demo builds.
///
/// Simulates latency (optionally jittered) and can be set to fail
/// deterministically so rollback paths are testable.
pub struct MockEndpoint {
    latency_ms: AtomicU64,
    jitter_ms: AtomicU64,
    should_fail: AtomicBool,
}

impl MockEndpoint {
    /// Create a mock endpoint that succeeds instantly.
    #[must_use]
    pub fn new() -> Self {
        Self {
            latency_ms: AtomicU64::new(0),
            jitter_ms: AtomicU64::new(0),
            should_fail: AtomicBool::new(false),
        }
    }

    /// Create a mock endpoint that behaves like a slow mobile uplink:
    /// around two seconds per round trip, with jitter.
    #[must_use]
    pub fn slow() -> Self {
        let endpoint = Self::new();
        endpoint.set_latency(1_500, 1_000);
        endpoint
    }

    /// Set the simulated base latency and jitter in milliseconds.
    pub fn set_latency(&self, base_ms: u64, jitter_ms: u64) {
        self.latency_ms.store(base_ms, Ordering::SeqCst);
        self.jitter_ms.store(jitter_ms, Ordering::SeqCst);
    }

    /// Make subsequent round trips fail (or succeed again).
    pub fn set_should_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::SeqCst);
    }
}

impl Default for MockEndpoint {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SyncEndpoint for MockEndpoint {
    async fn round_trip(&self) -> Result<()> {
        let base = self.latency_ms.load(Ordering::SeqCst);
        let jitter = self.jitter_ms.load(Ordering::SeqCst);
        let delay = if jitter > 0 {
            base + rand::random_range(0..jitter)
        } else {
            base
        };

        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        if self.should_fail.load(Ordering::SeqCst) {
            return Err(Error::Sync("mock endpoint set to fail".into()));
        }

        debug!("Mock sync round trip completed after {}ms", delay);
        Ok(())
    }
}
