use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::time::sleep;
use uuid::Uuid;

use crate::{
    engine::Engine,
    error::{LockError, Result},
    mutex::{tracing_reporter, ErrorReporter, Mutex},
    retry::{Backoff, Fixed},
};

/// Default lease put on every acquisition.
pub const DEFAULT_LEASE: Duration = Duration::from_secs(10);

/// Default interval between acquisition attempts.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(1);

/// Single-resource distributed lock with a lease.
///
/// Acquisition is set-if-absent with expiration. Release is an atomic
/// compare-and-delete against the holder id written at acquisition, so a
/// lease that expired and was reclaimed by another holder is never deleted
/// from here; that case surfaces as [`LockError::NotHeld`].
///
/// The lease must exceed the longest protected operation; the lock does not
/// renew it.
pub struct LeaseMutex {
    engine: RwLock<Option<Box<dyn Engine>>>,
    key: String,
    holder: String,
    lease: Duration,
    backoff: Box<dyn Backoff>,
    reporter: ErrorReporter,
}

impl LeaseMutex {
    pub fn new<K: Into<String>>(engine: impl Engine + 'static, key: K) -> Self {
        Self {
            engine: RwLock::new(Some(Box::new(engine))),
            key: key.into(),
            holder: Uuid::new_v4().to_string(),
            lease: DEFAULT_LEASE,
            backoff: Box::new(Fixed::new(DEFAULT_RETRY_INTERVAL)),
            reporter: tracing_reporter(),
        }
    }

    pub fn lease(mut self, lease: Duration) -> Self {
        self.lease = lease;
        self
    }

    pub fn backoff<B: Backoff + 'static>(mut self, backoff: B) -> Self {
        self.backoff = Box::new(backoff);
        self
    }

    pub fn reporter(mut self, reporter: ErrorReporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Unconditionally clears the lock resource regardless of holder.
    ///
    /// Startup only: guarantees a clean slate before the first acquisition.
    /// Never part of steady-state operation.
    pub async fn reset(&self) -> Result<()> {
        self.engine()?.clear(&self.key).await
    }

    fn engine(&self) -> Result<Box<dyn Engine>> {
        self.engine.read().clone().ok_or(LockError::Closed)
    }
}

#[async_trait]
impl Mutex for LeaseMutex {
    async fn lock(&self) -> Result<()> {
        let engine = self.engine()?;

        let mut attempt = 0;
        loop {
            match engine.acquire(&self.key, &self.holder, self.lease).await {
                Ok(true) => return Ok(()),
                Ok(false) => {}
                Err(err) => (self.reporter)(&err),
            }

            sleep(self.backoff.delay(attempt)).await;
            attempt += 1;
        }
    }

    async fn unlock(&self) -> Result<()> {
        let engine = self.engine()?;

        let mut attempt = 0;
        loop {
            match engine.release(&self.key, &self.holder).await {
                Ok(true) => return Ok(()),
                Ok(false) => return Err(LockError::NotHeld),
                Err(err) => (self.reporter)(&err),
            }

            sleep(self.backoff.delay(attempt)).await;
            attempt += 1;
        }
    }

    async fn close(&self) -> Result<()> {
        self.engine.write().take();

        Ok(())
    }
}
