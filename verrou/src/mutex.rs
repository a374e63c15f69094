use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

/// Callback receiving the transient backend errors absorbed inside the
/// retry loops. Injected at construction so tests can capture reports.
pub type ErrorReporter = Arc<dyn Fn(&crate::LockError) + Send + Sync>;

/// Reporter that logs through `tracing` at warn level.
pub fn tracing_reporter() -> ErrorReporter {
    Arc::new(|err| tracing::warn!("lock backend error: {err}"))
}

/// Exclusive lock on a single named resource shared between processes.
#[async_trait]
pub trait Mutex: Send + Sync {
    /// Blocks until the lock is exclusively held by this caller, retrying
    /// indefinitely on contention and on transient backend errors. Fails
    /// only if the mutex was closed.
    async fn lock(&self) -> Result<()>;

    /// Releases a lock previously acquired by this caller.
    ///
    /// Returns [`LockError::NotHeld`](crate::LockError::NotHeld) if the
    /// caller does not currently hold the lock (double unlock, or the lease
    /// expired and the resource was reclaimed). Never silently succeeds.
    async fn unlock(&self) -> Result<()>;

    /// Drops backend connections. Later calls return
    /// [`LockError::Closed`](crate::LockError::Closed).
    async fn close(&self) -> Result<()>;
}
