use std::time::Duration;

use async_trait::async_trait;
use dyn_clone::DynClone;

use crate::error::Result;

#[cfg(feature = "memory")]
mod memory;
#[cfg(feature = "redis")]
mod redis;

#[cfg(feature = "memory")]
pub use self::memory::*;
#[cfg(feature = "redis")]
pub use self::redis::*;

/// Primitive operations a lock backend provides.
///
/// The backend is the single source of truth for who holds a lock; both
/// mutex variants are built from these three operations.
#[async_trait]
pub trait Engine: DynClone + Send + Sync {
    /// Set-if-absent with expiration. `Ok(true)` means the caller now owns
    /// `key` until `ttl` elapses or an explicit release.
    async fn acquire(&self, key: &str, token: &str, ttl: Duration) -> Result<bool>;

    /// Atomic compare-and-delete: remove `key` only if it still stores
    /// `token`, in a single server-side operation. `Ok(false)` means the key
    /// is absent or held under a different token.
    async fn release(&self, key: &str, token: &str) -> Result<bool>;

    /// Unconditional delete regardless of holder.
    async fn clear(&self, key: &str) -> Result<()>;
}

dyn_clone::clone_trait_object!(Engine);
