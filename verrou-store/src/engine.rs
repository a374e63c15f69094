use async_trait::async_trait;
use dyn_clone::DynClone;

use crate::{error::Result, profile::Profile};

#[cfg(feature = "memory")]
mod memory;
#[cfg(feature = "pg")]
mod pg;

#[cfg(feature = "memory")]
pub use self::memory::*;
#[cfg(feature = "pg")]
pub use self::pg::*;

/// Storage operations on the protected record.
///
/// The engine gives no cross-call guarantee: only what a single operation's
/// transaction affords (the row lock in `update_locked`, the predicate in
/// `update_if_version`).
#[async_trait]
pub trait Engine: DynClone + Send + Sync {
    /// Inserts the record with the initial version and returns the stored
    /// row.
    async fn create(&self, profile: &Profile) -> Result<Profile>;

    async fn read(&self, email: &str) -> Result<Profile>;

    /// Unconditional update; always increments the version.
    async fn update(&self, profile: &Profile) -> Result<Profile>;

    /// Row-locked read-then-update in one transaction. Returns the row as
    /// read under the lock and the row after the update.
    async fn update_locked(&self, profile: &Profile) -> Result<(Profile, Profile)>;

    /// Update conditioned on the stored version still matching `expected`;
    /// a losing race surfaces as [`StoreError::VersionConflict`](crate::StoreError::VersionConflict).
    async fn update_if_version(&self, profile: &Profile, expected: i64) -> Result<Profile>;

    /// Deletes the record; absent records are not an error.
    async fn delete(&self, email: &str) -> Result<()>;
}

dyn_clone::clone_trait_object!(Engine);
