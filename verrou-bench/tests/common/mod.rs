use std::time::Duration;

use async_trait::async_trait;
use verrou_store::{Engine, Profile, Result};

/// Store engine wrapper that sleeps before every operation.
///
/// Under a paused test clock this widens the window between a strategy's
/// read and its update enough that worker interleavings become
/// deterministic instead of a matter of scheduling luck.
#[derive(Clone)]
pub struct Slow<E> {
    inner: E,
    delay: Duration,
}

impl<E> Slow<E> {
    pub fn new(inner: E, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl<E: Engine + Clone + 'static> Engine for Slow<E> {
    async fn create(&self, profile: &Profile) -> Result<Profile> {
        tokio::time::sleep(self.delay).await;
        self.inner.create(profile).await
    }

    async fn read(&self, email: &str) -> Result<Profile> {
        tokio::time::sleep(self.delay).await;
        self.inner.read(email).await
    }

    async fn update(&self, profile: &Profile) -> Result<Profile> {
        tokio::time::sleep(self.delay).await;
        self.inner.update(profile).await
    }

    async fn update_locked(&self, profile: &Profile) -> Result<(Profile, Profile)> {
        tokio::time::sleep(self.delay).await;
        self.inner.update_locked(profile).await
    }

    async fn update_if_version(&self, profile: &Profile, expected: i64) -> Result<Profile> {
        tokio::time::sleep(self.delay).await;
        self.inner.update_if_version(profile, expected).await
    }

    async fn delete(&self, email: &str) -> Result<()> {
        tokio::time::sleep(self.delay).await;
        self.inner.delete(email).await
    }
}
