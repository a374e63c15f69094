use crate::{engine::Engine, error::Result, profile::Profile};

/// Facade over a storage engine.
#[derive(Clone)]
pub struct Store {
    engine: Box<dyn Engine>,
}

impl Store {
    pub fn new<E: Engine + 'static>(engine: E) -> Self {
        Self {
            engine: Box::new(engine),
        }
    }

    pub async fn create(&self, profile: &Profile) -> Result<Profile> {
        self.engine.create(profile).await
    }

    pub async fn read(&self, email: &str) -> Result<Profile> {
        self.engine.read(email).await
    }

    pub async fn update(&self, profile: &Profile) -> Result<Profile> {
        self.engine.update(profile).await
    }

    pub async fn update_locked(&self, profile: &Profile) -> Result<(Profile, Profile)> {
        self.engine.update_locked(profile).await
    }

    pub async fn update_if_version(&self, profile: &Profile, expected: i64) -> Result<Profile> {
        self.engine.update_if_version(profile, expected).await
    }

    pub async fn delete(&self, email: &str) -> Result<()> {
        self.engine.delete(email).await
    }
}
