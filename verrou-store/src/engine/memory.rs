use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::{
    engine::Engine,
    error::{Result, StoreError},
    profile::Profile,
    store::Store,
};

/// In-process record store.
///
/// Every operation runs under one map lock, mimicking the per-statement
/// atomicity of a SQL backend; races between separate calls remain fully
/// observable.
#[derive(Debug, Clone, Default)]
pub struct Memory(Arc<RwLock<HashMap<String, Profile>>>);

impl Memory {
    pub fn new() -> Store {
        Store::new(Self::default())
    }
}

#[async_trait]
impl Engine for Memory {
    async fn create(&self, profile: &Profile) -> Result<Profile> {
        let mut records = self.0.write();

        if records.contains_key(&profile.email) {
            return Err(StoreError::AlreadyExists);
        }

        let created = Profile {
            version: 1,
            ..profile.clone()
        };
        records.insert(profile.email.to_owned(), created.clone());

        Ok(created)
    }

    async fn read(&self, email: &str) -> Result<Profile> {
        self.0
            .read()
            .get(email)
            .cloned()
            .ok_or(StoreError::RecordNotFound)
    }

    async fn update(&self, profile: &Profile) -> Result<Profile> {
        let mut records = self.0.write();
        let record = records
            .get_mut(&profile.email)
            .ok_or(StoreError::RecordNotFound)?;

        record.first_name = profile.first_name.to_owned();
        record.last_name = profile.last_name.to_owned();
        record.version += 1;

        Ok(record.clone())
    }

    async fn update_locked(&self, profile: &Profile) -> Result<(Profile, Profile)> {
        let mut records = self.0.write();
        let record = records
            .get_mut(&profile.email)
            .ok_or(StoreError::RecordNotFound)?;

        let previous = record.clone();

        record.first_name = profile.first_name.to_owned();
        record.last_name = profile.last_name.to_owned();
        record.version += 1;

        Ok((previous, record.clone()))
    }

    async fn update_if_version(&self, profile: &Profile, expected: i64) -> Result<Profile> {
        let mut records = self.0.write();
        let record = records
            .get_mut(&profile.email)
            .ok_or(StoreError::VersionConflict)?;

        if record.version != expected {
            return Err(StoreError::VersionConflict);
        }

        record.first_name = profile.first_name.to_owned();
        record.last_name = profile.last_name.to_owned();
        record.version += 1;

        Ok(record.clone())
    }

    async fn delete(&self, email: &str) -> Result<()> {
        self.0.write().remove(email);

        Ok(())
    }
}
