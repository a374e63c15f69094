use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    engine::Engine,
    error::{Result, StoreError},
    profile::Profile,
    store::Store,
};

const COLUMNS: &str = "email, first_name, last_name, version";

/// Postgres-backed record store.
///
/// `update_locked` relies on read-committed isolation plus the row lock
/// taken by `FOR UPDATE`; `update_if_version` re-checks the version inside
/// the update predicate, so it needs no lock at all.
#[derive(Debug, Clone)]
pub struct Pg {
    pool: PgPool,
}

impl Pg {
    pub fn new(pool: &PgPool) -> Store {
        Store::new(Self { pool: pool.clone() })
    }

    /// Applies the bundled schema migrations.
    pub async fn migrate(pool: &PgPool) -> Result<()> {
        sqlx::migrate!().run(pool).await.map_err(sqlx::Error::from)?;

        Ok(())
    }
}

#[async_trait]
impl Engine for Pg {
    async fn create(&self, profile: &Profile) -> Result<Profile> {
        sqlx::query_as::<_, Profile>(&format!(
            "INSERT INTO profile (email, first_name, last_name) VALUES ($1, $2, $3) RETURNING {COLUMNS}"
        ))
        .bind(&profile.email)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| match err {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::AlreadyExists,
            err => StoreError::Sqlx(err),
        })
    }

    async fn read(&self, email: &str) -> Result<Profile> {
        sqlx::query_as::<_, Profile>(&format!("SELECT {COLUMNS} FROM profile WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::RecordNotFound)
    }

    async fn update(&self, profile: &Profile) -> Result<Profile> {
        sqlx::query_as::<_, Profile>(&format!(
            "UPDATE profile SET first_name = $2, last_name = $3, version = version + 1 WHERE email = $1 RETURNING {COLUMNS}"
        ))
        .bind(&profile.email)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::RecordNotFound)
    }

    async fn update_locked(&self, profile: &Profile) -> Result<(Profile, Profile)> {
        let mut tx = self.pool.begin().await?;

        let previous = sqlx::query_as::<_, Profile>(&format!(
            "SELECT {COLUMNS} FROM profile WHERE email = $1 FOR UPDATE"
        ))
        .bind(&profile.email)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::RecordNotFound)?;

        let updated = sqlx::query_as::<_, Profile>(&format!(
            "UPDATE profile SET first_name = $2, last_name = $3, version = version + 1 WHERE email = $1 RETURNING {COLUMNS}"
        ))
        .bind(&profile.email)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((previous, updated))
    }

    async fn update_if_version(&self, profile: &Profile, expected: i64) -> Result<Profile> {
        sqlx::query_as::<_, Profile>(&format!(
            "UPDATE profile SET first_name = $2, last_name = $3, version = version + 1 WHERE email = $1 AND version = $4 RETURNING {COLUMNS}"
        ))
        .bind(&profile.email)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(expected)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::VersionConflict)
    }

    async fn delete(&self, email: &str) -> Result<()> {
        sqlx::query("DELETE FROM profile WHERE email = $1")
            .bind(email)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
