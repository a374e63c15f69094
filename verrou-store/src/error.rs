#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    RecordNotFound,

    #[error("record already exists")]
    AlreadyExists,

    #[error("update failed; version conflict")]
    VersionConflict,

    #[cfg(feature = "pg")]
    #[error("sqlx `{0}`")]
    Sqlx(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
