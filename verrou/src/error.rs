#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("attempted to unlock a lock that is not held by this caller")]
    NotHeld,

    #[error("lock used after close")]
    Closed,

    #[cfg(feature = "redis")]
    #[error("redis `{0}`")]
    Redis(#[from] redis::RedisError),

    #[error("lock backend unavailable: {0}")]
    Unavailable(String),
}

impl LockError {
    /// Protocol violations terminate a run; everything else is transient and
    /// absorbed by the retry loops.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::NotHeld | Self::Closed)
    }
}

pub type Result<T> = std::result::Result<T, LockError>;
