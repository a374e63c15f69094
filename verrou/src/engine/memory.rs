use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::{engine::Engine, error::Result};

/// In-process lock backend.
///
/// Expiry is driven by `tokio::time::Instant`, so tests running under a
/// paused clock control lease timeouts deterministically.
#[derive(Debug, Clone, Default)]
pub struct Memory(Arc<Mutex<HashMap<String, Held>>>);

#[derive(Debug, Clone)]
struct Held {
    token: String,
    expires_at: Instant,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token of the current holder, if the lock is held and unexpired.
    pub fn holder(&self, key: &str) -> Option<String> {
        self.0
            .lock()
            .get(key)
            .filter(|held| held.expires_at > Instant::now())
            .map(|held| held.token.to_owned())
    }
}

#[async_trait]
impl Engine for Memory {
    async fn acquire(&self, key: &str, token: &str, ttl: Duration) -> Result<bool> {
        let mut entries = self.0.lock();
        let now = Instant::now();

        match entries.get(key) {
            Some(held) if held.expires_at > now => Ok(false),
            _ => {
                entries.insert(
                    key.to_owned(),
                    Held {
                        token: token.to_owned(),
                        expires_at: now + ttl,
                    },
                );

                Ok(true)
            }
        }
    }

    async fn release(&self, key: &str, token: &str) -> Result<bool> {
        let mut entries = self.0.lock();
        let now = Instant::now();

        match entries.get(key) {
            Some(held) if held.expires_at <= now => {
                // An expired entry is the same as an absent one.
                entries.remove(key);

                Ok(false)
            }
            Some(held) if held.token == token => {
                entries.remove(key);

                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn clear(&self, key: &str) -> Result<()> {
        self.0.lock().remove(key);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn acquire_is_exclusive_until_expiry() {
        let engine = Memory::new();

        assert!(engine
            .acquire("k", "a", Duration::from_secs(5))
            .await
            .unwrap());
        assert!(!engine
            .acquire("k", "b", Duration::from_secs(5))
            .await
            .unwrap());

        tokio::time::advance(Duration::from_secs(6)).await;

        assert!(engine
            .acquire("k", "b", Duration::from_secs(5))
            .await
            .unwrap());
        assert_eq!(engine.holder("k"), Some("b".to_owned()));
    }

    #[tokio::test(start_paused = true)]
    async fn release_checks_token() {
        let engine = Memory::new();

        engine
            .acquire("k", "a", Duration::from_secs(5))
            .await
            .unwrap();

        assert!(!engine.release("k", "b").await.unwrap());
        assert_eq!(engine.holder("k"), Some("a".to_owned()));

        assert!(engine.release("k", "a").await.unwrap());
        assert_eq!(engine.holder("k"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn release_after_expiry_is_not_held() {
        let engine = Memory::new();

        engine
            .acquire("k", "a", Duration::from_secs(5))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(6)).await;

        assert!(!engine.release("k", "a").await.unwrap());
    }

    #[tokio::test]
    async fn clear_removes_any_holder() {
        let engine = Memory::new();

        engine
            .acquire("k", "a", Duration::from_secs(5))
            .await
            .unwrap();
        engine.clear("k").await.unwrap();

        assert!(engine
            .acquire("k", "b", Duration::from_secs(5))
            .await
            .unwrap());
    }
}
