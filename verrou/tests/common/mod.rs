use std::{
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use parking_lot::Mutex;
use verrou::{Engine, ErrorReporter, LockError, Result};

/// Reporter that records every reported error for later assertions.
pub fn capturing_reporter() -> (ErrorReporter, Arc<Mutex<Vec<String>>>) {
    let reports = Arc::new(Mutex::new(Vec::new()));
    let sink = reports.clone();
    let reporter: ErrorReporter = Arc::new(move |err: &LockError| {
        sink.lock().push(err.to_string());
    });

    (reporter, reports)
}

/// Engine wrapper that fails a configured number of calls before letting
/// them through.
#[derive(Clone)]
pub struct Flaky<E> {
    inner: E,
    acquire_failures: Arc<AtomicU32>,
    release_failures: Arc<AtomicU32>,
}

impl<E> Flaky<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            acquire_failures: Arc::new(AtomicU32::new(0)),
            release_failures: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn fail_acquires(self, count: u32) -> Self {
        self.acquire_failures.store(count, Ordering::SeqCst);
        self
    }

    pub fn fail_releases(self, count: u32) -> Self {
        self.release_failures.store(count, Ordering::SeqCst);
        self
    }
}

fn take(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[async_trait]
impl<E: Engine + Clone + 'static> Engine for Flaky<E> {
    async fn acquire(&self, key: &str, token: &str, ttl: Duration) -> Result<bool> {
        if take(&self.acquire_failures) {
            return Err(LockError::Unavailable("injected acquire failure".to_owned()));
        }

        self.inner.acquire(key, token, ttl).await
    }

    async fn release(&self, key: &str, token: &str) -> Result<bool> {
        if take(&self.release_failures) {
            return Err(LockError::Unavailable("injected release failure".to_owned()));
        }

        self.inner.release(key, token).await
    }

    async fn clear(&self, key: &str) -> Result<()> {
        self.inner.clear(key).await
    }
}

/// Backend that never answers.
#[derive(Clone, Copy, Default)]
pub struct Down;

#[async_trait]
impl Engine for Down {
    async fn acquire(&self, _key: &str, _token: &str, _ttl: Duration) -> Result<bool> {
        Err(LockError::Unavailable("backend down".to_owned()))
    }

    async fn release(&self, _key: &str, _token: &str) -> Result<bool> {
        Err(LockError::Unavailable("backend down".to_owned()))
    }

    async fn clear(&self, _key: &str) -> Result<()> {
        Err(LockError::Unavailable("backend down".to_owned()))
    }
}
