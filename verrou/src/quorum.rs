use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::join_all;
use parking_lot::RwLock;
use tokio::time::{sleep, Instant};
use uuid::Uuid;

use crate::{
    engine::Engine,
    error::{LockError, Result},
    lease::{DEFAULT_LEASE, DEFAULT_RETRY_INTERVAL},
    mutex::{tracing_reporter, ErrorReporter, Mutex},
    retry::{Backoff, Fixed},
};

// Lower bound on the clock-drift allowance subtracted from the lease when
// computing how much validity an acquisition has left.
const DRIFT_FLOOR: Duration = Duration::from_millis(2);

/// Distributed lock held across a majority of independent backing resources.
///
/// Every acquisition attempt writes a fresh fencing token to each backend;
/// ownership is established only once a strict majority accepted the token
/// and the lease validity window (lease minus elapsed time and drift
/// allowance) is still open. A minority of unreachable or stale backends can
/// neither block acquisition nor cause a double acquisition, and release is
/// validated per backend by the token, so a stale holder cannot free a lock
/// someone else re-acquired.
pub struct QuorumMutex {
    engines: RwLock<Option<Vec<Box<dyn Engine>>>>,
    key: String,
    lease: Duration,
    backoff: Box<dyn Backoff>,
    reporter: ErrorReporter,
    held: RwLock<Option<String>>,
}

impl QuorumMutex {
    pub fn new<K: Into<String>>(engines: Vec<Box<dyn Engine>>, key: K) -> Self {
        Self {
            engines: RwLock::new(Some(engines)),
            key: key.into(),
            lease: DEFAULT_LEASE,
            backoff: Box::new(Fixed::new(DEFAULT_RETRY_INTERVAL)),
            reporter: tracing_reporter(),
            held: RwLock::new(None),
        }
    }

    pub fn lease(mut self, lease: Duration) -> Self {
        self.lease = lease;
        self
    }

    pub fn backoff<B: Backoff + 'static>(mut self, backoff: B) -> Self {
        self.backoff = Box::new(backoff);
        self
    }

    pub fn reporter(mut self, reporter: ErrorReporter) -> Self {
        self.reporter = reporter;
        self
    }

    fn engines(&self) -> Result<Vec<Box<dyn Engine>>> {
        self.engines.read().clone().ok_or(LockError::Closed)
    }
}

#[async_trait]
impl Mutex for QuorumMutex {
    async fn lock(&self) -> Result<()> {
        let engines = self.engines()?;
        let quorum = engines.len() / 2 + 1;

        let mut attempt = 0;
        loop {
            let token = Uuid::new_v4().to_string();
            let begun = Instant::now();

            let outcomes = join_all(
                engines
                    .iter()
                    .map(|engine| engine.acquire(&self.key, &token, self.lease)),
            )
            .await;

            let mut accepted = 0;
            for outcome in outcomes {
                match outcome {
                    Ok(true) => accepted += 1,
                    Ok(false) => {}
                    Err(err) => (self.reporter)(&err),
                }
            }

            let drift = self.lease / 100 + DRIFT_FLOOR;
            let validity = self
                .lease
                .saturating_sub(begun.elapsed())
                .saturating_sub(drift);

            if accepted >= quorum && !validity.is_zero() {
                *self.held.write() = Some(token);

                return Ok(());
            }

            // Failed attempt: drop whatever the token did land on, best
            // effort, before trying again.
            for outcome in join_all(
                engines
                    .iter()
                    .map(|engine| engine.release(&self.key, &token)),
            )
            .await
            {
                if let Err(err) = outcome {
                    (self.reporter)(&err);
                }
            }

            sleep(self.backoff.delay(attempt)).await;
            attempt += 1;
        }
    }

    async fn unlock(&self) -> Result<()> {
        let engines = self.engines()?;
        let quorum = engines.len() / 2 + 1;

        let Some(token) = self.held.write().take() else {
            return Err(LockError::NotHeld);
        };

        // Each backend is retried until it gives a definite answer, except
        // that a confirmed majority ends the release early. A definite
        // answer from every backend without a majority means the lease
        // expired and the resource moved on without us.
        let mut released = vec![false; engines.len()];
        let mut settled = vec![false; engines.len()];

        let mut attempt = 0;
        loop {
            let pending: Vec<usize> = (0..engines.len()).filter(|i| !settled[*i]).collect();

            let outcomes = join_all(
                pending
                    .iter()
                    .map(|&i| engines[i].release(&self.key, &token)),
            )
            .await;

            for (&i, outcome) in pending.iter().zip(outcomes) {
                match outcome {
                    Ok(ok) => {
                        settled[i] = true;
                        released[i] = ok;
                    }
                    Err(err) => (self.reporter)(&err),
                }
            }

            if released.iter().filter(|ok| **ok).count() >= quorum {
                return Ok(());
            }

            if settled.iter().all(|done| *done) {
                return Err(LockError::NotHeld);
            }

            sleep(self.backoff.delay(attempt)).await;
            attempt += 1;
        }
    }

    async fn close(&self) -> Result<()> {
        self.engines.write().take();

        Ok(())
    }
}
