use std::sync::Arc;

use futures_util::future::BoxFuture;
use verrou::{LockError, Mutex};
use verrou_store::{Profile, Store, StoreError};

/// Record versions observed around one successful mutation.
#[derive(Debug, Clone, Copy)]
pub struct Observed {
    pub before: i64,
    pub after: i64,
}

impl Observed {
    /// A committed mutation must advance the version by exactly one; any
    /// other step means a concurrent writer was clobbered.
    pub fn consistent(&self) -> bool {
        self.after == self.before + 1
    }
}

/// Errors surfaced by one mutation attempt.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("store `{0}`")]
    Store(#[from] StoreError),

    #[error("lock `{0}`")]
    Lock(#[from] LockError),
}

impl RunError {
    /// Protocol violations abort the run; anything else is one failed tick.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Lock(err) => err.is_fatal(),
            Self::Store(_) => false,
        }
    }
}

/// A mutation operation bound to the harness: one invocation performs
/// exactly one read-modify-write against the shared record.
pub type MutateFn =
    Arc<dyn Fn(usize) -> BoxFuture<'static, Result<Observed, RunError>> + Send + Sync>;

/// Read then unconditional update; nothing excludes concurrent writers.
pub fn uncoordinated(store: Store, template: Profile) -> MutateFn {
    Arc::new(move |_worker| {
        let store = store.clone();
        let template = template.clone();

        Box::pin(async move {
            let before = store.read(&template.email).await?;
            let after = store.update(&template).await?;

            Ok(Observed {
                before: before.version,
                after: after.version,
            })
        })
    })
}

/// Acquire the distributed mutex around the read-then-update.
pub fn mutex_guarded(store: Store, mutex: Arc<dyn Mutex>, template: Profile) -> MutateFn {
    Arc::new(move |_worker| {
        let store = store.clone();
        let mutex = mutex.clone();
        let template = template.clone();

        Box::pin(async move {
            mutex.lock().await?;

            let mutated = async {
                let before = store.read(&template.email).await?;
                let after = store.update(&template).await?;

                Ok::<_, RunError>(Observed {
                    before: before.version,
                    after: after.version,
                })
            }
            .await;

            // The lock is released even when the store failed; an unlock
            // failure takes precedence because it is a protocol violation.
            mutex.unlock().await?;

            mutated
        })
    })
}

/// Row-locked read-then-update inside a single store transaction.
pub fn row_locked(store: Store, template: Profile) -> MutateFn {
    Arc::new(move |_worker| {
        let store = store.clone();
        let template = template.clone();

        Box::pin(async move {
            let (before, after) = store.update_locked(&template).await?;

            Ok(Observed {
                before: before.version,
                after: after.version,
            })
        })
    })
}

/// Optimistic update conditioned on the version read just before; a losing
/// race surfaces as an error tick, never as a silent overwrite.
pub fn version_checked(store: Store, template: Profile) -> MutateFn {
    Arc::new(move |_worker| {
        let store = store.clone();
        let template = template.clone();

        Box::pin(async move {
            let before = store.read(&template.email).await?;
            let after = store.update_if_version(&template, before.version).await?;

            Ok(Observed {
                before: before.version,
                after: after.version,
            })
        })
    })
}
