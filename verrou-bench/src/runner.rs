use std::{future::Future, sync::Arc};

use anyhow::Context as _;
use sqlx::PgPool;
use tokio::sync::mpsc;
use tracing::info;
use verrou::{Engine, Fixed, LeaseMutex, Mutex, QuorumMutex, Redis};
use verrou_store::{Pg, Profile, Store};

use crate::{
    config::{Config, MutexKind},
    harness::{Harness, Mode},
    report::Report,
    strategy,
};

const LOCK_KEY: &str = "verrou:profile";

const EMAIL: &str = "ada.lovelace@example.com";
const FIRST_NAME: &str = "Ada";
const LAST_NAME: &str = "Lovelace";

/// Connects the collaborators, seeds the record and drives every strategy
/// through the harness in sequence.
///
/// Each delivered interrupt signal stops the scenario that is running when
/// it arrives; the remaining scenarios still run.
pub async fn run(config: Config, mut signals: mpsc::Receiver<()>) -> anyhow::Result<()> {
    println!(
        "configuration:\n mutex: {:?}\n workers: {}\n duration: {:?}\n interval: {:?}",
        config.mutex, config.workers, config.run_for, config.tick_every
    );

    let pool = PgPool::connect(&config.database_url)
        .await
        .context("connecting to the record store")?;
    Pg::migrate(&pool).await?;
    let store = Pg::new(&pool);

    let mutex = connect_mutex(&config)
        .await
        .context("connecting to the lock backend")?;

    let template = Profile::new(EMAIL, FIRST_NAME, LAST_NAME);
    store.delete(EMAIL).await?;
    let seeded = store.create(&template).await?;
    info!(version = seeded.version, "seeded record");

    let harness = Harness {
        workers: config.workers,
        run_for: config.run_for,
        tick_every: config.tick_every,
    };

    banner("Concurrent mutate without coordination (demo)");
    let stats = harness
        .run(
            Mode::Demo,
            strategy::uncoordinated(store.clone(), template.clone()),
            interrupted(&mut signals),
        )
        .await?;
    println!("{}", Report::new(Mode::Demo, &stats));

    banner("Concurrent mutate with mutex (demo)");
    let stats = harness
        .run(
            Mode::Demo,
            strategy::mutex_guarded(store.clone(), mutex.clone(), template.clone()),
            interrupted(&mut signals),
        )
        .await?;
    println!("{}", Report::new(Mode::Demo, &stats));

    banner("Concurrent mutate with mutex (benchmark)");
    let stats = harness
        .run(
            Mode::Benchmark,
            strategy::mutex_guarded(store.clone(), mutex.clone(), template.clone()),
            interrupted(&mut signals),
        )
        .await?;
    println!("{}", Report::new(Mode::Benchmark, &stats));

    banner("Concurrent mutate with row lock (demo)");
    let stats = harness
        .run(
            Mode::Demo,
            strategy::row_locked(store.clone(), template.clone()),
            interrupted(&mut signals),
        )
        .await?;
    println!("{}", Report::new(Mode::Demo, &stats));

    banner("Concurrent mutate with row lock (benchmark)");
    let stats = harness
        .run(
            Mode::Benchmark,
            strategy::row_locked(store.clone(), template.clone()),
            interrupted(&mut signals),
        )
        .await?;
    println!("{}", Report::new(Mode::Benchmark, &stats));

    banner("Concurrent mutate with version check (demo)");
    let stats = harness
        .run(
            Mode::Demo,
            strategy::version_checked(store.clone(), template.clone()),
            interrupted(&mut signals),
        )
        .await?;
    println!("{}", Report::new(Mode::Demo, &stats));

    banner("Concurrent mutate with version check (benchmark)");
    let stats = harness
        .run(
            Mode::Benchmark,
            strategy::version_checked(store.clone(), template.clone()),
            interrupted(&mut signals),
        )
        .await?;
    println!("{}", Report::new(Mode::Benchmark, &stats));

    mutex.close().await?;

    Ok(())
}

async fn connect_mutex(config: &Config) -> anyhow::Result<Arc<dyn Mutex>> {
    match config.mutex {
        MutexKind::Lease => {
            let url = config.redis_urls.first().context("REDIS_URL is empty")?;
            let engine = Redis::connect(url).await?;

            let mutex = LeaseMutex::new(engine, LOCK_KEY)
                .lease(config.lease)
                .backoff(Fixed::new(config.retry_interval));

            // Clean slate: whatever a previous process left behind is void.
            mutex.reset().await?;

            Ok(Arc::new(mutex))
        }
        MutexKind::Quorum => {
            let mut engines: Vec<Box<dyn Engine>> = Vec::with_capacity(config.redis_urls.len());
            for url in &config.redis_urls {
                engines.push(Box::new(Redis::connect(url).await?));
            }

            let mutex = QuorumMutex::new(engines, LOCK_KEY)
                .lease(config.lease)
                .backoff(Fixed::new(config.retry_interval));

            Ok(Arc::new(mutex))
        }
    }
}

/// Resolves when one interrupt signal arrives; a closed channel never
/// resolves, so only a delivered signal can end a run early.
fn interrupted(signals: &mut mpsc::Receiver<()>) -> impl Future<Output = ()> + Send + '_ {
    async move {
        if signals.recv().await.is_none() {
            std::future::pending::<()>().await;
        }
    }
}

fn banner(title: &str) {
    let rule = "=".repeat(title.len() + 4);
    println!("\n{rule}\n--{title}--\n{rule}");
}
