use std::{future::Future, time::Duration};

use tokio::{
    sync::oneshot,
    time::{interval_at, sleep, Instant, MissedTickBehavior},
};
use tracing::{debug, error};

use crate::{
    latch::Latch,
    strategy::{MutateFn, RunError},
};

/// Which statistic a run collects from successful mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Count version-sequence violations.
    Demo,
    /// Accumulate successful-operation latency.
    Benchmark,
}

/// What one worker reports when the run stops.
#[derive(Debug, Clone, Default)]
pub struct WorkerStats {
    pub worker: usize,
    pub mutations: u64,
    pub inconsistencies: u64,
    pub errors: u64,
    pub busy: Duration,
}

impl WorkerStats {
    fn new(worker: usize) -> Self {
        Self {
            worker,
            ..Self::default()
        }
    }

    /// Mean latency of successful mutations, when any happened.
    pub fn average(&self) -> Option<Duration> {
        let count = u32::try_from(self.mutations).ok()?;

        (count > 0).then(|| self.busy / count)
    }
}

/// Runs a fixed number of workers in lockstep against one strategy binding.
///
/// Per run the state machine is not-started → started → running → stopping
/// → stopped: workers are spawned, each subscribes to its own tick source
/// and reports ready, the start latch is released once every worker is
/// parked on it, and the run ends on the earlier of the duration deadline
/// or the external interrupt. The stop latch is broadcast, so every worker
/// observes it exactly once and exits after its in-flight tick.
#[derive(Debug, Clone)]
pub struct Harness {
    pub workers: usize,
    pub run_for: Duration,
    pub tick_every: Duration,
}

impl Harness {
    /// Drives one full run and returns one stats entry per worker.
    ///
    /// `interrupt` ends the run early when it completes; pass a pending
    /// future to rely on the duration alone. A fatal strategy error
    /// (protocol violation) aborts the run and is returned as the error.
    pub async fn run<F>(
        &self,
        mode: Mode,
        op: MutateFn,
        interrupt: F,
    ) -> Result<Vec<WorkerStats>, RunError>
    where
        F: Future<Output = ()> + Send,
    {
        let start = Latch::new();
        let stop = Latch::new();

        let mut handles = Vec::with_capacity(self.workers);
        let mut ready = Vec::with_capacity(self.workers);

        for worker in 0..self.workers {
            let (ready_tx, ready_rx) = oneshot::channel();
            ready.push(ready_rx);

            let start = start.clone();
            let stop = stop.clone();
            let op = op.clone();
            let tick_every = self.tick_every;

            handles.push(tokio::spawn(async move {
                let mut stats = WorkerStats::new(worker);
                let mut ticks = interval_at(Instant::now() + tick_every, tick_every);
                // A tick missed while a mutation was in flight is dropped,
                // not replayed in a burst.
                ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

                // The tick source exists; safe to report ready and park on
                // the start latch.
                let _ = ready_tx.send(());
                start.released().await;

                loop {
                    tokio::select! {
                        biased;

                        () = stop.released() => break,
                        _ = ticks.tick() => {
                            let begun = Instant::now();

                            match (*op)(worker).await {
                                Ok(observed) => {
                                    stats.mutations += 1;

                                    match mode {
                                        Mode::Demo => {
                                            if !observed.consistent() {
                                                stats.inconsistencies += 1;
                                            }
                                        }
                                        Mode::Benchmark => stats.busy += begun.elapsed(),
                                    }
                                }
                                Err(err) if err.is_fatal() => {
                                    // Protocol violation: bring the whole
                                    // run down.
                                    stop.release();

                                    return Err(err);
                                }
                                Err(_) => stats.errors += 1,
                            }
                        }
                    }
                }

                Ok(stats)
            }));
        }

        for ready_rx in ready {
            let _ = ready_rx.await;
        }

        debug!(workers = self.workers, "all workers ready, releasing start");
        start.release();

        tokio::select! {
            () = sleep(self.run_for) => {}
            () = interrupt => debug!("run interrupted"),
            // Only a fatal worker releases stop before we do.
            () = stop.released() => {}
        }

        stop.release();

        let mut reports = Vec::with_capacity(self.workers);
        for handle in handles {
            match handle.await {
                Ok(Ok(stats)) => reports.push(stats),
                Ok(Err(err)) => return Err(err),
                Err(join) => error!("worker panicked: {join}"),
            }
        }

        Ok(reports)
    }
}
