use std::fmt;

use crate::harness::{Mode, WorkerStats};

/// Console rendering of one run's per-worker statistics.
pub struct Report<'a> {
    mode: Mode,
    stats: &'a [WorkerStats],
}

impl<'a> Report<'a> {
    pub fn new(mode: Mode, stats: &'a [WorkerStats]) -> Self {
        Self { mode, stats }
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stats in self.stats {
            writeln!(f, "worker [{}]:", stats.worker)?;
            writeln!(f, " total mutations: {}", stats.mutations)?;

            match self.mode {
                Mode::Demo => {
                    writeln!(f, " data inconsistencies: {}", stats.inconsistencies)?;
                }
                Mode::Benchmark => {
                    let average = stats
                        .average()
                        .map_or_else(|| "-".to_owned(), |avg| format!("{avg:?}"));
                    writeln!(f, " average time: {average}")?;
                }
            }

            writeln!(f, " total errors: {}", stats.errors)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn benchmark_report_shows_average_or_dash() {
        let stats = vec![
            WorkerStats {
                worker: 0,
                mutations: 2,
                busy: Duration::from_millis(10),
                ..WorkerStats::default()
            },
            WorkerStats {
                worker: 1,
                ..WorkerStats::default()
            },
        ];

        let rendered = Report::new(Mode::Benchmark, &stats).to_string();

        assert!(rendered.contains("worker [0]:"));
        assert!(rendered.contains("average time: 5ms"));
        assert!(rendered.contains("average time: -"));
    }

    #[test]
    fn demo_report_shows_inconsistencies() {
        let stats = vec![WorkerStats {
            worker: 0,
            mutations: 3,
            inconsistencies: 1,
            ..WorkerStats::default()
        }];

        let rendered = Report::new(Mode::Demo, &stats).to_string();

        assert!(rendered.contains("data inconsistencies: 1"));
        assert!(rendered.contains("total errors: 0"));
    }
}
