//! Parallel dictionary search over a protected entry.
//!
//! ## Flow
//!
//! 1. Index the wordlist once to get an exact line count.
//! 2. [`partition`] the lines into one contiguous [`WorkRange`] per worker.
//! 3. Run every worker on tokio's blocking pool. Each opens its own handle on
//!    the wordlist and checks the shared [`CancellationSignal`] before every
//!    candidate.
//! 4. Join all workers, then read the verdict off the signal.
//!
//! The first worker to halt the signal decides the run: a found password, a
//! fatal read error, or an external cancellation. Exhausting every range
//! without a halt is the ordinary [`RunResult::NotFound`].

mod partition;
mod signal;
mod worker;

pub use partition::{WorkRange, partition};
pub use signal::{CancelHandle, CancellationSignal, Halt};
pub use worker::WorkerStats;

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::{JoinError, spawn_blocking};
use tracing::{debug, info};

use crate::config::CrackConfig;
use crate::error::Error;
use crate::progress::{NoProgress, Progress};
use crate::wordlist::{Candidate, Wordlist};
use crate::zip::ArchiveEntry;

use worker::Worker;

/// Terminal outcome of a run.
#[derive(Debug)]
pub enum RunResult {
    Found(Candidate),
    NotFound,
    Error(Error),
}

impl RunResult {
    pub fn password(&self) -> Option<&Candidate> {
        match self {
            RunResult::Found(c) => Some(c),
            _ => None,
        }
    }
}

/// Counters gathered across all workers of a run.
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    pub total_lines: u64,
    /// Candidates examined, indexed by worker.
    pub examined: Vec<u64>,
    pub false_positives: u64,
    /// Lines longer than [`MAX_CANDIDATE_LEN`](crate::wordlist::MAX_CANDIDATE_LEN).
    pub skipped: u64,
    pub elapsed: Duration,
}

impl RunStats {
    pub fn examined_total(&self) -> u64 {
        self.examined.iter().sum()
    }
}

#[derive(Debug)]
pub struct RunReport {
    pub result: RunResult,
    pub stats: RunStats,
}

impl RunReport {
    /// A run that stopped before any candidate was tried.
    pub fn failed(error: Error) -> Self {
        Self {
            result: RunResult::Error(error),
            stats: RunStats::default(),
        }
    }
}

/// Runs one search. Create a new scheduler for every run.
pub struct Scheduler {
    config: CrackConfig,
    signal: Arc<CancellationSignal>,
    progress: Arc<dyn Progress>,
}

impl Scheduler {
    pub fn new(config: CrackConfig) -> Self {
        Self {
            config,
            signal: Arc::new(CancellationSignal::new()),
            progress: Arc::new(NoProgress),
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn Progress>) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &CrackConfig {
        &self.config
    }

    /// Handle for stopping the run from outside, e.g. on Ctrl-C or a deadline.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle(Arc::clone(&self.signal))
    }

    pub async fn run(self, entry: Arc<ArchiveEntry>, wordlist: &Wordlist) -> RunReport {
        let started = Instant::now();
        let mut stats = RunStats::default();

        let index = {
            let wordlist = wordlist.clone();
            match spawn_blocking(move || wordlist.index()).await {
                Ok(Ok(index)) => Arc::new(index),
                Ok(Err(e)) => return RunReport::failed(e),
                Err(e) => return RunReport::failed(Error::Worker(join_message(e))),
            }
        };

        let total = index.total_lines();
        let ranges = partition(total, self.config.workers.max(1));
        stats.total_lines = total;

        info!(
            entry = %entry.name,
            wordlist = %wordlist.path().display(),
            candidates = total,
            workers = ranges.len(),
            "starting dictionary search"
        );
        self.progress.start(total, ranges.len());

        let handles: Vec<_> = ranges
            .iter()
            .enumerate()
            .map(|(id, &range)| {
                let entry = Arc::clone(&entry);
                let wordlist = wordlist.clone();
                let index = Arc::clone(&index);
                let signal = Arc::clone(&self.signal);
                let progress = Arc::clone(&self.progress);
                let progress_interval = self.config.progress_interval;

                debug!(worker = id, range = %range, "spawning worker");
                spawn_blocking(move || {
                    Worker {
                        id,
                        range,
                        entry: &entry,
                        wordlist: &wordlist,
                        index: &index,
                        signal: &signal,
                        progress: progress.as_ref(),
                        progress_interval,
                    }
                    .run()
                })
            })
            .collect();

        // Join every worker before looking at the verdict.
        let mut failures: Vec<Option<Error>> = Vec::with_capacity(handles.len());
        let mut panicked = None;
        for handle in handles {
            match handle.await {
                Ok((worker_stats, result)) => {
                    stats.examined.push(worker_stats.examined);
                    stats.false_positives += worker_stats.false_positives;
                    stats.skipped += worker_stats.skipped;
                    failures.push(result.err());
                }
                Err(e) => {
                    stats.examined.push(0);
                    failures.push(None);
                    panicked.get_or_insert_with(|| join_message(e));
                }
            }
        }
        self.progress.finish();
        stats.elapsed = started.elapsed();

        let exhausted = stats.examined_total() + stats.skipped == total;
        let result = conclude(self.signal.reason(), &mut failures, panicked, exhausted);

        debug!(
            examined = stats.examined_total(),
            false_positives = stats.false_positives,
            skipped = stats.skipped,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "search finished"
        );
        RunReport { result, stats }
    }
}

/// Turn the winning halt, if any, into the outcome of a run.
///
/// `failures[i]` is the error worker `i` returned. `exhausted` tells whether
/// every line was consumed.
fn conclude(
    reason: Option<&Halt>,
    failures: &mut [Option<Error>],
    panicked: Option<String>,
    exhausted: bool,
) -> RunResult {
    match reason {
        Some(Halt::Found(password)) => RunResult::Found(password.clone()),
        Some(Halt::Failed { worker }) => RunResult::Error(
            failures
                .get_mut(*worker)
                .and_then(Option::take)
                .unwrap_or_else(|| Error::Worker(format!("worker {worker} failed"))),
        ),
        // A cancellation that lands after every range was finished changes nothing.
        Some(Halt::Cancelled) if panicked.is_none() && exhausted => RunResult::NotFound,
        Some(Halt::Cancelled) => RunResult::Error(Error::Interrupted),
        None => match panicked {
            Some(msg) => RunResult::Error(Error::Worker(msg)),
            None => RunResult::NotFound,
        },
    }
}

fn join_message(e: JoinError) -> String {
    if !e.is_panic() {
        return e.to_string();
    }
    let payload = e.into_panic();
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "worker panicked".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn unreadable(name: &str) -> Error {
        Error::FileNotReadable {
            path: name.into(),
            source: io::Error::other("read failed"),
        }
    }

    #[test]
    fn failed_halt_reports_that_workers_error() {
        let mut failures = [Some(unreadable("a")), Some(unreadable("b")), None];
        let result = conclude(Some(&Halt::Failed { worker: 1 }), &mut failures, None, false);
        assert!(
            matches!(&result, RunResult::Error(Error::FileNotReadable { path, .. }) if path.as_os_str() == "b"),
            "{result:?}"
        );
    }

    #[test]
    fn found_outranks_recorded_failures() {
        let mut failures = [Some(unreadable("a"))];
        let found = Halt::Found("pw".into());
        let result = conclude(Some(&found), &mut failures, Some("boom".into()), false);
        assert_eq!(result.password(), Some(&Candidate::from("pw")));
    }

    #[test]
    fn failure_without_its_error_is_still_an_error() {
        let result = conclude(Some(&Halt::Failed { worker: 7 }), &mut [], None, false);
        assert!(matches!(result, RunResult::Error(Error::Worker(_))));
    }

    #[test]
    fn cancellation_depends_on_exhaustion() {
        let late = conclude(Some(&Halt::Cancelled), &mut [], None, true);
        assert!(matches!(late, RunResult::NotFound));

        let early = conclude(Some(&Halt::Cancelled), &mut [], None, false);
        assert!(matches!(early, RunResult::Error(Error::Interrupted)));

        let panicked = conclude(Some(&Halt::Cancelled), &mut [], Some("boom".into()), true);
        assert!(matches!(panicked, RunResult::Error(Error::Interrupted)));
    }

    #[test]
    fn panic_without_halt_is_a_worker_error() {
        let result = conclude(None, &mut [None, None], Some("boom".into()), true);
        assert!(matches!(result, RunResult::Error(Error::Worker(msg)) if msg == "boom"));
        assert!(matches!(conclude(None, &mut [None], None, true), RunResult::NotFound));
    }
}
