use tracing::debug;

use crate::error::Result;
use crate::oracle::{self, Examination};
use crate::progress::Progress;
use crate::wordlist::{LineIndex, Wordlist};
use crate::zip::ArchiveEntry;

use super::partition::WorkRange;
use super::signal::{CancellationSignal, Halt};

/// Counters one worker accumulates over its range.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WorkerStats {
    pub examined: u64,
    /// Candidates that passed the header check but failed the checksum.
    pub false_positives: u64,
    /// Lines too long to be tried.
    pub skipped: u64,
}

/// Everything a worker needs, borrowed from the scheduler's shared state.
pub(crate) struct Worker<'a> {
    pub id: usize,
    pub range: WorkRange,
    pub entry: &'a ArchiveEntry,
    pub wordlist: &'a Wordlist,
    pub index: &'a LineIndex,
    pub signal: &'a CancellationSignal,
    pub progress: &'a dyn Progress,
    pub progress_interval: u64,
}

impl Worker<'_> {
    /// Scan the range until it runs out or the signal halts.
    ///
    /// A read error halts the signal on behalf of this worker before it is
    /// returned, so peers stop early.
    pub fn run(self) -> (WorkerStats, Result<()>) {
        let mut stats = WorkerStats::default();
        let result = self.scan(&mut stats);

        if result.is_err() && self.signal.halt(Halt::Failed { worker: self.id }) {
            debug!(worker = self.id, "worker failed, stopping peers");
        }
        debug!(
            worker = self.id,
            range = %self.range,
            examined = stats.examined,
            false_positives = stats.false_positives,
            skipped = stats.skipped,
            "worker stopped"
        );
        (stats, result)
    }

    fn scan(&self, stats: &mut WorkerStats) -> Result<()> {
        if self.range.is_empty() {
            return Ok(());
        }

        let mut candidates = self.wordlist.iterate_indexed(self.range, self.index)?;
        let mut unreported = 0u64;

        let outcome = loop {
            if self.signal.is_halted() {
                break Ok(());
            }
            let candidate = match candidates.next() {
                Some(Ok(candidate)) => candidate,
                Some(Err(e)) => break Err(e),
                None => break Ok(()),
            };

            stats.examined += 1;
            unreported += 1;
            if unreported >= self.progress_interval {
                self.progress.advance(unreported);
                unreported = 0;
            }

            match oracle::examine(self.entry, candidate.as_bytes()) {
                Examination::RejectedByHeader => {}
                Examination::RejectedByChecksum => stats.false_positives += 1,
                Examination::Match => {
                    if self.signal.halt(Halt::Found(candidate)) {
                        debug!(worker = self.id, "password found");
                    }
                    break Ok(());
                }
            }
        };

        stats.skipped = candidates.skipped();
        self.progress.advance(unreported + stats.skipped);
        outcome
    }
}
