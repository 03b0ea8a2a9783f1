use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};

use crate::wordlist::Candidate;

const SEARCHING: u8 = 0;
const CLAIMED: u8 = 1;
const HALTED: u8 = 2;

/// Why the search stopped early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Halt {
    Found(Candidate),
    /// The worker with this index hit a fatal error.
    Failed { worker: usize },
    Cancelled,
}

/// Shared stop flag with a write-once reason.
///
/// The first [`halt`](Self::halt) wins the compare-and-exchange on `state` and
/// is the only writer of `reason`. Every later call is a no-op. The state
/// never goes back to searching.
#[derive(Debug, Default)]
pub struct CancellationSignal {
    state: AtomicU8,
    reason: OnceLock<Halt>,
}

impl CancellationSignal {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_halted(&self) -> bool {
        self.state.load(Ordering::Acquire) != SEARCHING
    }

    /// Record `reason` if nobody has halted yet. Returns whether this call won.
    pub fn halt(&self, reason: Halt) -> bool {
        if self
            .state
            .compare_exchange(SEARCHING, CLAIMED, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        // Only the claimer reaches this point, so the slot is still empty.
        let _ = self.reason.set(reason);
        self.state.store(HALTED, Ordering::Release);
        true
    }

    /// The winning halt reason, if any.
    ///
    /// If a writer has claimed the signal but not yet stored its reason, this
    /// waits for the store, which is only a few instructions away.
    pub fn reason(&self) -> Option<&Halt> {
        loop {
            match self.state.load(Ordering::Acquire) {
                SEARCHING => return None,
                HALTED => return self.reason.get(),
                _ => std::thread::yield_now(),
            }
        }
    }
}

/// Lets code outside the worker pool stop a run.
#[derive(Debug, Clone)]
pub struct CancelHandle(pub(crate) Arc<CancellationSignal>);

impl CancelHandle {
    /// Ask every worker to stop. Returns `false` if the run had already halted.
    pub fn cancel(&self) -> bool {
        self.0.halt(Halt::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::thread;

    #[test]
    fn starts_searching() {
        let signal = CancellationSignal::new();
        assert!(!signal.is_halted());
        assert_eq!(signal.reason(), None);
    }

    #[test]
    fn second_write_is_a_no_op() {
        let signal = CancellationSignal::new();
        assert!(signal.halt(Halt::Found("first".into())));
        assert!(!signal.halt(Halt::Found("second".into())));
        assert!(!signal.halt(Halt::Cancelled));
        assert!(signal.is_halted());
        assert_eq!(signal.reason(), Some(&Halt::Found("first".into())));
    }

    #[test]
    fn exactly_one_concurrent_writer_wins() {
        const THREADS: usize = 16;

        for _ in 0..50 {
            let signal = Arc::new(CancellationSignal::new());
            let barrier = Arc::new(Barrier::new(THREADS));

            let winners: Vec<bool> = (0..THREADS)
                .map(|i| {
                    let signal = Arc::clone(&signal);
                    let barrier = Arc::clone(&barrier);
                    thread::spawn(move || {
                        barrier.wait();
                        signal.halt(Halt::Found(Candidate::new(format!("pw{i}"))))
                    })
                })
                .collect::<Vec<_>>()
                .into_iter()
                .map(|h| h.join().unwrap())
                .collect();

            let winner = winners.iter().position(|&won| won).unwrap();
            assert_eq!(winners.iter().filter(|&&won| won).count(), 1);
            assert_eq!(
                signal.reason(),
                Some(&Halt::Found(Candidate::new(format!("pw{winner}"))))
            );
        }
    }

    #[test]
    fn cancel_handle_halts_the_signal() {
        let signal = Arc::new(CancellationSignal::new());
        let handle = CancelHandle(Arc::clone(&signal));
        assert!(handle.cancel());
        assert!(!handle.cancel());
        assert_eq!(signal.reason(), Some(&Halt::Cancelled));
    }
}
