//! Progress reporting hooks for the worker pool.
//!
//! The scheduler only talks to the [`Progress`] trait; rendering is left to
//! whoever constructs it.

use indicatif::{ProgressBar, ProgressStyle};

/// Receives progress events from a run. All methods default to doing nothing.
pub trait Progress: Send + Sync {
    /// Called once before any worker starts.
    fn start(&self, _total: u64, _workers: usize) {}

    /// `examined` more candidates have been verified.
    fn advance(&self, _examined: u64) {}

    /// Called once after every worker has stopped.
    fn finish(&self) {}
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl Progress for NoProgress {}

/// Terminal progress bar.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::hidden();
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec}, {eta})",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
        );
        Self { bar }
    }
}

impl Default for BarProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl Progress for BarProgress {
    fn start(&self, total: u64, _workers: usize) {
        self.bar.set_length(total);
        self.bar
            .set_draw_target(indicatif::ProgressDrawTarget::stderr());
    }

    fn advance(&self, examined: u64) {
        self.bar.inc(examined);
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
