use crate::zip::{CheckByte, EntrySelector};

/// Settings for one cracking run, independent of how they were collected.
#[derive(Debug, Clone)]
pub struct CrackConfig {
    /// Number of parallel workers, at least one.
    pub workers: usize,
    pub entry: EntrySelector,
    pub check_byte: CheckByte,
    /// Candidates a worker examines between progress reports.
    pub progress_interval: u64,
}

impl CrackConfig {
    pub const DEFAULT_PROGRESS_INTERVAL: u64 = 1024;

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }
}

impl Default for CrackConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get(),
            entry: EntrySelector::First,
            check_byte: CheckByte::Auto,
            progress_interval: Self::DEFAULT_PROGRESS_INTERVAL,
        }
    }
}
