use std::fmt;

/// Half-open interval `[start, end)` of wordlist line numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkRange {
    pub start: u64,
    pub end: u64,
}

impl WorkRange {
    pub fn new(start: u64, end: u64) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

impl fmt::Display for WorkRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Split `[0, total)` into `workers` contiguous ranges.
///
/// Every range holds `total / workers` lines and the last one also takes the
/// remainder. With more workers than lines the leading ranges are empty.
/// Zero workers yields no ranges.
pub fn partition(total: u64, workers: usize) -> Vec<WorkRange> {
    if workers == 0 {
        return Vec::new();
    }

    let share = total / workers as u64;
    (0..workers as u64)
        .map(|i| {
            let start = i * share;
            let end = if i + 1 == workers as u64 { total } else { start + share };
            WorkRange::new(start, end)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn last_range_absorbs_remainder() {
        assert_eq!(
            partition(10, 3),
            vec![WorkRange::new(0, 3), WorkRange::new(3, 6), WorkRange::new(6, 10)]
        );
    }

    #[test]
    fn more_workers_than_lines() {
        let ranges = partition(2, 4);
        assert_eq!(ranges.len(), 4);
        assert!(ranges[..3].iter().all(WorkRange::is_empty));
        assert_eq!(ranges[3], WorkRange::new(0, 2));
    }

    #[test]
    fn empty_wordlist() {
        assert!(partition(0, 3).iter().all(WorkRange::is_empty));
        assert!(partition(5, 0).is_empty());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn ranges_tile_the_whole_wordlist(total in 0u64..100_000, workers in 1usize..64) {
            let ranges = partition(total, workers);
            prop_assert_eq!(ranges.len(), workers);

            // Contiguous and in order means disjoint with no gaps.
            let mut next = 0;
            for r in &ranges {
                prop_assert_eq!(r.start, next);
                prop_assert!(r.start <= r.end);
                next = r.end;
            }
            prop_assert_eq!(next, total);
            prop_assert_eq!(ranges.iter().map(WorkRange::len).sum::<u64>(), total);
        }
    }
}
