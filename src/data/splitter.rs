//! Train/test partitioning

use super::table::Table;
use crate::error::{NotebookError, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How to partition a table into training and evaluation rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SplitStrategy {
    /// Explicit half-open row ranges `[start, end)`
    Ranges {
        train: (usize, usize),
        test: (usize, usize),
    },
    /// First `index` rows train, the rest test
    At { index: usize },
    /// Seeded draw of `train_size` rows without replacement. The test side is
    /// the next `test_size` drawn rows, or every undrawn row when `None`.
    Sample {
        train_size: usize,
        test_size: Option<usize>,
        seed: u64,
    },
    /// Seeded draw of `floor(rows * train_fraction)` training rows
    Fraction { train_fraction: f64, seed: u64 },
}

/// A train/test pair plus the rule that produced it
#[derive(Debug, Clone)]
pub struct Split {
    pub train: Table,
    pub test: Table,
    pub rule: SplitStrategy,
    /// Positions of the training rows in the source table
    pub train_indices: Vec<usize>,
    /// Positions of the evaluation rows in the source table
    pub test_indices: Vec<usize>,
}

impl Split {
    /// True when every source row landed on one side
    pub fn covers(&self, n_rows: usize) -> bool {
        self.train_indices.len() + self.test_indices.len() == n_rows
    }
}

/// Table splitter
pub struct Splitter;

impl Splitter {
    /// Partition `table` according to `strategy`.
    pub fn split(table: &Table, strategy: &SplitStrategy) -> Result<Split> {
        let (train_indices, test_indices) = Self::indices(table.n_rows(), strategy)?;
        debug!(
            train = train_indices.len(),
            test = test_indices.len(),
            ?strategy,
            "split table"
        );

        Ok(Split {
            train: table.take(&train_indices)?,
            test: table.take(&test_indices)?,
            rule: strategy.clone(),
            train_indices,
            test_indices,
        })
    }

    /// Row positions for each side, without materialising the tables
    pub fn indices(n_rows: usize, strategy: &SplitStrategy) -> Result<(Vec<usize>, Vec<usize>)> {
        match strategy {
            SplitStrategy::Ranges { train, test } => Self::range_split(n_rows, *train, *test),
            SplitStrategy::At { index } => Self::range_split(n_rows, (0, *index), (*index, n_rows)),
            SplitStrategy::Sample { train_size, test_size, seed } => {
                Self::sample_split(n_rows, *train_size, *test_size, *seed)
            }
            SplitStrategy::Fraction { train_fraction, seed } => {
                if !(*train_fraction > 0.0 && *train_fraction < 1.0) {
                    return Err(NotebookError::Config(format!(
                        "train_fraction must be in (0, 1), got {}",
                        train_fraction
                    )));
                }
                let train_size = (n_rows as f64 * train_fraction).floor() as usize;
                Self::sample_split(n_rows, train_size, None, *seed)
            }
        }
    }

    fn range_split(
        n_rows: usize,
        train: (usize, usize),
        test: (usize, usize),
    ) -> Result<(Vec<usize>, Vec<usize>)> {
        for &(start, end) in &[train, test] {
            if start > end || end > n_rows {
                return Err(NotebookError::IndexOutOfRange { start, end, rows: n_rows });
            }
        }
        if train.0 < test.1 && test.0 < train.1 {
            return Err(NotebookError::Config(format!(
                "train range [{}, {}) overlaps test range [{}, {})",
                train.0, train.1, test.0, test.1
            )));
        }
        Ok(((train.0..train.1).collect(), (test.0..test.1).collect()))
    }

    fn sample_split(
        n_rows: usize,
        train_size: usize,
        test_size: Option<usize>,
        seed: u64,
    ) -> Result<(Vec<usize>, Vec<usize>)> {
        let requested = train_size
            .checked_add(test_size.unwrap_or(0))
            .filter(|&end| end <= n_rows)
            .ok_or(NotebookError::IndexOutOfRange {
                start: 0,
                end: train_size.saturating_add(test_size.unwrap_or(0)),
                rows: n_rows,
            })?;

        let mut indices: Vec<usize> = (0..n_rows).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        indices.shuffle(&mut rng);

        let mut train: Vec<usize> = indices[..train_size].to_vec();
        let test_end = match test_size {
            Some(_) => requested,
            None => n_rows,
        };
        let mut test: Vec<usize> = indices[train_size..test_end].to_vec();
        train.sort_unstable();
        test.sort_unstable();
        Ok((train, test))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_at_split_sizes() {
        let (train, test) = Splitter::indices(1000, &SplitStrategy::At { index: 900 }).unwrap();
        assert_eq!(train.len(), 900);
        assert_eq!(test.len(), 100);
        assert_eq!(test[0], 900);
    }

    #[test]
    fn test_range_out_of_bounds() {
        let strategy = SplitStrategy::Ranges { train: (0, 469), test: (469, 600) };
        let err = Splitter::indices(569, &strategy).unwrap_err();
        assert!(matches!(err, NotebookError::IndexOutOfRange { end: 600, rows: 569, .. }));
    }

    #[test]
    fn test_overlapping_ranges_rejected() {
        let strategy = SplitStrategy::Ranges { train: (0, 10), test: (5, 20) };
        assert!(matches!(Splitter::indices(20, &strategy), Err(NotebookError::Config(_))));
    }

    #[test]
    fn test_sample_is_deterministic_and_disjoint() {
        let strategy = SplitStrategy::Sample { train_size: 900, test_size: None, seed: 123 };
        let (train_a, test_a) = Splitter::indices(1000, &strategy).unwrap();
        let (train_b, test_b) = Splitter::indices(1000, &strategy).unwrap();
        assert_eq!(train_a, train_b);
        assert_eq!(test_a, test_b);

        let train_set: HashSet<_> = train_a.iter().collect();
        assert!(test_a.iter().all(|i| !train_set.contains(i)));
        assert_eq!(train_a.len() + test_a.len(), 1000);
    }

    #[test]
    fn test_sample_under_covers_with_test_size() {
        let strategy = SplitStrategy::Sample { train_size: 50, test_size: Some(20), seed: 7 };
        let (train, test) = Splitter::indices(100, &strategy).unwrap();
        assert_eq!(train.len(), 50);
        assert_eq!(test.len(), 20);
    }

    #[test]
    fn test_sample_too_large() {
        let strategy = SplitStrategy::Sample { train_size: 90, test_size: Some(20), seed: 7 };
        assert!(matches!(
            Splitter::indices(100, &strategy),
            Err(NotebookError::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn test_fraction_bounds() {
        let strategy = SplitStrategy::Fraction { train_fraction: 1.5, seed: 1 };
        assert!(Splitter::indices(10, &strategy).is_err());
        let strategy = SplitStrategy::Fraction { train_fraction: 0.75, seed: 1 };
        let (train, test) = Splitter::indices(10, &strategy).unwrap();
        assert_eq!((train.len(), test.len()), (7, 3));
    }
}
