//! Deterministic shuffling and train/test partitioning.

use crate::dataset::Dataset;
use crate::error::{EvalError, Partition, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Return a copy of `dataset` with its instances permuted by `seed`.
///
/// The same seed always yields the same order.
pub fn shuffle(dataset: &Dataset, seed: u64) -> Dataset {
    let (schema, mut instances) = dataset.clone().into_parts();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    instances.shuffle(&mut rng);
    Dataset::from_trusted(schema, instances)
}

/// A contiguous, disjoint train/test partition.
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub train: Dataset,
    pub test: Dataset,
}

/// Fraction-based partitioner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Splitter {
    train_fraction: f64,
    test_fraction: f64,
    /// The test set takes every instance after the training set
    test_is_remainder: bool,
    require_non_empty: bool,
}

/// Absorbs representation error in products such as `100 * 0.57`.
const FLOOR_TOLERANCE: f64 = 1e-9;

impl Splitter {
    /// Create a splitter. If the fractions add up to more than 1, the test
    /// fraction is reduced to `1 - train_fraction`.
    pub fn new(train_fraction: f64, test_fraction: f64) -> Result<Self> {
        check_fraction("training", train_fraction)?;
        check_fraction("test", test_fraction)?;
        if train_fraction > 1.0 {
            return Err(EvalError::InvalidFraction {
                name: "training",
                value: train_fraction,
            });
        }

        let test_is_remainder = train_fraction + test_fraction > 1.0;
        let test_fraction = if test_is_remainder {
            1.0 - train_fraction
        } else {
            test_fraction
        };

        Ok(Self {
            train_fraction,
            test_fraction,
            test_is_remainder,
            require_non_empty: true,
        })
    }

    /// Permit empty partitions instead of failing.
    pub fn allow_empty(mut self) -> Self {
        self.require_non_empty = false;
        self
    }

    pub fn train_fraction(&self) -> f64 {
        self.train_fraction
    }

    /// Effective test fraction after clamping.
    pub fn test_fraction(&self) -> f64 {
        self.test_fraction
    }

    /// Partition sizes for a dataset of `len` instances.
    pub fn sizes(&self, len: usize) -> (usize, usize) {
        let train = floor_share(len, self.train_fraction).min(len);
        let rest = len - train;
        if self.test_is_remainder {
            return (train, rest);
        }
        (train, floor_share(len, self.test_fraction).min(rest))
    }

    /// Cut `dataset` into its first `train` instances and the following `test` instances.
    pub fn split(&self, dataset: &Dataset) -> Result<TrainTestSplit> {
        let (train_size, test_size) = self.sizes(dataset.len());

        if self.require_non_empty {
            if train_size == 0 {
                return Err(EvalError::EmptyDataset {
                    partition: Partition::Training,
                });
            }
            if test_size == 0 {
                return Err(EvalError::EmptyDataset {
                    partition: Partition::Test,
                });
            }
        }

        Ok(TrainTestSplit {
            train: dataset.head(train_size),
            test: dataset.range(train_size, test_size),
        })
    }
}

fn floor_share(len: usize, fraction: f64) -> usize {
    (len as f64 * fraction + FLOOR_TOLERANCE).floor() as usize
}

fn check_fraction(name: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(EvalError::InvalidFraction { name, value });
    }
    Ok(())
}

/// Split with non-empty partitions required.
pub fn split(dataset: &Dataset, train_fraction: f64, test_fraction: f64) -> Result<TrainTestSplit> {
    Splitter::new(train_fraction, test_fraction)?.split(dataset)
}
