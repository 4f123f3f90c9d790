//! Parser configuration.
//!
//! The growth constants are process-wide and read-only. Everything that
//! changes parsing semantics travels in a `ParseConfig` passed per call.

use serde::{Deserialize, Serialize};

use crate::vector::Storage;

/// Initial slot count of the decoding buffer (slot 0 is unused).
pub const DEFAULT_INITIAL_CAPACITY: usize = 51;

/// Step by which the decoding buffer and dense vectors grow.
pub const FEATURE_INCREASE: usize = 10;

/// Value of the score cache of a freshly built record.
pub const INITIAL_SCORE: f64 = -1.0;

/// Value written by `Record::invalidate_cache`.
/// Never a legitimate score and never the unknown feature marker (NaN).
pub const INVALIDATED_SCORE: f64 = -100_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParseConfig {
    /// Storage strategy for the records built with this config
    pub storage: Storage,
    /// Report never-set features as 0.0 instead of the unknown marker
    pub missing_as_zero: bool,
    /// Slots allocated before the first feature is decoded
    pub initial_capacity: usize,
    /// Growth step once a feature index exceeds the capacity
    pub growth_increment: usize,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            storage: Storage::Dense,
            missing_as_zero: false,
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            growth_increment: FEATURE_INCREASE,
        }
    }
}

impl ParseConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_storage(mut self, storage: Storage) -> Self {
        self.storage = storage;
        self
    }

    pub fn with_missing_as_zero(mut self, missing_as_zero: bool) -> Self {
        self.missing_as_zero = missing_as_zero;
        self
    }

    /// Override the growth policy.
    /// An initial capacity below 1 is raised to 1 (slot 0 always exists) and
    /// an increment of 0 is treated as 1.
    pub fn with_growth(mut self, initial_capacity: usize, growth_increment: usize) -> Self {
        self.initial_capacity = initial_capacity.max(1);
        self.growth_increment = growth_increment.max(1);
        self
    }

    #[inline]
    pub(crate) fn increment(&self) -> usize {
        self.growth_increment.max(1)
    }
}
