use num::Float;
use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_INITIAL_CAPACITY, FEATURE_INCREASE};
use crate::error::Result;
use crate::utils::growth::GrowBuffer;
use crate::utils::sentinel::unknown;

use super::{check_fid, check_value, check_values, unknown_vec, FeatureVector};

/// Feature vector addressed directly by feature id.
///
/// Backed by a `GrowBuffer`, so writing past the end grows in
/// `FEATURE_INCREASE` steps and fills the gap with the unknown marker.
/// Reads past the end return the unknown marker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseVector<N = f32>
where
    N: Float,
{
    buf: GrowBuffer<N>,
    feature_count: usize,
}

impl<N> DenseVector<N>
where
    N: Float,
{
    pub fn new() -> Self {
        Self::with_growth(DEFAULT_INITIAL_CAPACITY, FEATURE_INCREASE)
    }

    pub fn with_growth(initial_capacity: usize, increment: usize) -> Self {
        Self {
            buf: GrowBuffer::with_capacity(initial_capacity, increment),
            feature_count: 0,
        }
    }

    /// Take ownership of a decoded dense array. `values[0]` is ignored.
    /// Infinite values are rejected.
    pub fn from_vec(values: Vec<N>, increment: usize) -> Result<Self> {
        check_values(&values)?;
        Ok(Self::from_known(values, increment))
    }

    /// `from_vec` for values already known to be finite or unknown
    pub(crate) fn from_known(mut values: Vec<N>, increment: usize) -> Self {
        let feature_count = values.len().saturating_sub(1);
        if let Some(slot0) = values.first_mut() {
            *slot0 = unknown();
        }
        Self {
            buf: GrowBuffer::from_vec(values, increment),
            feature_count,
        }
    }

    /// Allocated slots, including slot 0 and unused trailing capacity
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Drop trailing capacity beyond `feature_count() + 1`
    pub fn shrink_to_fit(&mut self) {
        self.buf.shrink_to(self.feature_count + 1);
    }

    #[inline]
    pub fn as_slice(&self) -> &[N] {
        &self.buf.as_slice()[..(self.feature_count + 1).min(self.buf.capacity())]
    }
}

impl<N> Default for DenseVector<N>
where
    N: Float,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<N> FeatureVector<N> for DenseVector<N>
where
    N: Float,
{
    #[inline]
    fn get(&self, fid: usize) -> N {
        if fid == 0 {
            return unknown();
        }
        self.buf.get(fid)
    }

    #[inline]
    fn set(&mut self, fid: usize, value: N) -> Result<()> {
        check_fid(fid)?;
        check_value(value)?;
        self.buf.set(fid, value)?;
        if fid > self.feature_count {
            self.feature_count = fid;
        }
        Ok(())
    }

    fn replace_whole_vector(&mut self, values: &[N]) -> Result<()> {
        let feature_count = self.feature_count;
        *self = Self::from_vec(values.to_vec(), self.buf.increment())?;
        self.feature_count = self.feature_count.max(feature_count);
        Ok(())
    }

    fn read_whole_vector(&self) -> Vec<N> {
        let mut out = unknown_vec(self.feature_count + 1);
        let slice = self.as_slice();
        out[..slice.len()].copy_from_slice(slice);
        out
    }

    #[inline]
    fn feature_count(&self) -> usize {
        self.feature_count
    }
}
