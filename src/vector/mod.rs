pub mod dense;
pub mod sparse;
pub mod serde;

use ::serde::{Deserialize, Serialize};
use num::Float;

use crate::error::{ParseError, Result};
use crate::utils::sentinel::{is_unknown, unknown};

pub use dense::DenseVector;
pub use sparse::SparseVector;

/// Storage strategy of a feature vector, chosen once per record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Storage {
    /// direct index-addressed array, for feature spaces that are mostly filled
    #[default]
    Dense,
    /// sorted index/value association holding only known values
    Sparse,
}

/// Capability contract shared by every feature storage.
///
/// Index 0 is reserved and never holds a value. A feature that was never set
/// reads back as the unknown marker (NaN), which is distinct from `0.0`.
///
/// For the same sequence of `set` / `replace_whole_vector` calls, every
/// implementation returns identical `read_whole_vector()` output.
pub trait FeatureVector<N = f32>
where
    N: Float,
{
    /// Value of feature `fid`, or the unknown marker when it was never set
    fn get(&self, fid: usize) -> N;

    /// Set feature `fid`. Storing the unknown marker clears the feature.
    /// Infinite values are rejected.
    fn set(&mut self, fid: usize, value: N) -> Result<()>;

    /// Replace the whole vector with a dense array (`values[0]` is ignored).
    /// `feature_count()` never decreases. On error the vector is unchanged.
    fn replace_whole_vector(&mut self, values: &[N]) -> Result<()>;

    /// Dense array of `feature_count() + 1` slots, slot 0 unknown.
    fn read_whole_vector(&self) -> Vec<N>;

    /// Highest feature index observed by this instance (0 when empty)
    fn feature_count(&self) -> usize;

    /// Known `(fid, value)` pairs, ascending by fid
    fn known_pairs(&self) -> Vec<(usize, N)> {
        self.read_whole_vector()
            .into_iter()
            .enumerate()
            .skip(1)
            .filter(|(_, v)| !is_unknown(*v))
            .collect()
    }

    /// Number of known values
    fn nnz(&self) -> usize {
        self.known_pairs().len()
    }
}

/// Feature id validation shared by the storages.
#[inline]
pub(crate) fn check_fid(fid: usize) -> Result<()> {
    if fid == 0 || fid > u32::MAX as usize {
        return Err(ParseError::InvalidFeatureIndex { index: fid as i64 });
    }
    Ok(())
}

/// A value is finite or the unknown marker.
#[inline]
pub(crate) fn check_value<N: Float>(value: N) -> Result<()> {
    if value.is_infinite() {
        return Err(ParseError::non_finite(value.to_f64().unwrap_or(f64::INFINITY)));
    }
    Ok(())
}

/// `check_value` over a dense array, slot 0 excluded
#[inline]
pub(crate) fn check_values<N: Float>(values: &[N]) -> Result<()> {
    values.iter().skip(1).try_for_each(|&v| check_value(v))
}

/// Dense or sparse storage behind the `FeatureVector` contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FeatureStore<N = f32>
where
    N: Float,
{
    Dense(DenseVector<N>),
    Sparse(SparseVector<N>),
}

impl<N> FeatureStore<N>
where
    N: Float,
{
    /// Empty storage of the given kind
    pub fn new(storage: Storage) -> Self {
        match storage {
            Storage::Dense => FeatureStore::Dense(DenseVector::new()),
            Storage::Sparse => FeatureStore::Sparse(SparseVector::new()),
        }
    }

    /// Build from a dense array (`values[0]` is ignored).
    /// `increment` is the growth step of the dense storage.
    pub fn from_dense(storage: Storage, values: Vec<N>, increment: usize) -> Result<Self> {
        Ok(match storage {
            Storage::Dense => FeatureStore::Dense(DenseVector::from_vec(values, increment)?),
            Storage::Sparse => FeatureStore::Sparse(SparseVector::from_dense(&values)?),
        })
    }

    pub fn storage(&self) -> Storage {
        match self {
            FeatureStore::Dense(_) => Storage::Dense,
            FeatureStore::Sparse(_) => Storage::Sparse,
        }
    }

    /// Convert to another storage kind. `read_whole_vector()` is unchanged.
    pub fn into_storage(self, storage: Storage) -> Self {
        match (self, storage) {
            (FeatureStore::Dense(d), Storage::Sparse) => {
                FeatureStore::Sparse(SparseVector::from_known(&d.read_whole_vector()))
            }
            (FeatureStore::Sparse(s), Storage::Dense) => FeatureStore::Dense(DenseVector::from_known(
                s.read_whole_vector(),
                crate::config::FEATURE_INCREASE,
            )),
            (same, _) => same,
        }
    }

    fn as_dyn(&self) -> &dyn FeatureVector<N> {
        match self {
            FeatureStore::Dense(v) => v,
            FeatureStore::Sparse(v) => v,
        }
    }

    fn as_dyn_mut(&mut self) -> &mut dyn FeatureVector<N> {
        match self {
            FeatureStore::Dense(v) => v,
            FeatureStore::Sparse(v) => v,
        }
    }
}

impl<N> FeatureVector<N> for FeatureStore<N>
where
    N: Float,
{
    #[inline]
    fn get(&self, fid: usize) -> N {
        self.as_dyn().get(fid)
    }

    #[inline]
    fn set(&mut self, fid: usize, value: N) -> Result<()> {
        self.as_dyn_mut().set(fid, value)
    }

    fn replace_whole_vector(&mut self, values: &[N]) -> Result<()> {
        self.as_dyn_mut().replace_whole_vector(values)
    }

    fn read_whole_vector(&self) -> Vec<N> {
        self.as_dyn().read_whole_vector()
    }

    #[inline]
    fn feature_count(&self) -> usize {
        self.as_dyn().feature_count()
    }

    fn known_pairs(&self) -> Vec<(usize, N)> {
        self.as_dyn().known_pairs()
    }

    fn nnz(&self) -> usize {
        self.as_dyn().nnz()
    }
}

/// Dense array of `len` unknown slots
#[inline]
pub(crate) fn unknown_vec<N: Float>(len: usize) -> Vec<N> {
    vec![unknown(); len]
}
