use num::Float;

use crate::error::Result;
use crate::utils::sentinel::{is_unknown, unknown};
use crate::utils::sort::{dedup_last_wins_soa, radix_sort_u32_soa};

use super::{check_fid, check_value, check_values, unknown_vec, FeatureVector};

/// SparseVectorは既知値だけを保持する疎ベクトルです
/// inds と vals を持ち
/// inds は feature id を保持し、
/// vals はその値を保持します
///
/// inds は昇順でソートされ、重複しないことを保証します
/// 未知値(NaN)は保持しません。
#[derive(Debug, Clone, PartialEq)]
pub struct SparseVector<N = f32>
where
    N: Float,
{
    pub(super) inds: Vec<u32>,
    pub(super) vals: Vec<N>,
    /// これまでに観測した最大 feature id
    pub(super) feature_count: usize,
}

impl<N> SparseVector<N>
where
    N: Float,
{
    #[inline]
    pub fn new() -> Self {
        Self {
            inds: Vec::new(),
            vals: Vec::new(),
            feature_count: 0,
        }
    }

    #[inline]
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            inds: Vec::with_capacity(cap),
            vals: Vec::with_capacity(cap),
            feature_count: 0,
        }
    }

    /// 密配列から作成 (`values[0]` は無視、未知値はスキップ)
    /// 無限大があればエラー
    pub fn from_dense(values: &[N]) -> Result<Self> {
        check_values(values)?;
        Ok(Self::from_known(values))
    }

    /// 検証済みの密配列から作成
    pub(crate) fn from_known(values: &[N]) -> Self {
        let mut vec = Self::new();
        vec.fill_from(values);
        vec.feature_count = values.len().saturating_sub(1);
        vec
    }

    /// inds / vals を密配列の既知値で置き換える
    fn fill_from(&mut self, values: &[N]) {
        self.inds.clear();
        self.vals.clear();
        for (f, &v) in values.iter().enumerate().skip(1) {
            if !is_unknown(v) {
                self.inds.push(f as u32);
                self.vals.push(v);
            }
        }
    }

    /// ソートされていないペア列から作成
    /// 同じ id が複数あれば後勝ち、未知値は捨てる
    /// feature_count は未知値を含めた最大 id
    ///
    /// # Arguments
    /// * `inds` - feature id (1以上)
    /// * `vals` - 値
    pub fn from_pairs(mut inds: Vec<u32>, mut vals: Vec<N>) -> Result<Self> {
        debug_assert_eq!(inds.len(), vals.len(), "inds and vals must have the same length");
        for &f in &inds {
            check_fid(f as usize)?;
        }
        for &v in &vals {
            check_value(v)?;
        }
        radix_sort_u32_soa(&mut inds, &mut vals);
        let dup = dedup_last_wins_soa(&mut inds, &mut vals);
        if dup > 0 {
            tracing::debug!(duplicates = dup, "duplicate feature ids overwritten");
        }
        let feature_count = inds.last().map_or(0, |&f| f as usize);

        let mut vec = Self::with_capacity(inds.len());
        for (f, v) in inds.into_iter().zip(vals) {
            if !is_unknown(v) {
                vec.inds.push(f);
                vec.vals.push(v);
            }
        }
        vec.feature_count = feature_count;
        Ok(vec)
    }

    #[inline]
    fn ind_binary_search(&self, fid: usize) -> std::result::Result<usize, usize> {
        if fid > u32::MAX as usize {
            return Err(self.inds.len());
        }
        self.inds.binary_search(&(fid as u32))
    }

    #[inline]
    pub fn shrink_to_fit(&mut self) {
        self.inds.shrink_to_fit();
        self.vals.shrink_to_fit();
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inds.is_empty()
    }

    /// 既知値の (id, 値) を昇順で走査
    #[inline]
    pub fn raw_iter(&self) -> impl Iterator<Item = (u32, N)> + '_ {
        self.inds.iter().copied().zip(self.vals.iter().copied())
    }

    #[inline]
    pub fn as_ind_slice(&self) -> &[u32] {
        &self.inds
    }

    #[inline]
    pub fn as_val_slice(&self) -> &[N] {
        &self.vals
    }
}

impl<N> Default for SparseVector<N>
where
    N: Float,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<N> FeatureVector<N> for SparseVector<N>
where
    N: Float,
{
    #[inline]
    fn get(&self, fid: usize) -> N {
        match self.ind_binary_search(fid) {
            Ok(i) => self.vals[i],
            Err(_) => unknown(),
        }
    }

    fn set(&mut self, fid: usize, value: N) -> Result<()> {
        check_fid(fid)?;
        check_value(value)?;
        match (self.ind_binary_search(fid), is_unknown(value)) {
            (Ok(i), false) => self.vals[i] = value,
            (Ok(i), true) => {
                self.inds.remove(i);
                self.vals.remove(i);
            }
            (Err(i), false) => {
                self.inds.insert(i, fid as u32);
                self.vals.insert(i, value);
            }
            (Err(_), true) => {}
        }
        if fid > self.feature_count {
            self.feature_count = fid;
        }
        Ok(())
    }

    fn replace_whole_vector(&mut self, values: &[N]) -> Result<()> {
        check_values(values)?;
        self.fill_from(values);
        self.feature_count = self.feature_count.max(values.len().saturating_sub(1));
        Ok(())
    }

    fn read_whole_vector(&self) -> Vec<N> {
        let mut out = unknown_vec(self.feature_count + 1);
        for (f, v) in self.raw_iter() {
            out[f as usize] = v;
        }
        out
    }

    #[inline]
    fn feature_count(&self) -> usize {
        self.feature_count
    }

    fn known_pairs(&self) -> Vec<(usize, N)> {
        self.raw_iter().map(|(f, v)| (f as usize, v)).collect()
    }

    #[inline]
    fn nnz(&self) -> usize {
        self.inds.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_indices_sorted_on_out_of_order_set() {
        let mut v: SparseVector = SparseVector::new();
        v.set(5, 1.0).unwrap();
        v.set(2, 2.0).unwrap();
        v.set(9, 0.0).unwrap();
        assert_eq!(v.as_ind_slice(), &[2, 5, 9]);
        assert_eq!(v.as_val_slice(), &[2.0, 1.0, 0.0]);
        assert_eq!(v.feature_count(), 9);
        assert!(v.get(1).is_nan());
        assert_eq!(v.get(9), 0.0);
    }

    #[test]
    fn setting_unknown_removes_entry_but_keeps_feature_count() {
        let mut v: SparseVector = SparseVector::new();
        v.set(3, 1.0).unwrap();
        v.set(3, f32::NAN).unwrap();
        v.set(12, f32::NAN).unwrap();
        assert!(v.is_empty());
        assert_eq!(v.feature_count(), 12);
        assert_eq!(v.read_whole_vector().len(), 13);
    }

    #[test]
    fn replace_skips_unknown_slots() {
        let mut v: SparseVector = SparseVector::new();
        v.set(100, 1.0).unwrap();
        v.replace_whole_vector(&[7.0, f32::NAN, 0.0, f32::NAN, 4.0]).unwrap();
        assert_eq!(v.nnz(), 2);
        assert_eq!(v.feature_count(), 100);
        assert!(v.get(100).is_nan());
        assert!(v.get(0).is_nan());
        let whole = v.read_whole_vector();
        assert_eq!(whole.len(), 101);
        assert_eq!(whole[2], 0.0);
        assert!(whole[3].is_nan());
    }

    #[test]
    fn from_pairs_sorts_and_overwrites() {
        let v = SparseVector::from_pairs(vec![7, 3, 7, 40], vec![1.0f32, 2.0, 5.0, f32::NAN]).unwrap();
        assert_eq!(v.as_ind_slice(), &[3, 7]);
        assert_eq!(v.get(7), 5.0);
        assert_eq!(v.feature_count(), 40);
    }

    #[test]
    fn from_pairs_rejects_index_zero() {
        assert!(SparseVector::<f32>::from_pairs(vec![0], vec![1.0]).is_err());
    }

    #[test]
    fn from_pairs_keeps_large_ids_without_dense_allocation() {
        let v = SparseVector::from_pairs(vec![4_000_000_000, 2], vec![1.0f32, 0.5]).unwrap();
        assert_eq!(v.feature_count(), 4_000_000_000);
        assert_eq!(v.as_ind_slice(), &[2, 4_000_000_000]);
        assert_eq!(v.get(4_000_000_000), 1.0);
    }

    #[test]
    fn infinite_values_are_rejected() {
        let mut v: SparseVector = SparseVector::new();
        assert!(v.set(4, f32::INFINITY).is_err());
        assert_eq!(v.feature_count(), 0);
        assert!(SparseVector::from_pairs(vec![1], vec![f32::NEG_INFINITY]).is_err());
        assert!(SparseVector::from_dense(&[f32::NAN, f32::INFINITY]).is_err());
    }
}
