use num::Float;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::SparseVector;

impl<N> Serialize for SparseVector<N>
where
    N: Float + Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // シリアライズするフィールドは len, nnz, inds, vals
        let mut state = serializer.serialize_struct("SparseVector", 4)?;
        state.serialize_field("len", &(self.feature_count as u64))?;
        state.serialize_field("nnz", &(self.inds.len() as u64))?;
        state.serialize_field("inds", &self.inds)?;
        state.serialize_field("vals", &self.vals)?;
        state.end()
    }
}

impl<'de, N> Deserialize<'de> for SparseVector<N>
where
    N: Float + Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error as DeError;

        // 内部表現用の一時構造体
        #[derive(Deserialize)]
        struct SparseVectorData<N> {
            len: u64,
            nnz: u64,
            inds: Vec<u32>,
            vals: Vec<N>,
        }

        let data = SparseVectorData::<N>::deserialize(deserializer)?;
        if data.inds.len() != data.vals.len() {
            return Err(DeError::custom("inds and vals length mismatch"));
        }
        if data.inds.len() as u64 != data.nnz {
            return Err(DeError::custom("nnz does not match inds/vals length"));
        }
        if data.inds.first() == Some(&0) {
            return Err(DeError::custom("feature id 0 is reserved"));
        }
        if data.inds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(DeError::custom("inds must be strictly ascending"));
        }
        if data.inds.last().map_or(false, |&f| f as u64 > data.len) {
            return Err(DeError::custom("feature id exceeds len"));
        }
        if data.vals.iter().any(|v| v.is_nan()) {
            return Err(DeError::custom("unknown values are not stored"));
        }
        if data.vals.iter().any(|v| v.is_infinite()) {
            return Err(DeError::custom("feature values must be finite"));
        }

        Ok(SparseVector {
            inds: data.inds,
            vals: data.vals,
            feature_count: data.len as usize,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::vector::{FeatureVector, SparseVector};

    #[test]
    fn cbor_keeps_feature_count_and_entries() {
        let mut v: SparseVector = SparseVector::new();
        v.set(4, 0.25).unwrap();
        v.set(30, f32::NAN).unwrap();
        let bytes = serde_cbor::to_vec(&v).unwrap();
        let back: SparseVector = serde_cbor::from_slice(&bytes).unwrap();
        assert_eq!(back, v);
        assert_eq!(back.feature_count(), 30);
    }

    #[test]
    fn rejects_invalid_snapshots() {
        #[derive(serde::Serialize)]
        struct Raw {
            len: u64,
            nnz: u64,
            inds: Vec<u32>,
            vals: Vec<f32>,
        }
        let raw = Raw { len: 9, nnz: 2, inds: vec![5, 2], vals: vec![1.0, 2.0] };
        let bytes = serde_cbor::to_vec(&raw).unwrap();
        assert!(serde_cbor::from_slice::<SparseVector>(&bytes).is_err());

        let raw = Raw { len: 9, nnz: 1, inds: vec![3], vals: vec![f32::INFINITY] };
        let bytes = serde_cbor::to_vec(&raw).unwrap();
        assert!(serde_cbor::from_slice::<SparseVector>(&bytes).is_err());
    }
}
