use crate::config::ParseConfig;
use crate::error::{ParseError, Result};
use crate::utils::growth::GrowBuffer;
use crate::utils::sentinel::is_unknown;

use super::grammar::FeatureToken;

/// Result of decoding the feature tokens of one line.
#[derive(Debug, Clone)]
pub struct DecodedFeatures {
    /// `max_index + 1` slots, slot 0 unused, never-set slots unknown
    pub values: Vec<f32>,
    /// feature tokens processed (repeats count twice)
    pub known_features: usize,
    /// highest feature index referenced, 0 when there were none
    pub max_index: usize,
}

/// Result of decoding the feature tokens of one line into id/value pairs.
#[derive(Debug, Clone, Default)]
pub struct DecodedPairs {
    /// feature ids in token order, repeats kept
    pub inds: Vec<u32>,
    pub vals: Vec<f32>,
    /// feature tokens processed (repeats count twice)
    pub known_features: usize,
}

/// Turns feature tokens into a dense, unknown-filled array or into
/// id/value pairs for sparse storage.
#[derive(Debug, Clone, Copy)]
pub struct SparseDecoder {
    initial_capacity: usize,
    increment: usize,
}

impl SparseDecoder {
    pub fn new(config: &ParseConfig) -> Self {
        Self {
            initial_capacity: config.initial_capacity.max(1),
            increment: config.increment(),
        }
    }

    pub fn decode(&self, tokens: &[FeatureToken<'_>]) -> Result<DecodedFeatures> {
        let mut buf: GrowBuffer<f32> = GrowBuffer::with_capacity(self.initial_capacity, self.increment);
        let mut max_index = 0usize;
        let mut known_features = 0usize;

        for token in tokens {
            known_features += 1;
            let (f, value) = feature(token)?;
            let f = f as usize;

            if !is_unknown(buf.get(f)) {
                tracing::debug!(feature = f, raw = token.raw, "duplicate feature index, last value wins");
            }
            buf.set(f, value)?;
            max_index = max_index.max(f);
        }

        buf.shrink_to(max_index + 1);
        Ok(DecodedFeatures {
            values: buf.into_vec(),
            known_features,
            max_index,
        })
    }

    /// Decode without a dense buffer. Memory is proportional to the number
    /// of tokens, not to the highest feature index.
    pub fn decode_pairs(&self, tokens: &[FeatureToken<'_>]) -> Result<DecodedPairs> {
        let mut out = DecodedPairs {
            inds: Vec::with_capacity(tokens.len()),
            vals: Vec::with_capacity(tokens.len()),
            known_features: 0,
        };
        for token in tokens {
            out.known_features += 1;
            let (f, value) = feature(token)?;
            out.inds.push(f);
            out.vals.push(value);
        }
        Ok(out)
    }
}

/// Validated `(index, value)` of one token, checked in that order
#[inline]
fn feature(token: &FeatureToken<'_>) -> Result<(u32, f32)> {
    let index = token.index()?;
    if index <= 0 || index > u32::MAX as i64 {
        return Err(ParseError::InvalidFeatureIndex { index });
    }
    Ok((index as u32, token.number()?))
}

impl Default for SparseDecoder {
    fn default() -> Self {
        Self::new(&ParseConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::grammar::tokenize;

    fn decode(line: &str) -> Result<DecodedFeatures> {
        let raw = tokenize(line)?;
        SparseDecoder::default().decode(&raw.features)
    }

    #[test]
    fn shrinks_to_max_index() {
        let d = decode("1 qid:a 5:1.0 2:2.0").unwrap();
        assert_eq!(d.max_index, 5);
        assert_eq!(d.values.len(), 6);
        assert_eq!(d.values[2], 2.0);
        assert_eq!(d.values[5], 1.0);
        assert!(d.values[1].is_nan());
        assert!(d.values[0].is_nan());
    }

    #[test]
    fn no_features_leaves_only_slot_zero() {
        let d = decode("3 qid:q").unwrap();
        assert_eq!(d.max_index, 0);
        assert_eq!(d.values.len(), 1);
        assert_eq!(d.known_features, 0);
    }

    #[test]
    fn grows_past_initial_capacity() {
        let d = decode("1 qid:1 3:1 120:0 51:2").unwrap();
        assert_eq!(d.values.len(), 121);
        assert_eq!(d.values[120], 0.0);
        assert_eq!(d.values[51], 2.0);
        assert!(d.values[100].is_nan());
    }

    #[test]
    fn small_growth_policy_is_honored() {
        let config = ParseConfig::new().with_growth(2, 3);
        let raw = tokenize("1 qid:1 1:1 9:9").unwrap();
        let d = SparseDecoder::new(&config).decode(&raw.features).unwrap();
        assert_eq!(d.values.len(), 10);
        assert_eq!(d.values[9], 9.0);
    }

    #[test]
    fn repeats_overwrite_and_double_count() {
        let d = decode("1 qid:1 2:0.1 2:0.7").unwrap();
        assert_eq!(d.values[2], 0.7);
        assert_eq!(d.known_features, 2);
    }

    #[test]
    fn pairs_keep_token_order_and_repeats() {
        let raw = tokenize("1 qid:1 9:0.5 2:0.1 2:0.7").unwrap();
        let p = SparseDecoder::default().decode_pairs(&raw.features).unwrap();
        assert_eq!(p.inds, vec![9, 2, 2]);
        assert_eq!(p.vals, vec![0.5, 0.1, 0.7]);
        assert_eq!(p.known_features, 3);
    }

    #[test]
    fn pairs_reject_what_dense_rejects() {
        for line in ["1 qid:1 0:1", "1 qid:1 x:1", "1 qid:1 3:abc", "1 qid:1 4294967296:1"] {
            let raw = tokenize(line).unwrap();
            let dense = SparseDecoder::default().decode(&raw.features).unwrap_err();
            let pairs = SparseDecoder::default().decode_pairs(&raw.features).unwrap_err();
            assert_eq!(dense, pairs, "{line}");
        }
    }

    #[test]
    fn non_positive_index_is_rejected() {
        assert_eq!(
            decode("2 qid:1 0:0.5").unwrap_err(),
            ParseError::InvalidFeatureIndex { index: 0 }
        );
        assert_eq!(
            decode("2 qid:1 -4:0.5").unwrap_err(),
            ParseError::InvalidFeatureIndex { index: -4 }
        );
    }
}
