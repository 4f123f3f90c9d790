pub mod decoder;
pub mod grammar;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::{ParseConfig, FEATURE_INCREASE, INITIAL_SCORE, INVALIDATED_SCORE};
use crate::error::{ParseError, Result};
use crate::utils::sentinel::is_unknown;
use crate::vector::{DenseVector, FeatureStore, FeatureVector, SparseVector, Storage};

use decoder::SparseDecoder;
use grammar::tokenize;

/// Parse one line with default settings and the given storage.
pub fn parse_line(text: &str, storage: Storage) -> Result<Record> {
    Record::parse(text, &ParseConfig::default().with_storage(storage))
}

/// Parse one line with an explicit configuration.
pub fn parse_line_with(text: &str, config: &ParseConfig) -> Result<Record> {
    Record::parse(text, config)
}

/// One labeled, sparsely indexed feature vector (one line of input).
///
/// Label, identifier and description are fixed once built, apart from the
/// explicit setters. Feature values and the score cache stay mutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// relevance grade, never negative
    label: f32,
    /// grouping key, e.g. the query id
    id: String,
    /// trailing comment including its `#`, or empty
    description: String,
    /// feature tokens seen when parsed (diagnostics only)
    known_features: usize,
    /// read never-set features as 0.0
    missing_as_zero: bool,
    vector: FeatureStore<f32>,
    /// latest score assigned by external scoring code
    cached: f64,
}

impl Record {
    /// Build a record from one line of text.
    pub fn parse(line: &str, config: &ParseConfig) -> Result<Self> {
        let raw = tokenize(line)?;
        let label = raw.label_value()?;
        let decoder = SparseDecoder::new(config);
        let (vector, known_features) = match config.storage {
            Storage::Dense => {
                let decoded = decoder.decode(&raw.features)?;
                let dense = DenseVector::from_vec(decoded.values, config.increment())?;
                (FeatureStore::Dense(dense), decoded.known_features)
            }
            Storage::Sparse => {
                let decoded = decoder.decode_pairs(&raw.features)?;
                let sparse = SparseVector::from_pairs(decoded.inds, decoded.vals)?;
                (FeatureStore::Sparse(sparse), decoded.known_features)
            }
        };

        Ok(Self {
            label,
            id: raw.id().to_string(),
            description: raw.description.unwrap_or_default().to_string(),
            known_features,
            missing_as_zero: config.missing_as_zero,
            vector,
            cached: INITIAL_SCORE,
        })
    }

    /// Build a record from a label, an identifier and a dense array
    /// (`values[0]` is ignored, NaN means unknown, infinities are rejected).
    pub fn new(label: f32, id: impl Into<String>, values: Vec<f32>, storage: Storage) -> Result<Self> {
        check_label(label)?;
        let known_features = values.iter().skip(1).filter(|v| !is_unknown(**v)).count();
        let vector = FeatureStore::from_dense(storage, values, FEATURE_INCREASE)?;
        Ok(Self {
            label,
            id: id.into(),
            description: String::new(),
            known_features,
            missing_as_zero: false,
            vector,
            cached: INITIAL_SCORE,
        })
    }

    #[inline]
    pub fn label(&self) -> f32 {
        self.label
    }

    pub fn set_label(&mut self, label: f32) -> Result<()> {
        check_label(label)?;
        self.label = label;
        Ok(())
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The description must be empty or start with `#`.
    pub fn set_description(&mut self, description: impl Into<String>) -> Result<()> {
        let description = description.into();
        if !description.is_empty() && !description.starts_with('#') {
            return Err(ParseError::malformed("description must start with '#'"));
        }
        self.description = description;
        Ok(())
    }

    #[inline]
    pub fn known_features(&self) -> usize {
        self.known_features
    }

    /// Highest feature index referenced by this record
    #[inline]
    pub fn feature_count(&self) -> usize {
        self.vector.feature_count()
    }

    #[inline]
    pub fn storage(&self) -> Storage {
        self.vector.storage()
    }

    #[inline]
    pub fn missing_as_zero(&self) -> bool {
        self.missing_as_zero
    }

    /// Value of feature `fid`. Never fails: unset or out-of-range features
    /// read as the unknown marker (or 0.0 with `missing_as_zero`).
    #[inline]
    pub fn get_feature(&self, fid: usize) -> f32 {
        self.resolve(self.vector.get(fid))
    }

    /// Set feature `fid`, growing storage as needed.
    /// Infinite values are rejected and leave the record unchanged.
    pub fn set_feature(&mut self, fid: usize, value: f32) -> Result<()> {
        self.vector.set(fid, value)
    }

    /// Dense array of `feature_count() + 1` slots, slot 0 unused.
    pub fn read_whole_vector(&self) -> Vec<f32> {
        let mut values = self.vector.read_whole_vector();
        if self.missing_as_zero {
            for v in values.iter_mut().skip(1) {
                *v = self.resolve(*v);
            }
        }
        values
    }

    #[inline]
    pub fn vector(&self) -> &FeatureStore<f32> {
        &self.vector
    }

    #[inline]
    pub fn vector_mut(&mut self) -> &mut FeatureStore<f32> {
        &mut self.vector
    }

    /// Switch storage strategy without changing any feature value.
    pub fn into_storage(mut self, storage: Storage) -> Self {
        self.vector = self.vector.into_storage(storage);
        self
    }

    #[inline]
    pub fn cache_score(&mut self, score: f64) {
        self.cached = score;
    }

    #[inline]
    pub fn cached_score(&self) -> f64 {
        self.cached
    }

    #[inline]
    pub fn invalidate_cache(&mut self) {
        self.cached = INVALIDATED_SCORE;
    }

    #[inline]
    pub fn is_cache_invalidated(&self) -> bool {
        self.cached == INVALIDATED_SCORE
    }

    /// Render back to the line grammar.
    /// The label is truncated to an integer; only known features are written.
    pub fn to_text(&self) -> String {
        let mut out = format!("{} qid:{}", self.label as i64, self.id);
        for (f, v) in self.vector.known_pairs() {
            out.push_str(&format!(" {f}:{v}"));
        }
        if !self.description.is_empty() {
            out.push(' ');
            out.push_str(&self.description);
        }
        out
    }

    #[inline]
    fn resolve(&self, value: f32) -> f32 {
        if self.missing_as_zero && is_unknown(value) {
            0.0
        } else {
            value
        }
    }
}

fn check_label(label: f32) -> Result<()> {
    if label.is_nan() || label.is_infinite() {
        return Err(ParseError::number(&label.to_string()));
    }
    if label < 0.0 {
        return Err(ParseError::NegativeLabel { label });
    }
    Ok(())
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl FromStr for Record {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self> {
        Record::parse(s, &ParseConfig::default())
    }
}
