//! This crate parses LETOR-style text records into labeled feature vectors.

pub mod config;
pub mod dataset;
pub mod error;
pub mod record;
pub mod utils;
pub mod vector;

/// Record
/// One parsed line of the form
/// `<label> qid:<id> <f1>:<v1> <f2>:<v2> ... # comment`.
///
/// It holds:
/// - A non-negative relevance label
/// - An identifier (the query id) used to group records
/// - The trailing comment, `#` included
/// - A feature vector in dense or sparse storage
/// - A mutable score cache for external scoring code
///
/// Features that were never set read back as the unknown marker (NaN),
/// which is distinct from an explicit `0.0`.
///
/// # Serialization
/// Supported. `to_text()` renders the line grammar back, with the label
/// truncated to an integer.
pub use record::{parse_line, parse_line_with, Record};

/// Feature Vector Contract
/// `FeatureVector` is the capability shared by every storage:
/// get / set a feature, replace / read the whole vector, and the highest
/// feature index observed.
///
/// Two implementations are provided:
/// - `DenseVector`: array addressed by feature id, grows in fixed steps
/// - `SparseVector`: sorted id/value pairs holding only known values
///
/// `FeatureStore` is the sum type a `Record` owns; `Storage` selects the
/// variant at construction time.
pub use vector::{DenseVector, FeatureStore, FeatureVector, SparseVector, Storage};

/// Parser Configuration
/// Passed per call. Selects the storage, the growth policy of the decoding
/// buffer, and whether never-set features read as `0.0`.
pub use config::ParseConfig;

/// Errors
/// `ParseError` covers every way a single line can be rejected:
/// - NegativeLabel
/// - MalformedRecord
/// - InvalidFeatureIndex
/// - NumberFormat
/// - CapacityOverflow
pub use error::{ParseError, Result};

/// Dataset
/// Batch parsing (sequential, parallel, or from a reader) with records
/// grouped into `RankList`s by identifier, plus a CBOR snapshot.
pub use dataset::{Dataset, DatasetError, RankList, Strictness};

/// The unknown marker and its test
pub use utils::sentinel::{is_unknown, unknown};

/// The unknown marker for `f32` features
pub const UNKNOWN: f32 = f32::NAN;
