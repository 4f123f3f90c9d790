use thiserror::Error;

/// Errors raised while turning a line of text into a `Record`.
///
/// Every variant is terminal for the line being parsed. Nothing is retried
/// and no default value is substituted; the caller decides whether to skip
/// the line or abort the batch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// The label parsed as a number but is below zero.
    #[error("relevance label cannot be negative: {label}")]
    NegativeLabel { label: f32 },

    /// Structural problem with the line (missing tokens, bad `key:value` shape).
    #[error("malformed record: {reason}")]
    MalformedRecord { reason: String },

    /// A feature key was zero or negative. Feature numbering starts at 1.
    #[error("feature index must be >= 1, got {index}")]
    InvalidFeatureIndex { index: i64 },

    /// A label or feature value is not a valid (finite) number.
    #[error("invalid number: {token:?}")]
    NumberFormat { token: String },

    /// Dense storage for feature `index` could not be allocated.
    #[error("cannot allocate dense storage up to feature {index}")]
    CapacityOverflow { index: usize },
}

impl ParseError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        ParseError::MalformedRecord { reason: reason.into() }
    }

    pub(crate) fn number(token: &str) -> Self {
        ParseError::NumberFormat { token: token.to_string() }
    }

    pub(crate) fn non_finite(value: f64) -> Self {
        ParseError::NumberFormat { token: value.to_string() }
    }
}

pub type Result<T> = std::result::Result<T, ParseError>;
