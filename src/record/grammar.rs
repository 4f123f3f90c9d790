//! Line grammar of a record:
//!
//! ```text
//! <label> qid:<id> <f1>:<v1> <f2>:<v2> ... [# free-text]
//! ```

use crate::error::{ParseError, Result};

/// Tokens of one line, borrowed from the input.
#[derive(Debug, Clone, PartialEq)]
pub struct RawLine<'a> {
    pub label: &'a str,
    /// the full `key:value` identifier token
    pub id_token: &'a str,
    pub features: Vec<FeatureToken<'a>>,
    /// everything from the first `#`, marker included
    pub description: Option<&'a str>,
}

/// A `key:value` feature token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureToken<'a> {
    pub raw: &'a str,
    /// before the first colon
    pub key: &'a str,
    /// after the last colon
    pub value: &'a str,
}

impl<'a> FeatureToken<'a> {
    fn split(raw: &'a str) -> Result<Self> {
        match (raw.find(':'), raw.rfind(':')) {
            (Some(first), Some(last)) => Ok(Self {
                raw,
                key: &raw[..first],
                value: &raw[last + 1..],
            }),
            _ => Err(ParseError::malformed(format!("feature token {raw:?} is not key:value"))),
        }
    }

    /// Integer feature key. Range checks are left to the decoder.
    pub fn index(&self) -> Result<i64> {
        self.key
            .parse::<i64>()
            .map_err(|_| ParseError::malformed(format!("feature key {:?} is not an integer", self.key)))
    }

    /// Finite floating value.
    pub fn number(&self) -> Result<f32> {
        parse_finite(self.value)
    }
}

impl<'a> RawLine<'a> {
    /// Identifier: the text after the last colon of the identifier token
    pub fn id(&self) -> &'a str {
        after_last_colon(self.id_token)
    }

    /// Parsed, non-negative label
    pub fn label_value(&self) -> Result<f32> {
        let label = parse_finite(self.label)?;
        if label < 0.0 {
            return Err(ParseError::NegativeLabel { label });
        }
        Ok(label)
    }
}

/// Split a line into label, identifier, feature tokens and description.
///
/// Only the shape is checked here; numbers are parsed lazily by the caller.
pub fn tokenize(line: &str) -> Result<RawLine<'_>> {
    let (body, description) = match line.find('#') {
        Some(idx) => (&line[..idx], Some(&line[idx..])),
        None => (line, None),
    };

    let mut tokens = body.split_whitespace();
    let label = tokens
        .next()
        .ok_or_else(|| ParseError::malformed("empty record"))?;
    let id_token = tokens
        .next()
        .ok_or_else(|| ParseError::malformed("missing identifier token"))?;
    if !id_token.contains(':') {
        return Err(ParseError::malformed(format!("identifier token {id_token:?} is not key:value")));
    }

    let features = tokens.map(FeatureToken::split).collect::<Result<Vec<_>>>()?;

    Ok(RawLine {
        label,
        id_token,
        features,
        description,
    })
}

#[inline]
fn after_last_colon(token: &str) -> &str {
    match token.rfind(':') {
        Some(idx) => &token[idx + 1..],
        None => token,
    }
}

/// Parse a finite float. NaN and infinities are rejected: NaN is the unknown marker.
fn parse_finite(token: &str) -> Result<f32> {
    match token.parse::<f32>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ParseError::number(token)),
    }
}
