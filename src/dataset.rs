//! Batches of records grouped by identifier.
//!
//! Each line is parsed on its own, so a batch can be split across rayon
//! workers. Every worker produces fully owned records.

use std::io::BufRead;

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ParseConfig;
use crate::error::ParseError;
use crate::record::Record;

#[derive(Debug, Error)]
pub enum DatasetError {
    /// A line failed to parse in strict mode. `line` is 1-based.
    #[error("line {line}: {source}")]
    Line {
        line: usize,
        #[source]
        source: ParseError,
    },

    #[error("read error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot error: {0}")]
    Snapshot(#[from] serde_cbor::Error),
}

/// What to do with a line that fails to parse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strictness {
    /// abort the batch on the first bad line
    #[default]
    Strict,
    /// skip bad lines, counting them
    Lenient,
}

/// Records sharing one identifier, in input order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RankList {
    pub id: String,
    pub records: Vec<Record>,
}

impl RankList {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            records: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn max_feature_count(&self) -> usize {
        self.records.iter().map(Record::feature_count).max().unwrap_or(0)
    }
}

/// Parsed records grouped into rank lists by identifier.
/// Rank lists keep the order in which identifiers first appear.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    lists: IndexMap<String, RankList>,
    skipped: usize,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a batch of lines.
    /// Empty lines and lines starting with `#` are ignored.
    pub fn parse_lines<I, S>(lines: I, config: &ParseConfig, strictness: Strictness) -> Result<Self, DatasetError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut dataset = Self::new();
        for (i, line) in lines.into_iter().enumerate() {
            if let Some(outcome) = parse_one(line.as_ref(), config) {
                dataset.accept(i + 1, outcome, strictness)?;
            }
        }
        dataset.log_summary();
        Ok(dataset)
    }

    /// Same as `parse_lines`, with the lines parsed in parallel.
    /// Record order and error reporting match the sequential version.
    pub fn par_parse_lines<S>(lines: &[S], config: &ParseConfig, strictness: Strictness) -> Result<Self, DatasetError>
    where
        S: AsRef<str> + Sync,
    {
        let outcomes: Vec<Option<crate::Result<Record>>> = lines
            .par_iter()
            .map(|line| parse_one(line.as_ref(), config))
            .collect();

        let mut dataset = Self::new();
        for (i, outcome) in outcomes.into_iter().enumerate() {
            if let Some(outcome) = outcome {
                dataset.accept(i + 1, outcome, strictness)?;
            }
        }
        dataset.log_summary();
        Ok(dataset)
    }

    /// Read and parse every line of `reader`.
    pub fn read_from<R: BufRead>(reader: R, config: &ParseConfig, strictness: Strictness) -> Result<Self, DatasetError> {
        let mut dataset = Self::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if let Some(outcome) = parse_one(&line, config) {
                dataset.accept(i + 1, outcome, strictness)?;
            }
        }
        dataset.log_summary();
        Ok(dataset)
    }

    /// Append a record to the rank list of its identifier
    pub fn push(&mut self, record: Record) {
        self.lists
            .entry(record.id().to_string())
            .or_insert_with_key(|id| RankList::new(id.as_str()))
            .records
            .push(record);
    }

    fn accept(&mut self, line: usize, outcome: crate::Result<Record>, strictness: Strictness) -> Result<(), DatasetError> {
        match (outcome, strictness) {
            (Ok(record), _) => {
                self.push(record);
                Ok(())
            }
            (Err(source), Strictness::Strict) => {
                tracing::debug!(line, error = %source, "rejecting batch");
                Err(DatasetError::Line { line, source })
            }
            (Err(source), Strictness::Lenient) => {
                tracing::warn!(line, error = %source, "skipping malformed line");
                self.skipped += 1;
                Ok(())
            }
        }
    }

    fn log_summary(&self) {
        tracing::info!(
            records = self.len(),
            rank_lists = self.lists.len(),
            skipped = self.skipped,
            "dataset parsed"
        );
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.lists.values().map(RankList::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    /// Lines skipped in lenient mode
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn rank_lists(&self) -> impl Iterator<Item = &RankList> {
        self.lists.values()
    }

    pub fn rank_list(&self, id: &str) -> Option<&RankList> {
        self.lists.get(id)
    }

    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.lists.values().flat_map(|l| l.records.iter())
    }

    /// Store `score(record)` in every record's cache, in parallel per rank list.
    /// Identifiers stay fixed, so grouping is never disturbed.
    pub fn score_with<F>(&mut self, score: F)
    where
        F: Fn(&Record) -> f64 + Sync,
    {
        for list in self.lists.values_mut() {
            list.records.par_iter_mut().for_each(|r| {
                let s = score(r);
                r.cache_score(s);
            });
        }
    }

    /// Mark every cached score as stale
    pub fn invalidate_scores(&mut self) {
        for r in self.lists.values_mut().flat_map(|l| l.records.iter_mut()) {
            r.invalidate_cache();
        }
    }

    /// Highest feature index across all records
    pub fn max_feature_count(&self) -> usize {
        self.lists.values().map(RankList::max_feature_count).max().unwrap_or(0)
    }

    /// Encode the dataset as CBOR so it can be cached without re-parsing
    pub fn to_cbor(&self) -> Result<Vec<u8>, DatasetError> {
        Ok(serde_cbor::to_vec(self)?)
    }

    pub fn from_cbor(bytes: &[u8]) -> Result<Self, DatasetError> {
        Ok(serde_cbor::from_slice(bytes)?)
    }
}

/// `None` for lines that carry no record
fn parse_one(line: &str, config: &ParseConfig) -> Option<crate::Result<Record>> {
    let trimmed = line.trim_start();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    Some(Record::parse(line, config))
}
