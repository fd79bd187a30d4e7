use serde::Serialize;

use crate::error::{Error, Result};

/// Configuration for a similarity search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchConfig {
    /// Window length shared by the query and every candidate.
    pub window: usize,
    /// Number of best matches to keep.
    pub keep: usize,
}

impl MatchConfig {
    pub fn new(window: usize, keep: usize) -> Self {
        Self { window, keep }
    }

    /// Check the parameter preconditions for a query starting at `start`
    /// over a series of `series_len` observations.
    pub fn validate(&self, start: usize, series_len: usize) -> Result<()> {
        if self.window == 0 {
            return Err(Error::InvalidArgument("window length must be > 0".into()));
        }
        if self.keep == 0 {
            return Err(Error::InvalidArgument("keep must be >= 1".into()));
        }
        match start.checked_add(self.window) {
            Some(end) if end <= series_len => Ok(()),
            _ => Err(Error::InvalidArgument(format!(
                "query window [{start}, {start}+{}) exceeds series length {series_len}",
                self.window
            ))),
        }
    }

    /// Number of candidate offsets for a query at `start`: all offsets that
    /// end at least one full window before the query begins.
    pub fn candidate_count(&self, start: usize, series_len: usize) -> usize {
        let limit = start.saturating_sub(self.window);
        // offsets whose window would run past the end are never candidates
        let fit = (series_len + 1).saturating_sub(self.window);
        limit.min(fit)
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self::new(60, 10)
    }
}

/// One scored candidate window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatchCandidate {
    /// Starting offset of the candidate window.
    pub offset: usize,
    /// Similarity in `(0, 1]`; 1.0 means identical normalized shape.
    pub score: f64,
}

impl MatchCandidate {
    /// Whether `self` ranks ahead of `other`: higher score first, and among
    /// equal scores the lower offset.
    #[inline]
    pub fn ranks_before(&self, other: &MatchCandidate) -> bool {
        self.score > other.score || (self.score == other.score && self.offset < other.offset)
    }
}

/// The best matches for one query, ordered best first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub start: usize,
    pub window: usize,
    /// Number of candidate windows that were scored.
    pub candidates: usize,
    pub matches: Vec<MatchCandidate>,
}

impl MatchResult {
    pub fn empty(start: usize, window: usize) -> Self {
        Self {
            start,
            window,
            candidates: 0,
            matches: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn best(&self) -> Option<&MatchCandidate> {
        self.matches.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MatchCandidate> {
        self.matches.iter()
    }

    /// Render one result per line: the offset right-aligned in eight columns,
    /// then the score to three decimals.
    pub fn to_lines(&self) -> Vec<String> {
        self.matches
            .iter()
            .map(|c| format!("[{:8}]  {:.3}", c.offset, c.score))
            .collect()
    }
}

impl<'a> IntoIterator for &'a MatchResult {
    type Item = &'a MatchCandidate;
    type IntoIter = std::slice::Iter<'a, MatchCandidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.matches.iter()
    }
}
