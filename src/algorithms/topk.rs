use crate::core::match_result::MatchCandidate;

/// Bounded accumulator of the `k` best-ranked candidates.
///
/// Entries are kept sorted best first under [`MatchCandidate::ranks_before`]
/// (score descending, then offset ascending). Because that order is total on
/// non-NaN scores, the retained set does not depend on the order in which
/// candidates arrive, which lets partial results from separate chunks be
/// merged without changing the outcome.
#[derive(Debug, Clone)]
pub struct TopK {
    entries: Vec<MatchCandidate>,
    k: usize,
}

impl TopK {
    pub fn new(k: usize) -> Self {
        Self {
            entries: Vec::with_capacity(k),
            k,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Offer a candidate.
    ///
    /// Quick-reject: once full, a candidate that does not rank before the
    /// current worst is skipped. Otherwise it is placed by linear insertion
    /// (k is small) and the worst entry falls off.
    #[inline]
    pub fn update(&mut self, offset: usize, score: f64) {
        let cand = MatchCandidate { offset, score };
        if self.k == 0 {
            return;
        }
        if self.entries.len() == self.k {
            match self.entries.last() {
                Some(worst) if cand.ranks_before(worst) => {
                    self.entries.pop();
                }
                _ => return,
            }
        }

        let mut pos = self.entries.len();
        while pos > 0 && cand.ranks_before(&self.entries[pos - 1]) {
            pos -= 1;
        }
        self.entries.insert(pos, cand);
    }

    /// Merge another accumulator into this one, keeping the `k` best of both.
    pub fn merge(&mut self, other: &TopK) {
        let mut merged = Vec::with_capacity(self.k);
        let (a, b) = (&self.entries, &other.entries);
        let (mut ai, mut bi) = (0, 0);

        // Two-pointer merge of two sorted lists
        while merged.len() < self.k && (ai < a.len() || bi < b.len()) {
            let take_a = bi >= b.len() || (ai < a.len() && !b[bi].ranks_before(&a[ai]));
            if take_a {
                merged.push(a[ai]);
                ai += 1;
            } else {
                merged.push(b[bi]);
                bi += 1;
            }
        }

        self.entries = merged;
    }

    /// The retained candidates, best first.
    pub fn into_sorted_vec(self) -> Vec<MatchCandidate> {
        self.entries
    }
}
