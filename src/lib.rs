pub mod algorithms;
pub mod core;
pub mod error;
pub mod metrics;

pub use crate::algorithms::compare::{compare, Comparison};
pub use crate::algorithms::scan::{find_similar, CancelFlag, NoProgress, ProgressObserver};
pub use crate::algorithms::topk::TopK;
pub use crate::core::match_result::{MatchCandidate, MatchConfig, MatchResult};
pub use crate::core::series::{Observation, Series};
pub use crate::error::{Error, Result};
pub use crate::metrics::zscore::{window_similarity, z_normalize, WindowStats};

/// High-level facade for shape matching against a loaded [`Series`].
///
/// # Examples
///
/// ```
/// use shape_match::{MatchConfig, Matcher, Series};
///
/// let prices: Vec<f32> = (0..40).map(|i| ((i % 8) as f32).sin()).collect();
/// let series = Series::from_parts((0..40).collect(), prices).unwrap();
///
/// let matcher = Matcher::new(MatchConfig::new(8, 3));
/// let result = matcher.find(&series, 32).unwrap();
/// assert_eq!(result.len(), 3);
/// assert_eq!(result.matches[0].offset, 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    config: MatchConfig,
}

impl Matcher {
    /// Create a new matcher with the given configuration.
    pub fn new(config: MatchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Rank the windows preceding the query at `start`, without progress reporting.
    pub fn find(&self, series: &Series, start: usize) -> Result<MatchResult> {
        find_similar(series, start, &self.config, &NoProgress, None)
    }

    /// Rank the windows preceding the query at `start`, reporting progress to
    /// `observer` and stopping early if `cancel` is raised.
    pub fn find_with(
        &self,
        series: &Series,
        start: usize,
        observer: &dyn ProgressObserver,
        cancel: Option<&CancelFlag>,
    ) -> Result<MatchResult> {
        find_similar(series, start, &self.config, observer, cancel)
    }

    /// Compare the query window at `reference` with the window at `candidate`,
    /// extending raw prices by `horizon` window lengths.
    pub fn compare(
        &self,
        series: &Series,
        reference: usize,
        candidate: usize,
        horizon: usize,
    ) -> Result<Comparison> {
        compare(series, reference, candidate, self.config.window, horizon)
    }
}
