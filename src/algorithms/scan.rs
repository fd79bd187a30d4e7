use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::algorithms::topk::TopK;
use crate::core::match_result::{MatchConfig, MatchResult};
use crate::core::series::Series;
use crate::error::{Error, Result};
use crate::metrics::zscore::{euclidean, similarity, z_normalize, z_normalize_into};

/// Minimum number of candidates before dispatching to the parallel scan.
#[cfg(feature = "parallel")]
const MIN_PARALLEL_CANDIDATES: usize = 4096;

/// Receives scan progress. Purely informational: nothing it does can change
/// the result of a scan.
///
/// `current` is the number of candidates scored so far and `total` the number
/// of candidates in the scan. In the parallel scan calls arrive from worker
/// threads and `current` values may be observed out of order.
pub trait ProgressObserver: Sync {
    fn on_progress(&self, current: usize, total: usize);
}

impl<F> ProgressObserver for F
where
    F: Fn(usize, usize) + Sync,
{
    fn on_progress(&self, current: usize, total: usize) {
        self(current, total)
    }
}

/// Observer that discards all progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    #[inline]
    fn on_progress(&self, _current: usize, _total: usize) {}
}

/// Shared flag for cooperative cancellation of a running scan.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[inline]
fn check_cancel(cancel: Option<&CancelFlag>) -> Result<()> {
    match cancel {
        Some(flag) if flag.is_cancelled() => Err(Error::Cancelled),
        _ => Ok(()),
    }
}

/// Find the windows most similar in normalized shape to the query window
/// `[start, start + config.window)`.
///
/// Candidates are every offset `i < start - window`, i.e. windows that end at
/// least one full window before the query begins; a query too close to the
/// start of the series has no candidates and yields an empty result. Each
/// candidate is scored `1 / (1 + d)` where `d` is the Euclidean distance
/// between the z-normalized query and candidate, and the `config.keep` best
/// are returned, highest score first, lower offset first among equal scores.
///
/// Candidates whose score is NaN (non-finite prices in either window) are
/// skipped.
pub fn find_similar(
    series: &Series,
    start: usize,
    config: &MatchConfig,
    observer: &dyn ProgressObserver,
    cancel: Option<&CancelFlag>,
) -> Result<MatchResult> {
    config.validate(start, series.len())?;
    let window = config.window;
    let total = config.candidate_count(start, series.len());
    if total == 0 {
        tracing::debug!(start, window, "no candidate windows precede the query");
        return Ok(MatchResult::empty(start, window));
    }

    let target = z_normalize(series.slice(start, window)?);
    tracing::debug!(start, window, keep = config.keep, total, "scanning candidates");
    observer.on_progress(0, total);

    #[cfg(feature = "parallel")]
    if total >= MIN_PARALLEL_CANDIDATES {
        let top = scan_parallel(series, &target, total, config, observer, cancel)?;
        return Ok(finish(start, window, total, top));
    }

    let top = scan_range(series, &target, 0, total, config, cancel, |done| {
        observer.on_progress(done, total)
    })?;
    Ok(finish(start, window, total, top))
}

fn finish(start: usize, window: usize, total: usize, top: TopK) -> MatchResult {
    let matches = top.into_sorted_vec();
    if let Some(best) = matches.first() {
        tracing::debug!(
            best_offset = best.offset,
            best_score = best.score,
            kept = matches.len(),
            "scan finished"
        );
    }
    MatchResult {
        start,
        window,
        candidates: total,
        matches,
    }
}

/// Score the candidates in `[lo, hi)` into a local top-k.
///
/// `on_done` runs after each candidate with the number of candidates this
/// call has scored.
fn scan_range(
    series: &Series,
    target: &[f64],
    lo: usize,
    hi: usize,
    config: &MatchConfig,
    cancel: Option<&CancelFlag>,
    mut on_done: impl FnMut(usize),
) -> Result<TopK> {
    let window = config.window;
    let mut top = TopK::new(config.keep);
    let mut buf = vec![0.0; window];

    for (n, i) in (lo..hi).enumerate() {
        check_cancel(cancel)?;
        let candidate = series.slice(i, window)?;
        z_normalize_into(candidate, &mut buf);
        let score = similarity(euclidean(target, &buf));
        if !score.is_nan() {
            top.update(i, score);
        }
        on_done(n + 1);
    }

    Ok(top)
}

/// Split `[0, n_items)` into at most `n_chunks` contiguous ranges of near-equal size.
#[cfg(feature = "parallel")]
pub(crate) fn chunk_ranges(n_items: usize, n_chunks: usize) -> Vec<(usize, usize)> {
    if n_items == 0 || n_chunks == 0 {
        return vec![];
    }
    let n_chunks = n_chunks.min(n_items);
    let base = n_items / n_chunks;
    let extra = n_items % n_chunks;

    let mut ranges = Vec::with_capacity(n_chunks);
    let mut prev = 0;
    for c in 0..n_chunks {
        let end = prev + base + usize::from(c < extra);
        ranges.push((prev, end));
        prev = end;
    }
    ranges
}

/// Parallel scan: each chunk keeps a local top-k, merged at the end.
///
/// The merge uses the same total order as the serial scan, so results are
/// identical to [`find_similar`] run without the `parallel` feature.
#[cfg(feature = "parallel")]
fn scan_parallel(
    series: &Series,
    target: &[f64],
    total: usize,
    config: &MatchConfig,
    observer: &dyn ProgressObserver,
    cancel: Option<&CancelFlag>,
) -> Result<TopK> {
    use rayon::prelude::*;
    use std::sync::atomic::AtomicUsize;

    // Several chunks per thread so progress stays smooth
    let n_chunks = rayon::current_num_threads() * 4;
    let ranges = chunk_ranges(total, n_chunks);
    let done = AtomicUsize::new(0);

    let partials: Vec<TopK> = ranges
        .into_par_iter()
        .map(|(lo, hi)| {
            scan_range(series, target, lo, hi, config, cancel, |_| {
                let current = done.fetch_add(1, Ordering::Relaxed) + 1;
                observer.on_progress(current, total);
            })
        })
        .collect::<Result<_>>()?;

    let mut combined = TopK::new(config.keep);
    for partial in &partials {
        combined.merge(partial);
    }
    Ok(combined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::match_result::MatchCandidate;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    fn series_from(prices: Vec<f32>) -> Series {
        let timestamps = (0..prices.len() as i64).map(|i| 1_600_000_000 + 60 * i).collect();
        Series::from_parts(timestamps, prices).unwrap()
    }

    fn sine(n: usize, period: f64) -> Series {
        series_from(
            (0..n)
                .map(|i| (i as f64 * 2.0 * std::f64::consts::PI / period).sin() as f32)
                .collect(),
        )
    }

    /// Reference scan that scores every candidate and fully sorts.
    fn brute_force(series: &Series, start: usize, window: usize, keep: usize) -> Vec<MatchCandidate> {
        let target = series.slice(start, window).unwrap();
        let mut all: Vec<MatchCandidate> = (0..start.saturating_sub(window))
            .map(|i| MatchCandidate {
                offset: i,
                score: crate::metrics::zscore::window_similarity(
                    target,
                    series.slice(i, window).unwrap(),
                ),
            })
            .collect();
        all.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.offset.cmp(&b.offset)));
        all.truncate(keep);
        all
    }

    #[test]
    fn test_matches_brute_force() {
        let prices: Vec<f32> = (0..300)
            .map(|i| ((i as f32 * 0.17).sin() + (i as f32 * 0.031).cos() * 0.5) * 10.0 + 100.0)
            .collect();
        let series = series_from(prices);
        let config = MatchConfig::new(20, 7);
        let res = find_similar(&series, 250, &config, &NoProgress, None).unwrap();
        assert_eq!(res.candidates, 230);
        assert_eq!(res.matches, brute_force(&series, 250, 20, 7));
    }

    #[test]
    fn test_periodic_match_scores_one() {
        let series = sine(240, 60.0);
        let config = MatchConfig::new(60, 5);
        let res = find_similar(&series, 150, &config, &NoProgress, None).unwrap();

        assert_eq!(res.candidates, 90);
        assert_eq!(res.len(), 5);
        let best = res.best().unwrap();
        assert_eq!(best.offset, 30);
        assert!(best.score > 0.999, "score {}", best.score);
        assert!(res.iter().all(|c| c.offset < 90));
    }

    #[test]
    fn test_empty_when_query_near_start() {
        let series = sine(100, 10.0);
        let config = MatchConfig::new(20, 3);
        for start in [0, 5, 19, 20] {
            let res = find_similar(&series, start, &config, &NoProgress, None).unwrap();
            assert!(res.is_empty(), "start={start} should have no candidates");
            assert_eq!(res.candidates, 0);
        }
        let res = find_similar(&series, 21, &config, &NoProgress, None).unwrap();
        assert_eq!(res.len(), 1);
        assert_eq!(res.matches[0].offset, 0);
    }

    #[test]
    fn test_invalid_arguments() {
        let series = sine(50, 10.0);
        let bad = [
            (MatchConfig::new(0, 3), 10),
            (MatchConfig::new(5, 0), 10),
            (MatchConfig::new(10, 3), 41),
        ];
        for (cfg, start) in bad {
            let err = find_similar(&series, start, &cfg, &NoProgress, None).unwrap_err();
            assert!(matches!(err, Error::InvalidArgument(_)), "{cfg:?}: {err:?}");
        }
    }

    #[test]
    fn test_progress_reports_every_candidate() {
        let series = sine(120, 12.0);
        let config = MatchConfig::new(10, 3);
        let calls = Mutex::new(Vec::new());
        let observer = |cur: usize, total: usize| calls.lock().unwrap().push((cur, total));

        let res = find_similar(&series, 100, &config, &observer, None).unwrap();
        let silent = find_similar(&series, 100, &config, &NoProgress, None).unwrap();
        assert_eq!(res, silent);

        let calls = calls.into_inner().unwrap();
        assert_eq!(calls.first(), Some(&(0, 90)));
        assert_eq!(calls.last(), Some(&(90, 90)));
        assert_eq!(calls.len(), 91);
    }

    #[test]
    fn test_cancelled_scan_returns_error() {
        let series = sine(200, 25.0);
        let config = MatchConfig::new(20, 3);
        let flag = CancelFlag::new();
        flag.cancel();
        let err = find_similar(&series, 150, &config, &NoProgress, Some(&flag)).unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }

    #[test]
    fn test_cancel_from_observer() {
        let series = sine(200, 25.0);
        let config = MatchConfig::new(20, 3);
        let flag = CancelFlag::new();
        let seen = AtomicUsize::new(0);
        let observer = |cur: usize, _total: usize| {
            seen.fetch_max(cur, Ordering::Relaxed);
            if cur == 10 {
                flag.cancel();
            }
        };
        let err = find_similar(&series, 150, &config, &observer, Some(&flag)).unwrap_err();
        assert!(matches!(err, Error::Cancelled));
        assert_eq!(seen.load(Ordering::Relaxed), 10);
    }

    #[test]
    fn test_constant_series() {
        let series = series_from(vec![3.25; 40]);
        let config = MatchConfig::new(5, 4);
        let res = find_similar(&series, 30, &config, &NoProgress, None).unwrap();
        // every candidate ties at 1.0; lowest offsets win
        let offsets: Vec<usize> = res.iter().map(|c| c.offset).collect();
        assert_eq!(offsets, vec![0, 1, 2, 3]);
        assert!(res.iter().all(|c| c.score == 1.0));
    }

    #[test]
    fn test_nan_candidates_skipped() {
        let mut prices: Vec<f32> = (0..60).map(|i| (i as f32 * 0.4).sin()).collect();
        prices[3] = f32::NAN;
        let series = series_from(prices);
        let config = MatchConfig::new(5, 50);
        let res = find_similar(&series, 50, &config, &NoProgress, None).unwrap();
        assert_eq!(res.candidates, 45);
        // windows starting at 0..=3 contain the NaN
        assert_eq!(res.len(), 41);
        assert!(res.iter().all(|c| c.offset > 3));
        assert!(res.iter().all(|c| c.score > 0.0 && c.score <= 1.0));
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_chunk_ranges_cover_everything() {
        let ranges = chunk_ranges(10, 3);
        assert_eq!(ranges, vec![(0, 4), (4, 7), (7, 10)]);
        assert_eq!(chunk_ranges(2, 8), vec![(0, 1), (1, 2)]);
        assert!(chunk_ranges(0, 4).is_empty());
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_identical_to_serial() {
        let prices: Vec<f32> = (0..6000)
            .map(|i| {
                let t = i as f32;
                (t * 0.05).sin() * 3.0 + (t * 0.013).cos() + (t * 1.7).sin() * 0.2
            })
            .collect();
        let series = series_from(prices);
        let config = MatchConfig::new(64, 10);
        let start = 5800;
        let total = config.candidate_count(start, series.len());
        assert!(total >= MIN_PARALLEL_CANDIDATES);

        let target = z_normalize(series.slice(start, 64).unwrap());
        let serial = scan_range(&series, &target, 0, total, &config, None, |_| {})
            .unwrap()
            .into_sorted_vec();
        let parallel = find_similar(&series, start, &config, &NoProgress, None).unwrap();
        assert_eq!(parallel.matches, serial);

        let progress_max = AtomicUsize::new(0);
        let observer = |cur: usize, _t: usize| {
            progress_max.fetch_max(cur, Ordering::Relaxed);
        };
        find_similar(&series, start, &config, &observer, None).unwrap();
        assert_eq!(progress_max.load(Ordering::Relaxed), total);
    }
}
