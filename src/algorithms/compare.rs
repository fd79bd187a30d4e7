use serde::Serialize;

use crate::core::series::Series;
use crate::error::{Error, Result};
use crate::metrics::zscore::{euclidean, similarity, z_normalize};

/// Side-by-side view of a query window and one match.
///
/// Holds what a chart of the pair needs: both windows normalized (to overlay
/// their shapes) and each window's raw prices followed by `horizon` further
/// window lengths (to see what came next). Rendering is left to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub reference: usize,
    pub candidate: usize,
    pub window: usize,
    pub score: f64,
    pub reference_normalized: Vec<f64>,
    pub candidate_normalized: Vec<f64>,
    /// Raw prices from `reference`, truncated at the end of the series.
    pub reference_raw: Vec<f32>,
    /// Raw prices from `candidate`, truncated at the end of the series.
    pub candidate_raw: Vec<f32>,
}

/// Build a [`Comparison`] of the windows at `reference` and `candidate`.
///
/// Both windows must lie inside the series. The raw runs cover
/// `window * (1 + horizon)` prices, or up to the last observation.
pub fn compare(
    series: &Series,
    reference: usize,
    candidate: usize,
    window: usize,
    horizon: usize,
) -> Result<Comparison> {
    if window == 0 {
        return Err(Error::InvalidArgument("window length must be > 0".into()));
    }
    let ref_window = series.slice(reference, window)?;
    let cand_window = series.slice(candidate, window)?;

    let reference_normalized = z_normalize(ref_window);
    let candidate_normalized = z_normalize(cand_window);
    let score = similarity(euclidean(&reference_normalized, &candidate_normalized));

    let span = window.saturating_mul(horizon.saturating_add(1));
    let extended = |offset: usize| -> Vec<f32> {
        let len = span.min(series.len() - offset);
        series.prices()[offset..offset + len].to_vec()
    };

    Ok(Comparison {
        reference,
        candidate,
        window,
        score,
        reference_normalized,
        candidate_normalized,
        reference_raw: extended(reference),
        candidate_raw: extended(candidate),
    })
}
