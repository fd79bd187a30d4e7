//! Standard-score normalization and the similarity transform.
//!
//! Windows are widened from `f32` to `f64` before any arithmetic. Distances are
//! plain Euclidean distances between two normalized windows, turned into a
//! bounded similarity with `1 / (1 + d)`.
//!
//! Edge cases:
//! - A constant window (standard deviation zero, up to [`CONSTANT_TOLERANCE`]
//!   relative to its mean magnitude) normalizes to the all-zero vector.
//! - Two constant windows → d = 0, score = 1.
//! - Constant vs. varying window of length m → d = sqrt(m).

/// Relative tolerance below which a window's standard deviation is treated as zero.
pub const CONSTANT_TOLERANCE: f64 = 1e-12;

/// Mean and population standard deviation of one window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowStats {
    pub mean: f64,
    pub std: f64,
}

impl WindowStats {
    /// Two-pass mean and population standard deviation.
    pub fn of(window: &[f32]) -> Self {
        if window.is_empty() {
            return Self { mean: 0.0, std: 0.0 };
        }
        let n = window.len() as f64;
        let mean = window.iter().map(|&x| x as f64).sum::<f64>() / n;
        let var = window
            .iter()
            .map(|&x| {
                let d = x as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / n;
        Self {
            mean,
            std: var.sqrt(),
        }
    }

    /// Whether the window has no usable spread.
    #[inline]
    pub fn is_constant(&self) -> bool {
        self.std <= CONSTANT_TOLERANCE * self.mean.abs().max(1.0)
    }
}

/// Z-normalize `window` into `out`, which must have the same length.
///
/// Constant windows produce all zeros.
pub fn z_normalize_into(window: &[f32], out: &mut [f64]) {
    debug_assert_eq!(window.len(), out.len());
    let stats = WindowStats::of(window);
    if stats.is_constant() {
        out.fill(0.0);
        return;
    }
    let inv = 1.0 / stats.std;
    for (o, &x) in out.iter_mut().zip(window) {
        *o = (x as f64 - stats.mean) * inv;
    }
}

/// Z-normalize `window` into a freshly allocated vector.
pub fn z_normalize(window: &[f32]) -> Vec<f64> {
    let mut out = vec![0.0; window.len()];
    z_normalize_into(window, &mut out);
    out
}

/// Euclidean distance between two equal-length vectors.
#[inline]
pub fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

/// Map a distance in `[0, inf)` to a similarity in `(0, 1]`.
#[inline]
pub fn similarity(distance: f64) -> f64 {
    1.0 / (1.0 + distance)
}

/// Similarity between two raw windows of equal length.
pub fn window_similarity(a: &[f32], b: &[f32]) -> f64 {
    similarity(euclidean(&z_normalize(a), &z_normalize(b)))
}
