//! Sliding-window statistics over channel signals.
//!
//! Both correlation kernels normalize by the moving mean and standard
//! deviation of the channel window. Computing those from the same
//! running-sum pass guarantees the two kernels agree exactly on which
//! windows are degenerate, suspect, or contaminated by non-finite samples.

use crate::util::{CorrError, CorrResult};

/// Variance sum at or below this is treated as zero signal; the correlation
/// at that offset is a defined 0 rather than a division by near-zero.
pub const ACCEPTED_DIFF: f64 = 1e-15;

/// Variance sum at or below this is computed but flagged as numerically
/// suspect so callers can surface a warning without aborting.
pub const WARN_DIFF: f64 = 1e-10;

/// Classification of one correlation window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowFlag {
    /// Window statistics are well-conditioned.
    Ok,
    /// Variance is above the accepted floor but low enough to distrust.
    Suspect,
    /// Variance is effectively zero; the correlation is pinned to 0.
    Degenerate,
    /// The window overlaps NaN or infinite samples; the correlation value is
    /// a NaN sentinel, never a real coefficient.
    NonFinite,
}

/// Per-window mean, inverse norm, and flag for every offset of a channel.
///
/// The inverse norm is `1 / sqrt(Σx² − (Σx)²/T)` for well-conditioned
/// windows and 0 for degenerate or non-finite ones, so kernels can multiply
/// unconditionally.
pub struct WindowStats {
    window: usize,
    means: Vec<f64>,
    inv_norms: Vec<f64>,
    flags: Vec<WindowFlag>,
}

impl WindowStats {
    /// Computes statistics for every window of `window` samples in `channel`.
    ///
    /// Runs the classic running-sum recurrence: each window's sum and sum of
    /// squares derive from the previous window by adding the incoming sample
    /// and removing the outgoing one. Non-finite samples contribute zero to
    /// the sums (so they cannot poison downstream windows) and flag every
    /// window that overlaps them.
    pub fn compute(
        channel: &[f32],
        window: usize,
        accepted_diff: f64,
        warn_diff: f64,
    ) -> CorrResult<Self> {
        if window == 0 {
            return Err(CorrError::EmptyInput {
                context: "template",
            });
        }
        if channel.is_empty() {
            return Err(CorrError::EmptyInput {
                context: "channel",
            });
        }
        if window > channel.len() {
            return Err(CorrError::TemplateTooLong {
                template: window,
                channel: channel.len(),
            });
        }

        let n = channel.len() - window + 1;
        let mut means = Vec::with_capacity(n);
        let mut inv_norms = Vec::with_capacity(n);
        let mut flags = Vec::with_capacity(n);

        let sanitize = |v: f32| -> (f64, usize) {
            if v.is_finite() {
                (v as f64, 0)
            } else {
                (0.0, 1)
            }
        };

        let mut sum = 0.0f64;
        let mut sum_sq = 0.0f64;
        let mut bad = 0usize;
        for &v in &channel[..window] {
            let (x, b) = sanitize(v);
            sum += x;
            sum_sq += x * x;
            bad += b;
        }

        let len_f = window as f64;
        for i in 0..n {
            if i > 0 {
                let (out, out_bad) = sanitize(channel[i - 1]);
                let (inc, inc_bad) = sanitize(channel[i + window - 1]);
                sum += inc - out;
                sum_sq += inc * inc - out * out;
                bad += inc_bad;
                bad -= out_bad;
            }

            if bad > 0 {
                means.push(0.0);
                inv_norms.push(0.0);
                flags.push(WindowFlag::NonFinite);
                continue;
            }

            let mean = sum / len_f;
            // Rounding can push the variance sum slightly negative.
            let var_sum = (sum_sq - sum * sum / len_f).max(0.0);
            if var_sum <= accepted_diff {
                means.push(mean);
                inv_norms.push(0.0);
                flags.push(WindowFlag::Degenerate);
            } else {
                means.push(mean);
                inv_norms.push(1.0 / var_sum.sqrt());
                flags.push(if var_sum <= warn_diff {
                    WindowFlag::Suspect
                } else {
                    WindowFlag::Ok
                });
            }
        }

        Ok(Self {
            window,
            means,
            inv_norms,
            flags,
        })
    }

    /// Number of windows (`C − T + 1`).
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    /// True when the channel admits no window.
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Window length the statistics were computed for.
    pub fn window(&self) -> usize {
        self.window
    }

    /// Mean of the window starting at `idx`.
    pub fn mean(&self, idx: usize) -> f64 {
        self.means[idx]
    }

    /// Inverse norm of the window starting at `idx` (0 when unusable).
    pub fn inv_norm(&self, idx: usize) -> f64 {
        self.inv_norms[idx]
    }

    /// Flag for the window starting at `idx`.
    pub fn flag(&self, idx: usize) -> WindowFlag {
        self.flags[idx]
    }

    /// All window flags in offset order.
    pub fn flags(&self) -> &[WindowFlag] {
        &self.flags
    }
}
