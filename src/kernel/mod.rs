//! Correlation kernel implementations.
//!
//! Two kernels produce the same normalized cross-correlation trace: a direct
//! time-domain sweep and an FFT-based path using the correlation theorem.
//! Both normalize with the shared [`WindowStats`], so flagged windows agree
//! exactly between them.

use crate::stats::{WindowFlag, WindowStats};

pub(crate) mod spectral;
pub(crate) mod time;

/// Which correlation kernel to run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Strategy {
    /// Pick per call from an operation-count estimate.
    #[default]
    Auto,
    /// Direct O(C·T) sliding correlation.
    TimeDomain,
    /// FFT-based correlation via the correlation theorem.
    Spectral,
}

/// Numeric health of one correlation trace.
///
/// Degenerate windows hold a defined 0, non-finite windows hold a NaN
/// sentinel; callers must check these counts before trusting such entries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CorrStatus {
    /// Windows pinned to 0 because the channel variance was effectively zero.
    pub degenerate: usize,
    /// Windows computed from numerically suspect (near-zero) variance.
    pub suspect: usize,
    /// Windows overlapping non-finite samples, holding the NaN sentinel.
    pub non_finite: usize,
}

impl CorrStatus {
    /// True when every window was well-conditioned.
    pub fn is_clean(&self) -> bool {
        self.degenerate == 0 && self.suspect == 0 && self.non_finite == 0
    }
}

/// One normalized cross-correlation trace with its status.
#[derive(Clone, Debug, PartialEq)]
pub struct Correlation {
    /// One coefficient per channel offset, `C − T + 1` entries. Values may
    /// exceed [−1, 1] slightly from floating rounding.
    pub values: Vec<f32>,
    /// Per-trace counts of flagged windows.
    pub status: CorrStatus,
}

/// Turns raw dot products `Σ t′ⱼ·x[i+j]` into normalized coefficients,
/// substituting 0 for degenerate windows and NaN for non-finite ones.
pub(crate) fn normalize(
    raw: impl Iterator<Item = f64>,
    template_norm: f64,
    stats: &WindowStats,
) -> Correlation {
    let mut values = Vec::with_capacity(stats.len());
    let mut status = CorrStatus::default();
    for (idx, dot) in raw.enumerate() {
        match stats.flag(idx) {
            WindowFlag::NonFinite => {
                values.push(f32::NAN);
                status.non_finite += 1;
            }
            WindowFlag::Degenerate => {
                values.push(0.0);
                status.degenerate += 1;
            }
            flag => {
                if flag == WindowFlag::Suspect {
                    status.suspect += 1;
                }
                values.push((dot * stats.inv_norm(idx) / template_norm) as f32);
            }
        }
    }
    Correlation { values, status }
}
