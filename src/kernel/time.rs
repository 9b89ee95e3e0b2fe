//! Direct time-domain correlation kernel.
//!
//! Reference implementation: exact up to floating rounding, O(C·T). The
//! orchestrator prefers it for short signals where transform setup would
//! dominate, and tests hold the spectral kernel to its output.

use crate::kernel::{normalize, Correlation};
use crate::stats::{WindowFlag, WindowStats};
use crate::template::TemplatePlan;

/// Correlates one template against one channel offset by offset.
///
/// The Pearson numerator reduces to the dot product of the zero-mean
/// template with the raw window, since the zero-mean template sums to zero.
/// Flagged windows skip the dot product entirely; `normalize` substitutes
/// their defined values.
pub(crate) fn correlate_time(
    tpl: &TemplatePlan,
    channel: &[f32],
    stats: &WindowStats,
) -> Correlation {
    let t = tpl.len();
    let zero_mean = tpl.zero_mean();
    let raw = (0..stats.len()).map(|i| match stats.flag(i) {
        WindowFlag::Ok | WindowFlag::Suspect => {
            let mut dot = 0.0f64;
            for (j, &tv) in zero_mean.iter().enumerate() {
                dot += tv as f64 * channel[i + j] as f64;
            }
            debug_assert!(i + t <= channel.len());
            dot
        }
        _ => 0.0,
    });
    normalize(raw, tpl.norm(), stats)
}
