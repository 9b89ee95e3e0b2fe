//! Single-pair orchestration: shape validation, strategy selection, and
//! optional peak extraction on top of a correlation trace.

use crate::kernel::spectral::SpectralCorrelator;
use crate::kernel::time::correlate_time;
use crate::kernel::{Correlation, CorrStatus, Strategy};
use crate::peaks::{decluster, find_peaks, Peak};
use crate::stats::{WindowStats, ACCEPTED_DIFF, WARN_DIFF};
use crate::template::TemplatePlan;
use crate::trace::{trace_event, trace_span};
use crate::util::{CorrError, CorrResult};

/// Configuration for one correlation call.
///
/// The variance floors default to the documented magnitudes; overriding them
/// changes which windows are zeroed or flagged, so they are part of the
/// observable contract.
#[derive(Clone, Copy, Debug)]
pub struct CorrConfig {
    /// Kernel to run, or [`Strategy::Auto`] to pick per call.
    pub strategy: Strategy,
    /// Variance sum at or below this pins the window's correlation to 0.
    pub accepted_diff: f64,
    /// Variance sum at or below this flags the window as suspect.
    pub warn_diff: f64,
}

impl Default for CorrConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Auto,
            accepted_diff: ACCEPTED_DIFF,
            warn_diff: WARN_DIFF,
        }
    }
}

/// Picks a kernel from an operation-count estimate: the direct sweep costs
/// about `T·(C−T+1)` multiplies, the spectral path three transforms of the
/// padded length. Short signals stay in the time domain where transform
/// setup would dominate.
pub(crate) fn select_strategy(template_len: usize, channel_len: usize) -> Strategy {
    let windows = channel_len - template_len + 1;
    let direct = (template_len * windows) as f64;
    let fft_len = (channel_len + template_len - 1).next_power_of_two().max(2);
    let spectral = 3.0 * fft_len as f64 * (fft_len as f64).log2();
    if direct > spectral {
        Strategy::Spectral
    } else {
        Strategy::TimeDomain
    }
}

/// All-zero trace for a degenerate (constant) template: the correlation is
/// undefined at every offset, so every window is pinned and counted.
pub(crate) fn degenerate_trace(windows: usize) -> Correlation {
    Correlation {
        values: vec![0.0; windows],
        status: CorrStatus {
            degenerate: windows,
            suspect: 0,
            non_finite: 0,
        },
    }
}

/// Fails the pair when no window produced a real coefficient.
pub(crate) fn reject_all_non_finite(corr: Correlation) -> CorrResult<Correlation> {
    if !corr.values.is_empty() && corr.status.non_finite == corr.values.len() {
        return Err(CorrError::AllWindowsNonFinite {
            windows: corr.values.len(),
        });
    }
    Ok(corr)
}

/// Correlates one template against one channel.
///
/// Returns one coefficient per channel offset (`C − T + 1` values) plus the
/// trace status. Shape violations (empty inputs, template longer than the
/// channel) and a fully contaminated channel fail the call; variance
/// degeneracies are absorbed into the values and the status instead.
pub fn correlate_one(
    template: &[f32],
    channel: &[f32],
    cfg: &CorrConfig,
) -> CorrResult<Correlation> {
    let plan = TemplatePlan::new(template)?;
    let stats = WindowStats::compute(channel, plan.len(), cfg.accepted_diff, cfg.warn_diff)?;

    let _span = trace_span!(
        "correlate_one",
        template_len = plan.len(),
        channel_len = channel.len()
    )
    .entered();

    if plan.is_degenerate() {
        return Ok(degenerate_trace(stats.len()));
    }

    let strategy = match cfg.strategy {
        Strategy::Auto => select_strategy(plan.len(), channel.len()),
        explicit => explicit,
    };
    trace_event!("strategy_selected", spectral = strategy == Strategy::Spectral);

    let corr = match strategy {
        Strategy::Spectral => {
            let mut spectral = SpectralCorrelator::new();
            spectral.correlate(&plan, 0, channel, &stats)?
        }
        _ => correlate_time(&plan, channel, &stats),
    };
    reject_all_non_finite(corr)
}

/// Correlates, then extracts peaks above `threshold` and declusters them to
/// a minimum separation of `min_separation` samples.
pub fn detect(
    template: &[f32],
    channel: &[f32],
    cfg: &CorrConfig,
    threshold: f32,
    min_separation: usize,
) -> CorrResult<Vec<Peak>> {
    let corr = correlate_one(template, channel, cfg)?;
    let peaks = find_peaks(&corr.values, threshold);
    Ok(decluster(&peaks, min_separation))
}

#[cfg(test)]
mod tests {
    use super::{correlate_one, detect, select_strategy, CorrConfig};
    use crate::kernel::Strategy;
    use crate::util::CorrError;

    #[test]
    fn equal_lengths_give_full_sequence_pearson() {
        let template = [1.0f32, 2.0, 3.0, 4.0];
        let channel = [1.5f32, 2.5, 3.5, 4.5];
        let corr = correlate_one(&template, &channel, &CorrConfig::default()).unwrap();
        assert_eq!(corr.values.len(), 1);
        // Affine shift of the same ramp: perfectly correlated.
        assert!((corr.values[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn template_longer_than_channel_is_a_shape_error() {
        let err = correlate_one(&[1.0, 2.0, 3.0], &[1.0, 2.0], &CorrConfig::default());
        assert_eq!(
            err.unwrap_err(),
            CorrError::TemplateTooLong {
                template: 3,
                channel: 2
            }
        );
    }

    #[test]
    fn constant_template_yields_pinned_zeros() {
        let channel: Vec<f32> = (0..16).map(|i| i as f32).collect();
        let corr = correlate_one(&[5.0; 4], &channel, &CorrConfig::default()).unwrap();
        assert!(corr.values.iter().all(|&v| v == 0.0));
        assert_eq!(corr.status.degenerate, corr.values.len());
    }

    #[test]
    fn fully_contaminated_channel_fails_the_pair() {
        let channel = [f32::NAN; 8];
        let err = correlate_one(&[1.0, 2.0, 1.0], &channel, &CorrConfig::default()).unwrap_err();
        assert_eq!(err, CorrError::AllWindowsNonFinite { windows: 6 });
    }

    #[test]
    fn single_length_template_does_not_crash_spectral_setup() {
        let channel: Vec<f32> = (0..32).map(|i| (i as f32).sin()).collect();
        let cfg = CorrConfig {
            strategy: Strategy::Spectral,
            ..CorrConfig::default()
        };
        // A one-sample window has zero variance everywhere; the trace is
        // pinned to zeros rather than touching the transform.
        let corr = correlate_one(&[1.0], &channel, &cfg).unwrap();
        assert_eq!(corr.values.len(), channel.len());
        assert!(corr.values.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn auto_prefers_time_domain_for_short_signals() {
        assert_eq!(select_strategy(4, 16), Strategy::TimeDomain);
        assert_eq!(select_strategy(200, 10_000), Strategy::Spectral);
    }

    #[test]
    fn detect_wires_peaks_and_decluster() {
        let template = [0.0f32, 1.0, 0.0];
        let mut channel = vec![0.0f32; 32];
        channel[10] = 1.0;
        channel[11] = 0.2;
        channel[20] = 1.0;

        let peaks = detect(&template, &channel, &CorrConfig::default(), 0.8, 4).unwrap();
        let indices: Vec<usize> = peaks.iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![9, 19]);
    }
}
