//! Greedy minimum-separation suppression of correlation peaks.

use std::cmp::Ordering;

use crate::peaks::Peak;
use crate::util::{CorrError, CorrResult};

fn rank_desc(a: &(Peak, f32), b: &(Peak, f32)) -> Ordering {
    b.1.total_cmp(&a.1).then_with(|| a.0.index.cmp(&b.0.index))
}

fn suppress(mut ranked: Vec<(Peak, f32)>, min_separation: usize) -> Vec<Peak> {
    // Highest weight first; ties prefer the lower index, matching the
    // peak finder's tie-break.
    ranked.sort_by(rank_desc);

    let mut kept: Vec<Peak> = Vec::new();
    'outer: for (peak, _) in ranked {
        for k in &kept {
            if k.index.abs_diff(peak.index) <= min_separation {
                continue 'outer;
            }
        }
        kept.push(peak);
    }

    kept.sort_by_key(|p| p.index);
    kept
}

/// Suppresses peaks within `min_separation` samples of a stronger peak.
///
/// Repeatedly selects the remaining highest-value peak, keeps it, and drops
/// every remaining peak whose index lies within `min_separation` of it. The
/// result is ordered by index ascending and does not depend on the input
/// ordering. With `min_separation == 0` only index collisions suppress, so
/// distinct peaks all survive.
pub fn decluster(peaks: &[Peak], min_separation: usize) -> Vec<Peak> {
    let ranked = peaks.iter().map(|&p| (p, p.value)).collect();
    suppress(ranked, min_separation)
}

/// [`decluster`] with caller-supplied ranking weights (e.g. absolute values,
/// so strong negative excursions compete with positive ones). `weights[i]`
/// ranks `peaks[i]`; the emitted peaks keep their original values.
pub fn decluster_weighted(
    peaks: &[Peak],
    min_separation: usize,
    weights: &[f32],
) -> CorrResult<Vec<Peak>> {
    if weights.len() != peaks.len() {
        return Err(CorrError::WeightsMismatch {
            weights: weights.len(),
            peaks: peaks.len(),
        });
    }
    let ranked = peaks.iter().copied().zip(weights.iter().copied()).collect();
    Ok(suppress(ranked, min_separation))
}

#[cfg(test)]
mod tests {
    use super::{decluster, decluster_weighted};
    use crate::peaks::Peak;
    use crate::util::CorrError;

    fn peak(index: usize, value: f32) -> Peak {
        Peak { index, value }
    }

    #[test]
    fn weaker_peak_within_window_is_dropped() {
        let peaks = [peak(1, 0.9), peak(3, 0.95)];
        let kept = decluster(&peaks, 2);
        assert_eq!(kept, vec![peak(3, 0.95)]);
    }

    #[test]
    fn result_is_ordered_by_index() {
        let peaks = [peak(40, 0.7), peak(5, 0.9), peak(22, 0.99)];
        let kept = decluster(&peaks, 3);
        let indices: Vec<usize> = kept.iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![5, 22, 40]);
    }

    #[test]
    fn independent_of_input_ordering() {
        let mut peaks = vec![
            peak(10, 0.5),
            peak(12, 0.8),
            peak(30, 0.6),
            peak(33, 0.55),
            peak(50, 0.4),
        ];
        let forward = decluster(&peaks, 4);
        peaks.reverse();
        let backward = decluster(&peaks, 4);
        assert_eq!(forward, backward);
    }

    #[test]
    fn idempotent_for_fixed_separation() {
        let peaks = [peak(2, 0.9), peak(9, 0.7), peak(11, 0.8), peak(25, 0.6)];
        let once = decluster(&peaks, 3);
        let twice = decluster(&once, 3);
        assert_eq!(once, twice);
    }

    #[test]
    fn kept_count_shrinks_as_separation_grows() {
        let peaks: Vec<Peak> = (0..10).map(|i| peak(i * 3, 0.5 + i as f32 * 0.01)).collect();
        let mut previous = usize::MAX;
        for sep in [0usize, 2, 4, 8, 16, 32] {
            let kept = decluster(&peaks, sep).len();
            assert!(kept <= previous, "separation {sep}");
            previous = kept;
        }
    }

    #[test]
    fn value_ties_prefer_the_lower_index() {
        let peaks = [peak(8, 0.9), peak(5, 0.9)];
        let kept = decluster(&peaks, 10);
        assert_eq!(kept, vec![peak(5, 0.9)]);
    }

    #[test]
    fn zero_separation_keeps_distinct_indices() {
        let peaks = [peak(3, 0.6), peak(4, 0.5)];
        assert_eq!(decluster(&peaks, 0).len(), 2);
    }

    #[test]
    fn weights_can_rank_by_magnitude() {
        let peaks = [peak(10, -0.95), peak(12, 0.6)];
        let weights = [0.95f32, 0.6];
        let kept = decluster_weighted(&peaks, 5, &weights).unwrap();
        // The strong negative excursion wins under absolute-value ranking.
        assert_eq!(kept, vec![peak(10, -0.95)]);
    }

    #[test]
    fn mismatched_weights_are_rejected() {
        let peaks = [peak(1, 0.5)];
        assert_eq!(
            decluster_weighted(&peaks, 1, &[]).unwrap_err(),
            CorrError::WeightsMismatch {
                weights: 0,
                peaks: 1
            }
        );
    }
}
