//! Peak extraction from correlation traces.

mod decluster;

pub use decluster::{decluster, decluster_weighted};

/// One local maximum of a correlation trace.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Peak {
    /// Offset into the correlation vector.
    pub index: usize,
    /// Correlation value at that offset.
    pub value: f32,
}

/// Finds strict local maxima above `threshold`, ordered by index ascending.
///
/// A sample is a peak when it exceeds both immediate neighbors; boundary
/// samples compare only against their single neighbor. A flat run at the top
/// yields its first index. A constant vector has no local maximum. Non-finite
/// values (the NaN sentinel for contaminated windows) compare as −∞ and are
/// never peaks themselves.
pub fn find_peaks(values: &[f32], threshold: f32) -> Vec<Peak> {
    let n = values.len();
    let val = |i: usize| -> f32 {
        let v = values[i];
        if v.is_finite() {
            v
        } else {
            f32::NEG_INFINITY
        }
    };

    let mut peaks = Vec::new();
    let mut i = 0;
    while i < n {
        let v = val(i);
        let mut j = i + 1;
        while j < n && val(j) == v {
            j += 1;
        }
        let left_lower = i == 0 || val(i - 1) < v;
        let right_lower = j == n || val(j) < v;
        let spans_everything = n > 1 && j - i == n;
        if v.is_finite() && v > threshold && left_lower && right_lower && !spans_everything {
            peaks.push(Peak {
                index: i,
                value: values[i],
            });
        }
        i = j;
    }
    peaks
}
