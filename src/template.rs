//! Template plan precomputation.
//!
//! A template's statistics are fixed for the whole correlation, so the mean,
//! zero-mean buffer, and norm are computed once and shared by both kernels.

use crate::util::{CorrError, CorrResult};

/// Precomputed statistics and zero-mean buffer for one template.
#[derive(Debug)]
pub struct TemplatePlan {
    mean: f32,
    norm: f64,
    zero_mean: Vec<f32>,
}

impl TemplatePlan {
    /// Builds a plan from raw template samples.
    ///
    /// Non-finite samples are rejected: a contaminated template would spoil
    /// every window of every channel it touches. A constant template is
    /// accepted but marked degenerate; correlating it yields all zeros with
    /// every window counted degenerate in the status.
    pub fn new(samples: &[f32]) -> CorrResult<Self> {
        if samples.is_empty() {
            return Err(CorrError::EmptyInput {
                context: "template",
            });
        }
        if samples.iter().any(|v| !v.is_finite()) {
            return Err(CorrError::NonFiniteInput {
                context: "template",
            });
        }

        let len_f = samples.len() as f64;
        let mut sum = 0.0f64;
        let mut sum_sq = 0.0f64;
        for &v in samples {
            let x = v as f64;
            sum += x;
            sum_sq += x * x;
        }
        let mean = sum / len_f;
        let var_sum = (sum_sq - sum * sum / len_f).max(0.0);

        let zero_mean = samples.iter().map(|&v| (v as f64 - mean) as f32).collect();
        Ok(Self {
            mean: mean as f32,
            norm: var_sum.sqrt(),
            zero_mean,
        })
    }

    /// Template length in samples.
    pub fn len(&self) -> usize {
        self.zero_mean.len()
    }

    /// True for the (invalid for correlation) empty template.
    pub fn is_empty(&self) -> bool {
        self.zero_mean.is_empty()
    }

    /// Mean of the template samples.
    pub fn mean(&self) -> f32 {
        self.mean
    }

    /// `sqrt(Σ (t − mean)²)`, the normalization constant of the template side.
    pub fn norm(&self) -> f64 {
        self.norm
    }

    /// True when the template has effectively zero variance.
    pub fn is_degenerate(&self) -> bool {
        self.norm <= crate::stats::ACCEPTED_DIFF.sqrt()
    }

    /// Zero-mean template samples.
    pub fn zero_mean(&self) -> &[f32] {
        &self.zero_mean
    }
}
