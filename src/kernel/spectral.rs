//! FFT-based correlation kernel.
//!
//! Cross-correlation is the inverse transform of the product of the channel
//! spectrum with the spectrum of the time-reversed template (for real
//! signals, reversing the template replaces frequency-domain conjugation).
//! Zero-padding both inputs to `L ≥ C + T − 1` keeps circular convolution
//! from wrapping into the offsets we keep.
//!
//! A correlator instance owns its plans and scratch buffers. It re-plans only
//! when the padded length changes and caches the forward template spectrum by
//! a caller-supplied tag, so one template transform serves a whole run of
//! channels. The batch scheduler gives each worker exactly one instance.

use realfft::num_complex::Complex;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use std::sync::Arc;

use crate::kernel::{normalize, Correlation};
use crate::stats::WindowStats;
use crate::template::TemplatePlan;
use crate::util::{CorrError, CorrResult};

struct Workspace {
    fft_len: usize,
    forward: Arc<dyn RealToComplex<f64>>,
    inverse: Arc<dyn ComplexToReal<f64>>,
    time_buf: Vec<f64>,
    signal_spec: Vec<Complex<f64>>,
    template_spec: Vec<Complex<f64>>,
    inverse_out: Vec<f64>,
    scratch_fwd: Vec<Complex<f64>>,
    scratch_inv: Vec<Complex<f64>>,
    loaded_template: Option<usize>,
}

/// Spectral correlator with per-instance plan and buffer ownership.
pub(crate) struct SpectralCorrelator {
    planner: RealFftPlanner<f64>,
    ws: Option<Workspace>,
}

fn transform_err(e: realfft::FftError) -> CorrError {
    CorrError::Transform {
        detail: e.to_string(),
    }
}

impl SpectralCorrelator {
    pub(crate) fn new() -> Self {
        Self {
            planner: RealFftPlanner::new(),
            ws: None,
        }
    }

    fn workspace(&mut self, fft_len: usize) -> &mut Workspace {
        let stale = self.ws.as_ref().map_or(true, |ws| ws.fft_len != fft_len);
        if stale {
            let forward = self.planner.plan_fft_forward(fft_len);
            let inverse = self.planner.plan_fft_inverse(fft_len);
            let scratch_fwd = forward.make_scratch_vec();
            let scratch_inv = inverse.make_scratch_vec();
            self.ws = Some(Workspace {
                fft_len,
                time_buf: forward.make_input_vec(),
                signal_spec: forward.make_output_vec(),
                template_spec: forward.make_output_vec(),
                inverse_out: inverse.make_output_vec(),
                forward,
                inverse,
                scratch_fwd,
                scratch_inv,
                loaded_template: None,
            });
        }
        self.ws.as_mut().expect("workspace just ensured")
    }

    /// Correlates `tpl` against `channel`, normalizing with `stats`.
    ///
    /// `template_tag` identifies the template across calls; passing the same
    /// tag (with the same padded length) reuses the cached template spectrum.
    pub(crate) fn correlate(
        &mut self,
        tpl: &TemplatePlan,
        template_tag: usize,
        channel: &[f32],
        stats: &WindowStats,
    ) -> CorrResult<Correlation> {
        let t = tpl.len();
        let full_len = channel.len() + t - 1;
        let fft_len = full_len.next_power_of_two().max(2);
        let ws = self.workspace(fft_len);

        if ws.loaded_template != Some(template_tag) {
            ws.time_buf.fill(0.0);
            for (slot, &v) in ws.time_buf.iter_mut().zip(tpl.zero_mean().iter().rev()) {
                *slot = v as f64;
            }
            ws.forward
                .process_with_scratch(&mut ws.time_buf, &mut ws.template_spec, &mut ws.scratch_fwd)
                .map_err(transform_err)?;
            ws.loaded_template = Some(template_tag);
        }

        ws.time_buf.fill(0.0);
        for (slot, &v) in ws.time_buf.iter_mut().zip(channel.iter()) {
            // Non-finite samples would poison the whole transform; their
            // windows are flagged in `stats` and get the sentinel anyway.
            *slot = if v.is_finite() { v as f64 } else { 0.0 };
        }
        ws.forward
            .process_with_scratch(&mut ws.time_buf, &mut ws.signal_spec, &mut ws.scratch_fwd)
            .map_err(transform_err)?;

        for (s, t_spec) in ws.signal_spec.iter_mut().zip(ws.template_spec.iter()) {
            *s *= *t_spec;
        }
        ws.inverse
            .process_with_scratch(&mut ws.signal_spec, &mut ws.inverse_out, &mut ws.scratch_inv)
            .map_err(transform_err)?;

        // Offset i of the valid range sits at full-correlation index i + T − 1;
        // the circular tail beyond C + T − 1 is discarded. The backend leaves
        // the round trip scaled by the transform length.
        let scale = 1.0 / fft_len as f64;
        let raw = (0..stats.len()).map(|i| ws.inverse_out[i + t - 1] * scale);
        Ok(normalize(raw, tpl.norm(), stats))
    }
}
