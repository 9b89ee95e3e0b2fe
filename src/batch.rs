//! Batch fan-out of template × channel correlation pairs.
//!
//! Pairs are split into contiguous chunks, one per worker. Each worker owns
//! one spectral workspace for its whole chunk, so plan setup and the forward
//! template transform amortize across the channels it processes. Results are
//! assembled in pair order, making the output deterministic regardless of
//! which worker finishes first.

use rayon::prelude::*;

use crate::correlate::{select_strategy, CorrConfig};
use crate::kernel::spectral::SpectralCorrelator;
use crate::kernel::time::correlate_time;
use crate::kernel::{Correlation, Strategy};
use crate::stats::WindowStats;
use crate::template::TemplatePlan;
use crate::trace::{trace_event, trace_span};
use crate::util::{CorrError, CorrResult};

/// Configuration for a batch correlation call.
#[derive(Clone, Debug, Default)]
pub struct BatchConfig {
    /// Kernel selection and numeric floors, shared by every pair.
    pub corr: CorrConfig,
    /// Worker thread count; defaults to the available hardware parallelism.
    pub workers: Option<usize>,
    /// Restrict the batch to these (template, channel) pairs instead of the
    /// full cross product.
    pub pairs: Option<Vec<(usize, usize)>>,
}

/// Outcome for one (template, channel) pair.
#[derive(Clone, Debug, PartialEq)]
pub struct PairResult {
    /// Index into the template set.
    pub template: usize,
    /// Index into the channel set.
    pub channel: usize,
    /// The pair's correlation, or the error that failed only this pair.
    pub outcome: CorrResult<Correlation>,
}

/// All pair outcomes of one batch call, in pair-selection order.
#[derive(Clone, Debug)]
pub struct BatchOutput {
    results: Vec<PairResult>,
}

impl BatchOutput {
    /// Number of pair entries.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// True when the batch computed no pairs.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Looks up the outcome for one (template, channel) pair.
    pub fn get(&self, template: usize, channel: usize) -> Option<&PairResult> {
        self.results
            .iter()
            .find(|r| r.template == template && r.channel == channel)
    }

    /// Iterates all pair outcomes in order.
    pub fn iter(&self) -> impl Iterator<Item = &PairResult> {
        self.results.iter()
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1)
}

/// Correlates every requested (template, channel) pair.
///
/// Structural problems (empty sets or sequences, templates of differing
/// lengths, out-of-range pair indices, a zero worker count, pool setup
/// failure) fail the whole call before or instead of computing anything.
/// Problems confined to one pair (a channel shorter than the template, a
/// non-finite template, a trace whose every window is contaminated) are
/// recorded in that pair's outcome while the rest of the batch continues.
pub fn correlate_batch(
    templates: &[&[f32]],
    channels: &[&[f32]],
    cfg: &BatchConfig,
) -> CorrResult<BatchOutput> {
    if templates.is_empty() {
        return Err(CorrError::EmptyInput {
            context: "template set",
        });
    }
    if channels.is_empty() {
        return Err(CorrError::EmptyInput {
            context: "channel set",
        });
    }
    let t_len = templates[0].len();
    if t_len == 0 {
        return Err(CorrError::EmptyInput {
            context: "template",
        });
    }
    for tpl in templates {
        if tpl.len() != t_len {
            return Err(CorrError::TemplateLengthMismatch {
                expected: t_len,
                found: tpl.len(),
            });
        }
    }
    for ch in channels {
        if ch.is_empty() {
            return Err(CorrError::EmptyInput {
                context: "channel",
            });
        }
    }

    let pairs: Vec<(usize, usize)> = match &cfg.pairs {
        Some(selection) => {
            for &(ti, ci) in selection {
                if ti >= templates.len() {
                    return Err(CorrError::IndexOutOfBounds {
                        index: ti,
                        len: templates.len(),
                        context: "template",
                    });
                }
                if ci >= channels.len() {
                    return Err(CorrError::IndexOutOfBounds {
                        index: ci,
                        len: channels.len(),
                        context: "channel",
                    });
                }
            }
            selection.clone()
        }
        None => {
            let mut all = Vec::with_capacity(templates.len() * channels.len());
            for ti in 0..templates.len() {
                for ci in 0..channels.len() {
                    all.push((ti, ci));
                }
            }
            all
        }
    };

    let workers = match cfg.workers {
        Some(0) => return Err(CorrError::InvalidWorkerCount),
        Some(n) => n,
        None => default_workers(),
    };

    let _span = trace_span!("correlate_batch", pairs = pairs.len(), workers = workers).entered();

    if pairs.is_empty() {
        return Ok(BatchOutput { results: vec![] });
    }

    let chunk_size = pairs.len().div_ceil(workers);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| CorrError::WorkerPool {
            detail: e.to_string(),
        })?;

    // Template plans and per-channel statistics are computed once and shared
    // read-only across workers. A failed plan or stats computation becomes a
    // per-pair error for every pair that references it.
    let plans: Vec<CorrResult<TemplatePlan>> =
        templates.iter().map(|tpl| TemplatePlan::new(tpl)).collect();
    let stats: Vec<CorrResult<WindowStats>> = pool.install(|| {
        channels
            .par_iter()
            .map(|ch| WindowStats::compute(ch, t_len, cfg.corr.accepted_diff, cfg.corr.warn_diff))
            .collect()
    });

    // Chunked collect keeps each chunk's results in its fixed slot, so the
    // assembled order never depends on which worker finishes first.
    let chunks: Vec<Vec<PairResult>> = pool.install(|| {
        pairs
            .par_chunks(chunk_size)
            .map(|chunk| {
                // Owned per worker; plans and the template spectrum survive
                // across this chunk's pairs and are freed when it completes.
                let mut spectral = SpectralCorrelator::new();
                chunk
                    .iter()
                    .map(|&(ti, ci)| PairResult {
                        template: ti,
                        channel: ci,
                        outcome: correlate_pair(
                            &plans[ti],
                            ti,
                            channels[ci],
                            &stats[ci],
                            &cfg.corr,
                            &mut spectral,
                        ),
                    })
                    .collect()
            })
            .collect()
    });
    let results: Vec<PairResult> = chunks.into_iter().flatten().collect();

    let failed = results.iter().filter(|r| r.outcome.is_err()).count();
    trace_event!("batch_done", pairs = results.len(), failed = failed);
    Ok(BatchOutput { results })
}

fn correlate_pair(
    plan: &CorrResult<TemplatePlan>,
    template_tag: usize,
    channel: &[f32],
    stats: &CorrResult<WindowStats>,
    cfg: &CorrConfig,
    spectral: &mut SpectralCorrelator,
) -> CorrResult<Correlation> {
    let plan = plan.as_ref().map_err(Clone::clone)?;
    let stats = stats.as_ref().map_err(Clone::clone)?;

    if plan.is_degenerate() {
        return Ok(crate::correlate::degenerate_trace(stats.len()));
    }

    let strategy = match cfg.strategy {
        Strategy::Auto => select_strategy(plan.len(), channel.len()),
        explicit => explicit,
    };
    let corr = match strategy {
        Strategy::Spectral => spectral.correlate(plan, template_tag, channel, stats)?,
        _ => correlate_time(plan, channel, stats),
    };
    crate::correlate::reject_all_non_finite(corr)
}

#[cfg(test)]
mod tests {
    use super::{correlate_batch, BatchConfig};
    use crate::util::CorrError;

    #[test]
    fn rejects_mixed_template_lengths() {
        let t1 = [1.0f32, 2.0];
        let t2 = [1.0f32, 2.0, 3.0];
        let ch = [0.0f32; 16];
        let err = correlate_batch(&[&t1, &t2], &[&ch], &BatchConfig::default()).unwrap_err();
        assert_eq!(
            err,
            CorrError::TemplateLengthMismatch {
                expected: 2,
                found: 3
            }
        );
    }

    #[test]
    fn rejects_out_of_range_pair_selection() {
        let t = [1.0f32, 2.0];
        let ch = [0.0f32; 8];
        let cfg = BatchConfig {
            pairs: Some(vec![(0, 3)]),
            ..BatchConfig::default()
        };
        let err = correlate_batch(&[&t], &[&ch], &cfg).unwrap_err();
        assert_eq!(
            err,
            CorrError::IndexOutOfBounds {
                index: 3,
                len: 1,
                context: "channel"
            }
        );
    }

    #[test]
    fn rejects_zero_workers() {
        let t = [1.0f32, 2.0];
        let ch = [0.0f32; 8];
        let cfg = BatchConfig {
            workers: Some(0),
            ..BatchConfig::default()
        };
        assert_eq!(
            correlate_batch(&[&t], &[&ch], &cfg).unwrap_err(),
            CorrError::InvalidWorkerCount
        );
    }

    #[test]
    fn short_channel_fails_only_its_pairs() {
        let t = [1.0f32, -1.0, 2.0, 0.5];
        let long: Vec<f32> = (0..32).map(|i| (i as f32 * 0.4).sin()).collect();
        let short = [1.0f32, 2.0];

        let out = correlate_batch(
            &[&t],
            &[long.as_slice(), &short],
            &BatchConfig::default(),
        )
        .unwrap();
        assert_eq!(out.len(), 2);
        assert!(out.get(0, 0).unwrap().outcome.is_ok());
        assert_eq!(
            out.get(0, 1).unwrap().outcome,
            Err(CorrError::TemplateTooLong {
                template: 4,
                channel: 2
            })
        );
    }

    #[test]
    fn pair_selection_limits_output() {
        let t1 = [1.0f32, -2.0, 1.0];
        let t2 = [0.5f32, 0.5, -1.0];
        let ch1: Vec<f32> = (0..24).map(|i| (i as f32 * 0.3).cos()).collect();
        let ch2: Vec<f32> = (0..24).map(|i| (i as f32 * 0.7).sin()).collect();

        let cfg = BatchConfig {
            pairs: Some(vec![(0, 1), (1, 0)]),
            ..BatchConfig::default()
        };
        let out = correlate_batch(
            &[&t1, &t2],
            &[ch1.as_slice(), ch2.as_slice()],
            &cfg,
        )
        .unwrap();

        assert_eq!(out.len(), 2);
        assert!(out.get(0, 1).is_some());
        assert!(out.get(1, 0).is_some());
        assert!(out.get(0, 0).is_none());
    }
}
