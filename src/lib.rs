//! Normxcorr computes normalized cross-correlation between short waveform
//! templates and long channel signals, then extracts and declusters the
//! significant correlation peaks.
//!
//! Two kernels, a direct time-domain sweep and an FFT-based path, produce
//! numerically equivalent traces; [`correlate_batch`] fans template x channel
//! pairs out across worker threads with per-worker transform scratch.

pub mod batch;
mod correlate;
pub mod kernel;
mod peaks;
pub mod stats;
pub mod template;
mod trace;
pub mod util;

pub use batch::{correlate_batch, BatchConfig, BatchOutput, PairResult};
pub use correlate::{correlate_one, detect, CorrConfig};
pub use kernel::{CorrStatus, Correlation, Strategy};
pub use peaks::{decluster, decluster_weighted, find_peaks, Peak};
pub use stats::{WindowFlag, WindowStats, ACCEPTED_DIFF, WARN_DIFF};
pub use template::TemplatePlan;
pub use util::{CorrError, CorrResult};
