//! Error types for normxcorr.

use thiserror::Error;

/// Result alias for normxcorr operations.
pub type CorrResult<T> = std::result::Result<T, CorrError>;

/// Errors that can occur when correlating or post-processing traces.
///
/// Shape and configuration errors abort a call before any computation starts.
/// In a batch call, per-pair errors are recorded in that pair's outcome while
/// the remaining pairs continue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CorrError {
    /// A required input sequence or set is empty.
    #[error("empty {context}")]
    EmptyInput { context: &'static str },
    /// The template does not fit inside the channel.
    #[error("template length {template} exceeds channel length {channel}")]
    TemplateTooLong { template: usize, channel: usize },
    /// A batch call requires all templates to share one length.
    #[error("templates must share one length: expected {expected}, found {found}")]
    TemplateLengthMismatch { expected: usize, found: usize },
    /// A pair-selection index does not address an existing template or channel.
    #[error("{context} index {index} out of bounds for set of {len}")]
    IndexOutOfBounds {
        index: usize,
        len: usize,
        context: &'static str,
    },
    /// The input contains NaN or infinite samples where none are tolerated.
    #[error("non-finite samples in {context}")]
    NonFiniteInput { context: &'static str },
    /// Every correlation window overlaps non-finite samples; no value is real.
    #[error("all {windows} correlation windows overlap non-finite samples")]
    AllWindowsNonFinite { windows: usize },
    /// Decluster weights must pair one-to-one with the peaks.
    #[error("weights length {weights} does not match peak count {peaks}")]
    WeightsMismatch { weights: usize, peaks: usize },
    /// The configured worker count is zero.
    #[error("worker count must be positive")]
    InvalidWorkerCount,
    /// The FFT backend rejected a transform.
    #[error("transform failed: {detail}")]
    Transform { detail: String },
    /// The worker pool could not be constructed.
    #[error("worker pool setup failed: {detail}")]
    WorkerPool { detail: String },
}
