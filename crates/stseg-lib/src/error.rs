use thiserror::Error;

/// Errors surfaced by the analysis core.
///
/// Boundary skips (beat windows that would leave the signal) are not errors;
/// the affected beat is silently dropped where it occurs.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// A configuration value that would make results meaningless
    /// (bad smoothing window/order combination, inverted thresholds, ...).
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// The input signal cannot support the requested operation at all
    /// (shorter than one chunk, no usable beats, ...).
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// The external classifier rejected a batch it was given.
    #[error("classifier failure")]
    Classifier(#[source] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
