//! Error taxonomy for texture generation.

use pbrgen_pipeline::PipelineError;

/// Errors surfaced by the generator to external callers.
///
/// Operator-level numeric edge cases (constant autocontrast input,
/// zero qualifying surface-blur neighbors) are recovered inside
/// `pbrgen-pipeline` with documented fallbacks and never reach this
/// enum; only structural failures do.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// Buffer construction or blending failed (bad dimensions).
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// A channel was requested before any run has completed.
    #[error("no generation has completed yet")]
    NoDataYet,

    /// The run was cancelled before completion.
    #[error("generation run was cancelled")]
    Cancelled,

    /// Internal scheduling invariant violated. Indicates a bug in the
    /// task graph wiring, not bad caller input.
    #[error("internal scheduler error: {0}")]
    Internal(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_data_yet_display() {
        assert_eq!(
            GenerateError::NoDataYet.to_string(),
            "no generation has completed yet"
        );
    }

    #[test]
    fn cancelled_display() {
        assert_eq!(
            GenerateError::Cancelled.to_string(),
            "generation run was cancelled"
        );
    }

    #[test]
    fn pipeline_errors_pass_through_transparently() {
        let err = GenerateError::from(PipelineError::EmptyInput);
        assert_eq!(err.to_string(), "input image data is empty");
    }
}
