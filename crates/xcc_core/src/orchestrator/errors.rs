//! Error types for the orchestrator pipeline.
//!
//! Errors carry context that chains through layers:
//! Run → Step → Analysis/Export → Detail

use std::io;

use thiserror::Error;

use crate::analysis::AnalysisError;
use crate::export::ExportError;

/// Top-level pipeline error with run context.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A step failed during execution.
    #[error("Run '{run_name}' failed at step '{step_name}': {source}")]
    StepFailed {
        run_name: String,
        step_name: String,
        #[source]
        source: StepError,
    },

    /// Failed to set up the run (create directories, open log, etc.).
    #[error("Run '{run_name}' setup failed: {message}")]
    SetupFailed { run_name: String, message: String },
}

impl PipelineError {
    /// Create a step failed error.
    pub fn step_failed(
        run_name: impl Into<String>,
        step_name: impl Into<String>,
        source: StepError,
    ) -> Self {
        Self::StepFailed {
            run_name: run_name.into(),
            step_name: step_name.into(),
            source,
        }
    }

    /// Create a setup failed error.
    pub fn setup_failed(run_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SetupFailed {
            run_name: run_name.into(),
            message: message.into(),
        }
    }

    /// The analysis error at the root of this failure, if any.
    pub fn analysis_error(&self) -> Option<&AnalysisError> {
        match self {
            Self::StepFailed {
                source: StepError::Analysis(e),
                ..
            } => Some(e),
            _ => None,
        }
    }

    /// Name of the step that failed, if a step failed.
    pub fn step_name(&self) -> Option<&str> {
        match self {
            Self::StepFailed { step_name, .. } => Some(step_name),
            Self::SetupFailed { .. } => None,
        }
    }
}

/// Error from a pipeline step.
#[derive(Error, Debug)]
pub enum StepError {
    /// Input validation failed.
    #[error("Input validation failed: {0}")]
    InvalidInput(String),

    /// Output validation failed.
    #[error("Output validation failed: {0}")]
    InvalidOutput(String),

    /// Analysis stage failed.
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    /// Writing corrections failed.
    #[error(transparent)]
    Export(#[from] ExportError),

    /// File I/O error.
    #[error("I/O error in {operation}: {source}")]
    IoError {
        operation: String,
        #[source]
        source: io::Error,
    },

    /// A precondition was not met (an earlier step did not run).
    #[error("Precondition not met: {0}")]
    PreconditionFailed(String),
}

impl StepError {
    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create an invalid output error.
    pub fn invalid_output(message: impl Into<String>) -> Self {
        Self::InvalidOutput(message.into())
    }

    /// Create an I/O error with context.
    pub fn io_error(operation: impl Into<String>, source: io::Error) -> Self {
        Self::IoError {
            operation: operation.into(),
            source,
        }
    }

    /// Create a precondition failed error.
    pub fn precondition_failed(message: impl Into<String>) -> Self {
        Self::PreconditionFailed(message.into())
    }
}

/// Result type for step operations.
pub type StepResult<T> = Result<T, StepError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_error_passes_through() {
        let err: StepError = AnalysisError::InsufficientData {
            valid: 3,
            required: 7,
        }
        .into();
        let msg = err.to_string();
        assert!(msg.contains("got 3 of 7"));
    }

    #[test]
    fn pipeline_error_chains_context() {
        let step_err = StepError::from(AnalysisError::data_format("lag axis is empty"));
        let pipeline_err = PipelineError::step_failed("XB.ELYSE", "Preprocess", step_err);

        let msg = pipeline_err.to_string();
        assert!(msg.contains("Run 'XB.ELYSE' failed at step 'Preprocess'"));
        assert!(msg.contains("lag axis is empty"));
        assert!(matches!(
            pipeline_err.analysis_error(),
            Some(AnalysisError::DataFormat(_))
        ));
        assert_eq!(pipeline_err.step_name(), Some("Preprocess"));
    }

    #[test]
    fn setup_error_has_no_analysis_cause() {
        let err = PipelineError::setup_failed("run", "cannot open log");
        assert!(err.analysis_error().is_none());
        assert!(err.step_name().is_none());
    }
}
