//! Pipeline step trait definition.
//!
//! All pipeline steps implement this trait, providing a consistent
//! interface for validation and execution.

use super::errors::StepResult;
use super::types::{Context, RunState};

/// Trait for pipeline steps.
///
/// Each step in the pipeline implements this trait. The pipeline runner
/// calls these methods in order:
///
/// 1. `validate_input` - Check preconditions before execution
/// 2. `execute` - Perform the step's work
/// 3. `validate_output` - Verify the step produced valid output
///
/// # Example
///
/// ```ignore
/// struct PreprocessStep;
///
/// impl PipelineStep for PreprocessStep {
///     fn name(&self) -> &str { "Preprocess" }
///
///     fn validate_input(&self, ctx: &Context) -> StepResult<()> {
///         if !ctx.archive_path.exists() {
///             return Err(StepError::invalid_input("Archive not found"));
///         }
///         Ok(())
///     }
///
///     fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<()> {
///         let archive = load_archive(&ctx.archive_path)?;
///         state.preprocessed = Some(preprocess(&archive, &ctx.settings.preprocess_config())?);
///         Ok(())
///     }
///
///     fn validate_output(&self, _ctx: &Context, state: &RunState) -> StepResult<()> {
///         if state.preprocessed.is_none() {
///             return Err(StepError::invalid_output("Preprocessed data not recorded"));
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait PipelineStep: Send + Sync {
    /// Get the step name (for logging and error context).
    fn name(&self) -> &str;

    /// Validate inputs before execution.
    ///
    /// Called before `execute`. Should check that all required
    /// preconditions are met (archive exists, settings are usable, etc.).
    fn validate_input(&self, ctx: &Context) -> StepResult<()>;

    /// Execute the step's main work and record results in `state`.
    ///
    /// Every step either completes or fails; there is no skipped outcome.
    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<()>;

    /// Validate outputs after execution.
    ///
    /// Should verify that the step produced valid output (state populated,
    /// file written, etc.).
    fn validate_output(&self, ctx: &Context, state: &RunState) -> StepResult<()>;

    /// Human-readable description of what this step does.
    fn description(&self) -> &str {
        self.name()
    }
}
