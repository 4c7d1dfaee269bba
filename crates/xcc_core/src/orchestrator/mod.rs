//! Pipeline orchestrator for coordinating archive runs.
//!
//! This module provides the infrastructure for running the multi-step
//! clock-drift pipeline. Each run processes one correlation archive
//! through a sequence of steps that validate, execute, and record their
//! results.
//!
//! # Architecture
//!
//! ```text
//! Pipeline
//!     ├── Step: Preprocess
//!     ├── Step: EstimateDrift
//!     ├── Step: Segment
//!     ├── Step: Regress
//!     └── Step: Export
//! ```
//!
//! # Example
//!
//! ```ignore
//! use xcc_core::orchestrator::{create_standard_pipeline, Context, RunState};
//!
//! let pipeline = create_standard_pipeline();
//! let ctx = Context::new(settings, "XB.ELYSE", archive_path, logger);
//! let mut state = RunState::new("XB.ELYSE");
//!
//! let result = pipeline.run(&ctx, &mut state)?;
//! println!("Completed: {:?}", result.steps_completed);
//! ```

mod batch;
mod errors;
mod pipeline;
mod step;
pub mod steps;
mod types;

pub use batch::{BatchProcessor, RunReport};
pub use errors::{PipelineError, PipelineResult, StepError, StepResult};
pub use pipeline::{Pipeline, PipelineRunResult};
pub use step::PipelineStep;
pub use steps::{EstimateDriftStep, ExportStep, PreprocessStep, RegressStep, SegmentStep};
pub use types::{Context, ExportOutput, RunState};

/// Create a standard pipeline with all steps in the correct order.
///
/// The standard pipeline executes these steps:
/// 1. Preprocess - load the archive, trim lags and gate windows by SNR
/// 2. EstimateDrift - measure each window's shift against the reference
/// 3. Segment - cluster corrections into linear regimes
/// 4. Regress - fit and resample every cluster
/// 5. Export - write the daily corrections
pub fn create_standard_pipeline() -> Pipeline {
    Pipeline::new()
        .with_step(PreprocessStep::new())
        .with_step(EstimateDriftStep::new())
        .with_step(SegmentStep::new())
        .with_step(RegressStep::new())
        .with_step(ExportStep::new())
}
