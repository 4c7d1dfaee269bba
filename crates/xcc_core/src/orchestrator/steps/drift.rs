//! Estimate drift step - per-window clock error against the reference.

use crate::analysis::estimate_drift;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, RunState};

/// Drift estimation step.
///
/// Cross-correlates every retained window with the reference and records
/// the shift of the best match. Windows below the quality cutoff stay
/// undefined.
pub struct EstimateDriftStep;

impl EstimateDriftStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EstimateDriftStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for EstimateDriftStep {
    fn name(&self) -> &str {
        "EstimateDrift"
    }

    fn description(&self) -> &str {
        "Estimate per-window clock error"
    }

    fn validate_input(&self, _ctx: &Context) -> StepResult<()> {
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<()> {
        let data = state
            .preprocessed
            .as_ref()
            .ok_or_else(|| StepError::precondition_failed("Preprocess step has not run"))?;

        let config = ctx.settings.drift_config();
        ctx.logger.info(&format!(
            "Quality cutoff {:.2}, {} mode",
            config.quality_cutoff,
            if config.refine { "refined" } else { "single-pass" }
        ));

        let estimate = estimate_drift(data, &config);
        let diag = estimate.diagnostics;

        ctx.logger.info(&format!(
            "{} windows estimated, {} below cutoff, {} masked",
            diag.defined, diag.below_cutoff, diag.masked
        ));

        for index in estimate.defined_indices() {
            ctx.logger.detail(&format!(
                "window {:>5}  t={:.0}  correction={:+.4}s  quality={:.3}",
                index,
                data.start_times.get(index).copied().unwrap_or(f64::NAN),
                estimate.corrections[index],
                estimate.peak_quality[index]
            ));
        }

        state.drift = Some(estimate);
        Ok(())
    }

    fn validate_output(&self, _ctx: &Context, state: &RunState) -> StepResult<()> {
        let windows = state.preprocessed.as_ref().map_or(0, |d| d.window_count());
        match &state.drift {
            Some(estimate) if estimate.corrections.len() == windows => Ok(()),
            Some(estimate) => Err(StepError::invalid_output(format!(
                "{} estimates for {} windows",
                estimate.corrections.len(),
                windows
            ))),
            None => Err(StepError::invalid_output("Drift estimate not recorded")),
        }
    }
}
