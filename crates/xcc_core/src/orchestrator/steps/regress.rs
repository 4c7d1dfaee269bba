//! Regress step - linear fit and daily resampling per cluster.

use crate::analysis::fit_clusters;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, RunState};

/// Regression step.
///
/// Fits each cluster independently. Degenerate clusters are skipped
/// with a warning; the rest are still fitted.
pub struct RegressStep;

impl RegressStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RegressStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for RegressStep {
    fn name(&self) -> &str {
        "Regress"
    }

    fn description(&self) -> &str {
        "Fit and resample each cluster"
    }

    fn validate_input(&self, _ctx: &Context) -> StepResult<()> {
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<()> {
        let segmentation = state
            .segmentation
            .as_ref()
            .ok_or_else(|| StepError::precondition_failed("Segment step has not run"))?;

        let fits = fit_clusters(segmentation);

        for model in &fits.models {
            ctx.logger.detail(&format!(
                "cluster {:>3}  n={:<5} slope={:+.3e} s/s  intercept={:+.6}  R²={:.4}",
                model.cluster_id, model.members, model.slope, model.intercept, model.r_squared
            ));
        }
        for cluster_id in &fits.skipped {
            ctx.logger
                .warn(&format!("Cluster {} is degenerate; skipped", cluster_id));
        }

        ctx.logger.info(&format!(
            "{} clusters fitted, {} skipped, {} daily points",
            fits.models.len(),
            fits.skipped.len(),
            fits.points.len()
        ));

        state.fits = Some(fits);
        Ok(())
    }

    fn validate_output(&self, _ctx: &Context, state: &RunState) -> StepResult<()> {
        let fits = state
            .fits
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("Cluster fits not recorded"))?;

        for point in &fits.points {
            let inside = fits
                .models
                .iter()
                .find(|m| m.cluster_id == point.cluster_id)
                .is_some_and(|m| point.time >= m.min_time && point.time <= m.max_time);
            if !inside {
                return Err(StepError::invalid_output(format!(
                    "Resampled point at {} outside cluster {} bounds",
                    point.time, point.cluster_id
                )));
            }
        }

        Ok(())
    }
}
