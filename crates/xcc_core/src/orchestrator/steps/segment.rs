//! Segment step - splits the correction series into linear regimes.

use crate::analysis::segment;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, RunState};

/// Segmentation step.
///
/// Clusters the defined corrections with DBSCAN using the station's
/// configured metric weights.
pub struct SegmentStep;

impl SegmentStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SegmentStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for SegmentStep {
    fn name(&self) -> &str {
        "Segment"
    }

    fn description(&self) -> &str {
        "Cluster corrections into linear regimes"
    }

    fn validate_input(&self, _ctx: &Context) -> StepResult<()> {
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<()> {
        let station = state
            .target_station()
            .ok_or_else(|| StepError::precondition_failed("Target station unknown"))?;
        let drift = state
            .drift
            .as_ref()
            .ok_or_else(|| StepError::precondition_failed("EstimateDrift step has not run"))?;
        let start_times = state
            .preprocessed
            .as_ref()
            .map(|d| d.start_times.as_slice())
            .ok_or_else(|| StepError::precondition_failed("Preprocess step has not run"))?;

        let weights = ctx.settings.weights_for(station)?;
        let config = ctx.settings.segmentation_config();
        ctx.logger.info(&format!(
            "{}: weights (time={}, value={}, slope={}), eps={}s, min_samples={}",
            station, weights.time, weights.value, weights.slope, config.eps_secs, config.min_samples
        ));

        let segmentation = segment(drift, start_times, &weights, &config)?;

        ctx.logger.info(&format!(
            "{} clusters, {} of {} samples noise",
            segmentation.cluster_count,
            segmentation.noise_count,
            segmentation.samples.len()
        ));
        if segmentation.cluster_count == 0 {
            ctx.logger.warn("No clusters found; nothing will be written");
        }

        state.segmentation = Some(segmentation);
        Ok(())
    }

    fn validate_output(&self, _ctx: &Context, state: &RunState) -> StepResult<()> {
        let segmentation = state
            .segmentation
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("Segmentation not recorded"))?;

        let out_of_range = segmentation
            .samples
            .iter()
            .any(|s| s.cluster_id >= segmentation.cluster_count as i32);
        if out_of_range {
            return Err(StepError::invalid_output("Cluster label out of range"));
        }

        Ok(())
    }
}
