//! Preprocess step - loads the archive and gates its windows.
//!
//! Trims every correlation function to the configured lag window,
//! measures SNR and builds the window mask. The station pair is recorded
//! for later steps; its first station is the one being corrected.

use crate::analysis::preprocess;
use crate::archive::load_archive;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, RunState};

/// Preprocess step for loading and gating correlation data.
pub struct PreprocessStep;

impl PreprocessStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PreprocessStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for PreprocessStep {
    fn name(&self) -> &str {
        "Preprocess"
    }

    fn description(&self) -> &str {
        "Load archive and gate windows"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        if !ctx.archive_path.is_file() {
            return Err(StepError::invalid_input(format!(
                "Archive not found: {}",
                ctx.archive_path.display()
            )));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<()> {
        ctx.logger.section("Correlation Archive");

        let archive = load_archive(&ctx.archive_path)?;
        let pair = archive
            .station_pair
            .clone()
            .ok_or_else(|| StepError::invalid_input("Archive has no station codes"))?;

        ctx.logger.info(&format!(
            "{}: {} windows, {} lag samples, pair {}",
            ctx.archive_name(),
            archive.window_count(),
            archive.lag.len(),
            pair
        ));

        let config = ctx.settings.preprocess_config();
        let data = preprocess(&archive, &config)?;
        let summary = data.summary;

        ctx.logger.info(&format!(
            "Retained {} of {} windows ({} below SNR {:.1}, {} empty)",
            summary.retained,
            summary.total_windows,
            summary.below_snr,
            config.snr_threshold,
            summary.zero_windows
        ));
        if data.reference.is_none() {
            ctx.logger
                .warn("No reference correlation available; no window can be estimated");
        }

        state.pair = Some(pair);
        state.archive = Some(archive);
        state.preprocessed = Some(data);

        Ok(())
    }

    fn validate_output(&self, _ctx: &Context, state: &RunState) -> StepResult<()> {
        let data = state
            .preprocessed
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("Preprocessed data not recorded"))?;

        if data.mask.len() != data.window_count() || data.snr.len() != data.window_count() {
            return Err(StepError::invalid_output(
                "Mask and SNR must cover every window",
            ));
        }
        if state.pair.is_none() {
            return Err(StepError::invalid_output("Station pair not recorded"));
        }

        Ok(())
    }
}
