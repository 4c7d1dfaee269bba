//! Export step - writes the daily corrections as CSV.

use crate::export::{build_records, write_csv};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, ExportOutput, RunState};

/// Export step.
///
/// Writes one row per resampled point. The file is replaced atomically,
/// so a rerun over the same archive yields identical output.
pub struct ExportStep;

impl ExportStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ExportStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for ExportStep {
    fn name(&self) -> &str {
        "Export"
    }

    fn description(&self) -> &str {
        "Write clock corrections"
    }

    fn validate_input(&self, _ctx: &Context) -> StepResult<()> {
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<()> {
        let pair = state
            .pair
            .as_ref()
            .ok_or_else(|| StepError::precondition_failed("Station pair unknown"))?;
        let fits = state
            .fits
            .as_ref()
            .ok_or_else(|| StepError::precondition_failed("Regress step has not run"))?;

        let records = build_records(pair.target(), &fits.points)?;
        let path = ctx.output_path_for(pair);
        write_csv(&path, &records)?;

        ctx.logger.success(&format!(
            "Wrote {} corrections to {}",
            records.len(),
            path.display()
        ));

        state.output = Some(ExportOutput {
            path,
            rows: records.len(),
        });
        Ok(())
    }

    fn validate_output(&self, _ctx: &Context, state: &RunState) -> StepResult<()> {
        let output = state
            .output
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("Export output not recorded"))?;

        if !output.path.is_file() {
            return Err(StepError::invalid_output(format!(
                "Output file missing: {}",
                output.path.display()
            )));
        }

        Ok(())
    }
}
