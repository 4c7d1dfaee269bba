//! Batch processor for running many archives through the pipeline.
//!
//! Each archive is an independent run with its own logger, context and
//! state. A failing archive is reported and never stops the others.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;

use crate::config::Settings;
use crate::logging::{LogCallback, RunLogger};

use super::types::{file_label, Context, RunState};
use super::{create_standard_pipeline, PipelineError, PipelineRunResult};

/// Result of processing a single archive.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Archive that was processed.
    pub archive_path: PathBuf,
    /// Run name (archive file name).
    pub run_name: String,
    /// Whether the run completed successfully.
    pub success: bool,
    /// Path to the correction file (if successful).
    pub output_path: Option<PathBuf>,
    /// Number of correction rows written.
    pub rows: usize,
    /// Number of clusters found, if segmentation ran.
    pub clusters: Option<usize>,
    /// Error message (if failed).
    pub error: Option<String>,
    /// Step that failed (if a step failed).
    pub failed_step: Option<String>,
    /// Steps that completed.
    pub steps_completed: Vec<String>,
}

impl RunReport {
    /// Create a successful report.
    pub fn success(
        archive_path: PathBuf,
        run_name: String,
        state: &RunState,
        run_result: PipelineRunResult,
    ) -> Self {
        Self {
            archive_path,
            run_name,
            success: true,
            output_path: state.output.as_ref().map(|o| o.path.clone()),
            rows: state.output.as_ref().map_or(0, |o| o.rows),
            clusters: state.cluster_count(),
            error: None,
            failed_step: None,
            steps_completed: run_result.steps_completed,
        }
    }

    /// Create a failed report.
    pub fn failure(archive_path: PathBuf, run_name: String, error: impl Into<String>) -> Self {
        Self {
            archive_path,
            run_name,
            success: false,
            output_path: None,
            rows: 0,
            clusters: None,
            error: Some(error.into()),
            failed_step: None,
            steps_completed: Vec::new(),
        }
    }

    fn from_pipeline_error(
        archive_path: PathBuf,
        run_name: String,
        state: &RunState,
        error: &PipelineError,
    ) -> Self {
        Self {
            clusters: state.cluster_count(),
            failed_step: error.step_name().map(str::to_string),
            ..Self::failure(archive_path, run_name, error.to_string())
        }
    }
}

/// Processor for running archives through the standard pipeline.
///
/// # Example
///
/// ```ignore
/// let processor = BatchProcessor::new(settings).with_parallel(true);
/// let reports = processor.process_all(&archives);
/// let failed = reports.iter().filter(|r| !r.success).count();
/// ```
pub struct BatchProcessor {
    /// Application settings, shared by every run.
    settings: Settings,
    /// Run archives on the rayon thread pool.
    parallel: bool,
}

impl BatchProcessor {
    /// Create a new sequential batch processor.
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            parallel: false,
        }
    }

    /// Enable or disable parallel processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Settings used for every run.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Process a single archive.
    ///
    /// # Arguments
    /// * `archive_path` - Correlation archive to process
    /// * `log_callback` - Optional callback receiving run log lines
    pub fn process_archive(
        &self,
        archive_path: &Path,
        log_callback: Option<LogCallback>,
    ) -> RunReport {
        let run_name = file_label(archive_path);

        let logger = match RunLogger::new(
            &run_name,
            &self.settings.paths.logs_folder,
            self.settings.log_config(),
            log_callback,
        ) {
            Ok(l) => Arc::new(l),
            Err(e) => {
                let error = PipelineError::setup_failed(
                    &run_name,
                    format!("Failed to create logger: {}", e),
                );
                return RunReport::failure(archive_path.to_path_buf(), run_name, error.to_string());
            }
        };

        let ctx = Context::new(
            self.settings.clone(),
            &run_name,
            archive_path,
            Arc::clone(&logger),
        );
        let mut state = RunState::new(&run_name);
        let pipeline = create_standard_pipeline();

        logger.info(&format!("Starting run: {}", archive_path.display()));

        let report = match pipeline.run(&ctx, &mut state) {
            Ok(run_result) => {
                let report = RunReport::success(
                    archive_path.to_path_buf(),
                    run_name.clone(),
                    &state,
                    run_result,
                );
                logger.info(&format!(
                    "Run completed: {} rows, {} clusters",
                    report.rows,
                    report.clusters.unwrap_or(0)
                ));
                report
            }
            Err(e) => {
                logger.error(&format!("Pipeline failed: {}", e));
                logger.show_tail("Last stage details");
                RunReport::from_pipeline_error(
                    archive_path.to_path_buf(),
                    run_name.clone(),
                    &state,
                    &e,
                )
            }
        };

        logger.flush();
        if report.success && self.settings.logging.archive_logs {
            let target = report
                .output_path
                .as_ref()
                .and_then(|p| p.parent())
                .map(Path::to_path_buf);
            if let Some(dir) = target {
                if let Err(e) = logger.archive_to(&dir) {
                    tracing::warn!("Failed to archive log for {}: {}", run_name, e);
                }
            }
        }

        report
    }

    /// Process every archive without log callbacks.
    ///
    /// Reports come back in input order regardless of parallelism.
    pub fn process_all(&self, archives: &[PathBuf]) -> Vec<RunReport> {
        self.process_all_with(archives, |_| None)
    }

    /// Process every archive, asking `callback_factory` for each run's log callback.
    pub fn process_all_with<F>(&self, archives: &[PathBuf], callback_factory: F) -> Vec<RunReport>
    where
        F: Fn(&Path) -> Option<LogCallback> + Sync,
    {
        tracing::info!(
            "Processing {} archives ({})",
            archives.len(),
            if self.parallel { "parallel" } else { "sequential" }
        );

        let reports: Vec<RunReport> = if self.parallel {
            archives
                .par_iter()
                .map(|path| self.process_archive(path, callback_factory(path.as_path())))
                .collect()
        } else {
            archives
                .iter()
                .enumerate()
                .map(|(i, path)| {
                    tracing::info!(
                        "Processing archive {}/{}: {}",
                        i + 1,
                        archives.len(),
                        path.display()
                    );
                    self.process_archive(path, callback_factory(path.as_path()))
                })
                .collect()
        };

        let failed = reports.iter().filter(|r| !r.success).count();
        if failed > 0 {
            tracing::warn!("{} of {} archives failed", failed, reports.len());
        }

        reports
    }
}
