//! Core types for the orchestrator pipeline.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::analysis::{ClusterFits, DriftEstimate, PreprocessedData, Segmentation};
use crate::archive::{CorrelationArchive, StationCode, StationPair};
use crate::config::Settings;
use crate::export;
use crate::logging::RunLogger;

/// Read-only context passed to pipeline steps.
///
/// Contains run configuration and shared resources that steps can read
/// but not modify. Mutable state goes in `RunState`.
pub struct Context {
    /// Analysis settings.
    pub settings: Settings,
    /// Run name/identifier.
    pub run_name: String,
    /// Archive being processed.
    pub archive_path: PathBuf,
    /// Per-run logger.
    pub logger: Arc<RunLogger>,
    /// Explicit output file, overriding the default location.
    output_path: Option<PathBuf>,
}

impl Context {
    /// Create a new context for a run.
    pub fn new(
        settings: Settings,
        run_name: impl Into<String>,
        archive_path: impl Into<PathBuf>,
        logger: Arc<RunLogger>,
    ) -> Self {
        Self {
            settings,
            run_name: run_name.into(),
            archive_path: archive_path.into(),
            logger,
            output_path: None,
        }
    }

    /// Write the corrections to `path` instead of the output folder.
    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// Output file for `pair`.
    pub fn output_path_for(&self, pair: &StationPair) -> PathBuf {
        match &self.output_path {
            Some(path) => path.clone(),
            None => export::output_path(&self.settings.paths.output_folder, pair),
        }
    }

    /// Archive file name, for log messages.
    pub fn archive_name(&self) -> String {
        file_label(&self.archive_path)
    }
}

/// Mutable run state that accumulates results from pipeline steps.
///
/// Each step's output is stored in its own field and later steps only
/// read what earlier ones wrote.
#[derive(Debug, Clone, Default)]
pub struct RunState {
    /// Unique run identifier.
    pub run_id: String,
    /// When the run started.
    pub started_at: Option<String>,
    /// Loaded archive (from Preprocess step).
    pub archive: Option<CorrelationArchive>,
    /// Correlated station pair (from Preprocess step).
    pub pair: Option<StationPair>,
    /// Trimmed and gated data (from Preprocess step).
    pub preprocessed: Option<PreprocessedData>,
    /// Per-window estimates (from EstimateDrift step).
    pub drift: Option<DriftEstimate>,
    /// Cluster labels (from Segment step).
    pub segmentation: Option<Segmentation>,
    /// Per-cluster models and daily points (from Regress step).
    pub fits: Option<ClusterFits>,
    /// Written file (from Export step).
    pub output: Option<ExportOutput>,
}

impl RunState {
    /// Create a new run state with the given ID.
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            started_at: Some(chrono::Local::now().to_rfc3339()),
            ..Default::default()
        }
    }

    /// Station whose clock is corrected, once the pair is known.
    pub fn target_station(&self) -> Option<&StationCode> {
        self.pair.as_ref().map(StationPair::target)
    }

    /// Number of clusters found, if segmentation ran.
    pub fn cluster_count(&self) -> Option<usize> {
        self.segmentation.as_ref().map(|s| s.cluster_count)
    }
}

/// Output from the Export step.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOutput {
    /// Path of the written CSV file.
    pub path: PathBuf,
    /// Number of data rows written.
    pub rows: usize,
}

/// File name of `path`, or the whole path if it has none.
pub(crate) fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogConfig;
    use tempfile::tempdir;

    #[test]
    fn run_state_tracks_completion() {
        let mut state = RunState::new("run-1");
        assert!(state.target_station().is_none());
        assert!(state.cluster_count().is_none());
        assert!(state.started_at.is_some());

        state.pair = Some(StationPair(
            StationCode::new("XB", "ELYSE"),
            StationCode::new("XB", "CASA"),
        ));
        assert_eq!(state.target_station(), Some(&StationCode::new("XB", "ELYSE")));
    }

    #[test]
    fn output_path_defaults_to_output_folder() {
        let dir = tempdir().unwrap();
        let logger =
            Arc::new(RunLogger::new("run", dir.path(), LogConfig::default(), None).unwrap());
        let mut settings = Settings::default();
        settings.paths.output_folder = "/data/out".to_string();
        let pair = StationPair(StationCode::new("XB", "ELYSE"), StationCode::new("XB", "CASA"));

        let ctx = Context::new(
            settings.clone(),
            "run",
            "/data/XB.ELYSE.XB.CASA.json",
            logger.clone(),
        );
        assert_eq!(
            ctx.output_path_for(&pair),
            PathBuf::from("/data/out/XB.ELYSE.XB.CASA_clock_correction.csv")
        );
        assert_eq!(ctx.archive_name(), "XB.ELYSE.XB.CASA.json");

        let ctx = Context::new(settings, "run", "a.json", logger).with_output_path("/tmp/x.csv");
        assert_eq!(ctx.output_path_for(&pair), PathBuf::from("/tmp/x.csv"));
    }
}
