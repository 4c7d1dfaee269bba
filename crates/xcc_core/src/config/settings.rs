//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level updates.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::analysis::{
    AnalysisError, AnalysisResult, DriftEstimationConfig, MetricWeights, PreprocessConfig,
    SegmentationConfig,
};
use crate::archive::StationCode;
use crate::logging::{LogConfig, LogLevel};

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Path-related settings.
    #[serde(default)]
    pub paths: PathSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Lag trimming and SNR gate.
    #[serde(default)]
    pub preprocess: PreprocessSettings,

    /// Drift estimation settings.
    #[serde(default)]
    pub drift: DriftSettings,

    /// Clustering settings.
    #[serde(default)]
    pub segmentation: SegmentationSettings,

    /// Metric weights keyed by `NET.STA`.
    #[serde(default)]
    pub stations: BTreeMap<String, MetricWeights>,
}

impl Settings {
    /// Metric weights configured for `station`.
    ///
    /// Fails with `UnconfiguredStation` rather than falling back to defaults.
    pub fn weights_for(&self, station: &StationCode) -> AnalysisResult<MetricWeights> {
        self.stations
            .get(&station.to_string())
            .copied()
            .ok_or_else(|| AnalysisError::UnconfiguredStation(station.to_string()))
    }

    /// Preprocessor configuration.
    pub fn preprocess_config(&self) -> PreprocessConfig {
        PreprocessConfig {
            snr_threshold: self.preprocess.snr_threshold,
            half_width_secs: self.preprocess.half_width_secs,
        }
    }

    /// Drift estimator configuration.
    pub fn drift_config(&self) -> DriftEstimationConfig {
        DriftEstimationConfig {
            quality_cutoff: self.drift.quality_cutoff,
            refine: self.drift.refine,
        }
    }

    /// Segmenter configuration.
    pub fn segmentation_config(&self) -> SegmentationConfig {
        SegmentationConfig {
            eps_secs: self.segmentation.eps_secs,
            min_samples: self.segmentation.min_samples,
            diagnostic_pass: self.segmentation.diagnostic_pass,
        }
    }

    /// Per-run logger configuration.
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            level: self.logging.level,
            compact: self.logging.compact,
            error_tail: self.logging.error_tail as usize,
            show_timestamps: self.logging.show_timestamps,
        }
    }
}

/// Path configuration for output and logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Output folder for correction CSV files.
    #[serde(default = "default_output_folder")]
    pub output_folder: String,

    /// Folder for run log files.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,
}

fn default_output_folder() -> String {
    "clock_corrections".to_string()
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            output_folder: default_output_folder(),
            logs_folder: default_logs_folder(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Minimum level written to run logs.
    #[serde(default)]
    pub level: LogLevel,

    /// Use compact log format.
    #[serde(default = "default_true")]
    pub compact: bool,

    /// Number of lines to show in tail on failure.
    #[serde(default = "default_error_tail")]
    pub error_tail: u32,

    /// Prefix run log lines with the time of day.
    #[serde(default = "default_true")]
    pub show_timestamps: bool,

    /// Move run logs next to the output after a successful run.
    #[serde(default)]
    pub archive_logs: bool,
}

fn default_true() -> bool {
    true
}

fn default_error_tail() -> u32 {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            compact: true,
            error_tail: default_error_tail(),
            show_timestamps: true,
            archive_logs: false,
        }
    }
}

/// Preprocessing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessSettings {
    /// Minimum SNR for a window to be kept.
    #[serde(default = "default_snr_threshold")]
    pub snr_threshold: f64,

    /// Half-width of the lag window in seconds.
    #[serde(default = "default_half_width")]
    pub half_width_secs: f64,
}

fn default_snr_threshold() -> f64 {
    6.0
}

fn default_half_width() -> f64 {
    300.0
}

impl Default for PreprocessSettings {
    fn default() -> Self {
        Self {
            snr_threshold: default_snr_threshold(),
            half_width_secs: default_half_width(),
        }
    }
}

/// Drift estimation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriftSettings {
    /// Minimum normalized peak for a correction to be defined.
    #[serde(default = "default_quality_cutoff")]
    pub quality_cutoff: f64,

    /// Two-pass estimate against a shift-corrected reference.
    #[serde(default)]
    pub refine: bool,
}

fn default_quality_cutoff() -> f64 {
    0.5
}

impl Default for DriftSettings {
    fn default() -> Self {
        Self {
            quality_cutoff: default_quality_cutoff(),
            refine: false,
        }
    }
}

/// Segmentation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentationSettings {
    /// Cluster radius in weighted seconds (two weeks by default).
    #[serde(default = "default_eps")]
    pub eps_secs: f64,

    /// Minimum cluster size.
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,

    /// Log a clustering pass without the slope feature.
    #[serde(default)]
    pub diagnostic_pass: bool,
}

fn default_eps() -> f64 {
    1_209_600.0
}

fn default_min_samples() -> usize {
    7
}

impl Default for SegmentationSettings {
    fn default() -> Self {
        Self {
            eps_secs: default_eps(),
            min_samples: default_min_samples(),
            diagnostic_pass: false,
        }
    }
}

/// Names of config sections for targeted updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigSection {
    Paths,
    Logging,
    Preprocess,
    Drift,
    Segmentation,
    Stations,
}

impl ConfigSection {
    /// All sections in file order.
    pub const ALL: [ConfigSection; 6] = [
        ConfigSection::Paths,
        ConfigSection::Logging,
        ConfigSection::Preprocess,
        ConfigSection::Drift,
        ConfigSection::Segmentation,
        ConfigSection::Stations,
    ];

    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Logging => "logging",
            ConfigSection::Preprocess => "preprocess",
            ConfigSection::Drift => "drift",
            ConfigSection::Segmentation => "segmentation",
            ConfigSection::Stations => "stations",
        }
    }
}
