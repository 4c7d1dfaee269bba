//! Configuration management for clock-drift analysis.
//!
//! This module provides:
//! - TOML-based configuration with logical sections
//! - Per-station metric weights (`[stations."NET.STA"]`)
//! - Atomic file writes (write to temp, then rename)
//! - Section-level updates (only changed section is modified)
//!
//! # Example
//!
//! ```no_run
//! use xcc_core::config::{ConfigManager, ConfigSection};
//!
//! // Create manager and load (or create default) config
//! let mut config = ConfigManager::new(".config/xcc.toml");
//! config.load_or_create().unwrap();
//!
//! // Read settings
//! println!("SNR threshold: {}", config.settings().preprocess.snr_threshold);
//!
//! // Modify a setting
//! config.settings_mut().segmentation.min_samples = 5;
//!
//! // Save just the segmentation section atomically
//! config.update_section(ConfigSection::Segmentation).unwrap();
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    ConfigSection, DriftSettings, LoggingSettings, PathSettings, PreprocessSettings,
    SegmentationSettings, Settings,
};
