//! XCC Core - station clock-drift estimation
//!
//! Turns ambient-noise cross-correlation archives into daily clock
//! corrections for a seismic station. The pipeline gates windows by SNR,
//! measures each window's shift against a reference correlation function,
//! splits the resulting series into linear regimes with DBSCAN and fits
//! each regime independently.
//!
//! This crate contains all processing logic with no UI dependencies.

pub mod analysis;
pub mod archive;
pub mod config;
pub mod export;
pub mod logging;
pub mod orchestrator;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_returns_value() {
        assert!(!version().is_empty());
    }
}
