//! Archive data model.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::analysis::{AnalysisError, AnalysisResult};

/// Network and station code, written `NET.STA`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StationCode {
    /// Network code.
    pub network: String,
    /// Station code.
    pub station: String,
}

impl StationCode {
    /// Create a station code from its parts.
    pub fn new(network: impl Into<String>, station: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            station: station.into(),
        }
    }
}

impl fmt::Display for StationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.network, self.station)
    }
}

impl FromStr for StationCode {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('.');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(net), Some(sta), None) if !net.is_empty() && !sta.is_empty() => {
                Ok(Self::new(net, sta))
            }
            _ => Err(AnalysisError::data_format(format!(
                "Invalid station code '{}' (expected NET.STA)",
                s
            ))),
        }
    }
}

impl TryFrom<String> for StationCode {
    type Error = AnalysisError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StationCode> for String {
    fn from(code: StationCode) -> Self {
        code.to_string()
    }
}

/// The two stations whose records were correlated.
///
/// Clock corrections are reported for the first station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationPair(pub StationCode, pub StationCode);

impl StationPair {
    /// Station whose clock is being corrected.
    pub fn target(&self) -> &StationCode {
        &self.0
    }

    /// The other station of the pair.
    pub fn partner(&self) -> &StationCode {
        &self.1
    }
}

impl fmt::Display for StationPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.0, self.1)
    }
}

/// Correlation data of one station pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationArchive {
    /// Window start times, seconds since the Unix epoch.
    pub interval_start_times: Vec<f64>,

    /// Window end times, seconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_end_times: Option<Vec<f64>>,

    /// Lag axis in seconds, shared by every window.
    pub lag: Vec<f64>,

    /// Correlation functions (rows = windows, columns = lag samples).
    pub xcorr: Vec<Vec<f64>>,

    /// Number of stacked windows per row.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_stacked_windows: Option<Vec<u32>>,

    /// Reference correlation function over the full lag axis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<Vec<f64>>,

    /// Precomputed signal-to-noise ratio per window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snr: Option<Vec<f64>>,

    /// Station codes; parsed from the file name when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub station_pair: Option<StationPair>,
}

impl CorrelationArchive {
    /// Create an archive from its required arrays.
    pub fn new(interval_start_times: Vec<f64>, lag: Vec<f64>, xcorr: Vec<Vec<f64>>) -> Self {
        Self {
            interval_start_times,
            interval_end_times: None,
            lag,
            xcorr,
            num_stacked_windows: None,
            reference: None,
            snr: None,
            station_pair: None,
        }
    }

    /// Attach station codes.
    pub fn with_station_pair(mut self, pair: StationPair) -> Self {
        self.station_pair = Some(pair);
        self
    }

    /// Attach a reference correlation function.
    pub fn with_reference(mut self, reference: Vec<f64>) -> Self {
        self.reference = Some(reference);
        self
    }

    /// Attach precomputed SNR values.
    pub fn with_snr(mut self, snr: Vec<f64>) -> Self {
        self.snr = Some(snr);
        self
    }

    /// Number of windows.
    pub fn window_count(&self) -> usize {
        self.xcorr.len()
    }

    /// Check shapes and required arrays.
    pub fn validate(&self) -> AnalysisResult<()> {
        let windows = self.xcorr.len();
        let lags = self.lag.len();

        if windows == 0 {
            return Err(AnalysisError::data_format(
                "Archive has no correlation windows",
            ));
        }
        if lags < 2 {
            return Err(AnalysisError::data_format(format!(
                "Lag axis needs at least 2 samples, got {}",
                lags
            )));
        }
        if self.interval_start_times.len() != windows {
            return Err(AnalysisError::data_format(format!(
                "Start-time count {} does not match window count {}",
                self.interval_start_times.len(),
                windows
            )));
        }
        if let Some((row, cols)) = self
            .xcorr
            .iter()
            .enumerate()
            .map(|(i, r)| (i, r.len()))
            .find(|&(_, cols)| cols != lags)
        {
            return Err(AnalysisError::data_format(format!(
                "Window {} has {} lag samples, lag axis has {}",
                row, cols, lags
            )));
        }
        if self.lag.windows(2).any(|w| !(w[1] > w[0])) {
            return Err(AnalysisError::data_format("Lag axis is not strictly increasing"));
        }

        check_optional_len(
            "interval_end_times",
            self.interval_end_times.as_ref().map(Vec::len),
            windows,
        )?;
        check_optional_len(
            "num_stacked_windows",
            self.num_stacked_windows.as_ref().map(Vec::len),
            windows,
        )?;
        check_optional_len("snr", self.snr.as_ref().map(Vec::len), windows)?;
        check_optional_len("reference", self.reference.as_ref().map(Vec::len), lags)?;

        Ok(())
    }
}

fn check_optional_len(name: &str, actual: Option<usize>, expected: usize) -> AnalysisResult<()> {
    match actual {
        Some(len) if len != expected => Err(AnalysisError::data_format(format!(
            "{} has {} entries, expected {}",
            name, len, expected
        ))),
        _ => Ok(()),
    }
}
