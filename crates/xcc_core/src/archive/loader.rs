//! Archive loading from JSON files.

use std::fs;
use std::path::Path;

use crate::analysis::{AnalysisError, AnalysisResult};

use super::types::{CorrelationArchive, StationCode, StationPair};

/// Load and validate an archive from `path`.
///
/// Station codes missing from the document are taken from the file name,
/// which must then follow `NET1.STA1.NET2.STA2.<ext>`.
pub fn load_archive(path: &Path) -> AnalysisResult<CorrelationArchive> {
    if !path.exists() {
        return Err(AnalysisError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Archive not found: {}", path.display()),
        )));
    }

    let content = fs::read_to_string(path)?;
    let mut archive = parse_archive(&content)?;

    if archive.station_pair.is_none() {
        archive.station_pair = Some(station_codes_from_path(path)?);
    }

    tracing::debug!(
        "Loaded archive {} ({} windows, {} lag samples)",
        path.display(),
        archive.window_count(),
        archive.lag.len()
    );

    Ok(archive)
}

/// Parse and validate an archive from a JSON document.
///
/// Well-formed JSON that lacks required arrays is a data format error;
/// syntax errors surface as [`AnalysisError::Json`].
pub fn parse_archive(content: &str) -> AnalysisResult<CorrelationArchive> {
    let archive: CorrelationArchive = serde_json::from_str(content).map_err(|e| {
        if e.is_data() {
            AnalysisError::data_format(e.to_string())
        } else {
            AnalysisError::Json(e)
        }
    })?;
    archive.validate()?;
    Ok(archive)
}

/// Extract the station pair from a file name of the form `NET1.STA1.NET2.STA2.<ext>`.
pub fn station_codes_from_path(path: &Path) -> AnalysisResult<StationPair> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            AnalysisError::data_format(format!("No file name in path {}", path.display()))
        })?;

    let parts: Vec<&str> = file_name.split('.').collect();
    if parts.len() < 4 || parts[..4].iter().any(|p| p.is_empty()) {
        return Err(AnalysisError::data_format(format!(
            "Cannot derive station codes from '{}' (expected NET1.STA1.NET2.STA2.<ext>)",
            file_name
        )));
    }

    Ok(StationPair(
        StationCode::new(parts[0], parts[1]),
        StationCode::new(parts[2], parts[3]),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const MINIMAL: &str = r#"{
        "interval_start_times": [0.0, 86400.0],
        "lag": [-1.0, 0.0, 1.0],
        "xcorr": [[0.1, 1.0, 0.1], [0.2, 0.9, 0.1]]
    }"#;

    #[test]
    fn parses_minimal_document() {
        let archive = parse_archive(MINIMAL).unwrap();
        assert_eq!(archive.window_count(), 2);
        assert!(archive.reference.is_none());
        assert!(archive.station_pair.is_none());
    }

    #[test]
    fn missing_lag_is_data_format_error() {
        let content = r#"{"interval_start_times": [0.0], "xcorr": [[1.0]]}"#;
        let err = parse_archive(content).unwrap_err();
        assert!(matches!(err, AnalysisError::DataFormat(_)));
    }

    #[test]
    fn broken_json_is_json_error() {
        let err = parse_archive("{ not json").unwrap_err();
        assert!(matches!(err, AnalysisError::Json(_)));
    }

    #[test]
    fn station_pair_from_document() {
        let content = r#"{
            "interval_start_times": [0.0],
            "lag": [-1.0, 0.0, 1.0],
            "xcorr": [[0.1, 1.0, 0.1]],
            "station_pair": ["AU.ARMA", "AU.QIS"]
        }"#;
        let archive = parse_archive(content).unwrap();
        let pair = archive.station_pair.unwrap();
        assert_eq!(pair.target().to_string(), "AU.ARMA");
        assert_eq!(pair.partner().to_string(), "AU.QIS");
    }

    #[test]
    fn station_codes_from_file_name() {
        let pair = station_codes_from_path(Path::new("/data/7D.DE43.AU.ARMA.json")).unwrap();
        assert_eq!(pair.target(), &StationCode::new("7D", "DE43"));
        assert_eq!(pair.partner(), &StationCode::new("AU", "ARMA"));
    }

    #[test]
    fn station_codes_reject_short_name() {
        assert!(station_codes_from_path(Path::new("pair.json")).is_err());
    }

    #[test]
    fn load_fills_station_pair_from_name() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("AU.ARMA.AU.QIS.json");
        fs::write(&path, MINIMAL).unwrap();

        let archive = load_archive(&path).unwrap();
        assert_eq!(
            archive.station_pair.unwrap().target(),
            &StationCode::new("AU", "ARMA")
        );
    }

    #[test]
    fn load_missing_file_fails() {
        let dir = tempdir().unwrap();
        let err = load_archive(&dir.path().join("AU.X.AU.Y.json")).unwrap_err();
        assert!(matches!(err, AnalysisError::IoError(_)));
    }
}
