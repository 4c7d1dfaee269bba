//! Clock-correction output.
//!
//! Resampled cluster fits become one CSV row per day:
//! `net,sta,date,clock_correction`. The correction is the negated fitted
//! clock error. Files are written to a temp path and renamed into place so
//! a failed run never leaves a partial file behind.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate};
use thiserror::Error;

use crate::analysis::ResampledPoint;
use crate::archive::{StationCode, StationPair};

/// CSV header row.
pub const CSV_HEADER: [&str; 4] = ["net", "sta", "date", "clock_correction"];

/// Date format of the `date` column.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors that can occur while writing corrections.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to write output: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to encode CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Time {0} is outside the representable date range")]
    InvalidTime(f64),
}

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// One output row.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRecord {
    /// Network code.
    pub network: String,
    /// Station code.
    pub station: String,
    /// UTC calendar date of the resampled point.
    pub date: NaiveDate,
    /// Correction in seconds (negated clock error).
    pub clock_correction: f64,
}

impl OutputRecord {
    /// CSV fields in header order.
    pub fn to_row(&self) -> [String; 4] {
        [
            self.network.clone(),
            self.station.clone(),
            self.date.format(DATE_FORMAT).to_string(),
            self.clock_correction.to_string(),
        ]
    }
}

/// UTC calendar date of a Unix timestamp in seconds.
pub fn utc_date(time: f64) -> ExportResult<NaiveDate> {
    if !time.is_finite() {
        return Err(ExportError::InvalidTime(time));
    }

    let secs = time.floor();
    let nanos = ((time - secs) * 1e9) as u32;
    DateTime::from_timestamp(secs as i64, nanos.min(999_999_999))
        .map(|dt| dt.date_naive())
        .ok_or(ExportError::InvalidTime(time))
}

/// Build output records for `station` from resampled points, keeping their order.
pub fn build_records(
    station: &StationCode,
    points: &[ResampledPoint],
) -> ExportResult<Vec<OutputRecord>> {
    points
        .iter()
        .map(|p| {
            Ok(OutputRecord {
                network: station.network.clone(),
                station: station.station.clone(),
                date: utc_date(p.time)?,
                clock_correction: p.clock_correction(),
            })
        })
        .collect()
}

/// Default output file name: `<NET1>.<STA1>.<NET2>.<STA2>_clock_correction.csv`.
///
/// Named after the whole pair, since one target station is usually
/// correlated against several partners.
pub fn output_file_name(pair: &StationPair) -> String {
    format!("{}_clock_correction.csv", pair)
}

/// Default output path inside `output_folder`.
pub fn output_path(output_folder: impl AsRef<Path>, pair: &StationPair) -> PathBuf {
    output_folder.as_ref().join(output_file_name(pair))
}

/// Encode records as CSV (header included) into any writer.
pub fn write_records<W: Write>(writer: W, records: &[OutputRecord]) -> ExportResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(CSV_HEADER)?;
    for record in records {
        wtr.write_record(record.to_row())?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write records to `path` atomically.
///
/// Writes to a temp file next to `path`, then renames.
pub fn write_csv(path: impl AsRef<Path>, records: &[OutputRecord]) -> ExportResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let temp_path = path.with_extension("csv.tmp");
    {
        let file = File::create(&temp_path)?;
        write_records(&file, records)?;
        file.sync_all()?;
    }

    fs::rename(&temp_path, path)?;

    tracing::debug!("Wrote {} rows to {}", records.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn station() -> StationCode {
        StationCode::new("XB", "ELYSE")
    }

    fn pair(partner: &str) -> StationPair {
        StationPair(station(), StationCode::new("XB", partner))
    }

    #[test]
    fn date_is_utc_calendar_day() {
        // 2019-03-01T23:59:59Z
        assert_eq!(
            utc_date(1_551_484_799.0).unwrap(),
            NaiveDate::from_ymd_opt(2019, 3, 1).unwrap()
        );
        assert_eq!(
            utc_date(1_551_484_800.0).unwrap(),
            NaiveDate::from_ymd_opt(2019, 3, 2).unwrap()
        );
        assert!(utc_date(f64::NAN).is_err());
    }

    #[test]
    fn records_negate_clock_error() {
        let points = [ResampledPoint {
            cluster_id: 0,
            time: 0.0,
            clock_error: 0.25,
        }];

        let records = build_records(&station(), &points).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].clock_correction, -0.25);
        assert_eq!(records[0].network, "XB");
        assert_eq!(records[0].station, "ELYSE");
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(1970, 1, 1).unwrap());
    }

    #[test]
    fn csv_has_header_and_rows() {
        let records = vec![OutputRecord {
            network: "XB".into(),
            station: "ELYSE".into(),
            date: NaiveDate::from_ymd_opt(2019, 3, 2).unwrap(),
            clock_correction: -1.5,
        }];

        let mut buffer = Vec::new();
        write_records(&mut buffer, &records).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert_eq!(text, "net,sta,date,clock_correction\nXB,ELYSE,2019-03-02,-1.5\n");
    }

    #[test]
    fn output_path_names_the_whole_pair() {
        let path = output_path("/out", &pair("CASA"));
        assert_eq!(path, PathBuf::from("/out/XB.ELYSE.XB.CASA_clock_correction.csv"));
    }

    #[test]
    fn pairs_sharing_a_target_get_distinct_paths() {
        assert_ne!(output_path("/out", &pair("CASA")), output_path("/out", &pair("ARMA")));
    }

    #[test]
    fn write_csv_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = output_path(dir.path().join("nested"), &pair("CASA"));

        write_csv(&path, &[]).unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("csv.tmp").exists());
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "net,sta,date,clock_correction\n");
    }
}
