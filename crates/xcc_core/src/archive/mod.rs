//! Cross-correlation archives for one station pair.
//!
//! An archive holds the per-window correlation functions of a station pair
//! together with their lag axis and window start times. Archives are read-only
//! once loaded; every pipeline run starts from a fresh load.

mod loader;
mod types;

pub use loader::{load_archive, parse_archive, station_codes_from_path};
pub use types::{CorrelationArchive, StationCode, StationPair};
