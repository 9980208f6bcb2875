//! CSV ingestion of cell activation records.
//!
//! Expected columns (any order, extra columns ignored):
//!
//! | Column | Meaning |
//! |--------|---------|
//! | `Latitud` | Cell latitude (degrees) |
//! | `Longitud` | Cell longitude (degrees) |
//! | `Radio_de_cobertura` | Coverage radius (km) |
//! | `Azimuth` | Beam bearing (degrees) |
//! | `Angulo` | Beamwidth (degrees) |
//! | `Abonado` | Subscriber identifier |
//! | `fecha` | Activation timestamp |
//!
//! A missing column or an empty numeric cell rejects the whole batch. An
//! unparseable `fecha` only clears that row's timestamp.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::{debug, info};
use thiserror::Error;

use crate::CellObservation;

/// Columns every batch must provide.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "Latitud",
    "Longitud",
    "Radio_de_cobertura",
    "Azimuth",
    "Angulo",
    "Abonado",
    "fecha",
];

/// Cell values treated as null in numeric columns.
const NULL_TOKENS: [&str; 12] = [
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "null", "NULL", "None", "#N/A", "<NA>",
];

const DATETIME_FORMATS: [&str; 14] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S%.f",
    "%d/%m/%Y %H:%M",
    "%m-%d-%Y %H:%M:%S%.f",
    "%m-%d-%Y %H:%M",
    "%d-%m-%Y %H:%M:%S%.f",
    "%d-%m-%Y %H:%M",
];

const DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d/%m/%Y", "%m-%d-%Y", "%d-%m-%Y",
];

/// Fatal ingestion errors. Any of these stops the batch before analysis.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("column '{0}' is missing from the CSV file")]
    MissingColumn(String),

    #[error("column '{column}' has a null value at row {row}")]
    NullValue { column: &'static str, row: usize },

    #[error("column '{column}' has a non-numeric value '{value}' at row {row}")]
    InvalidNumber {
        column: &'static str,
        row: usize,
        value: String,
    },
}

/// Read observations from a CSV file.
pub fn read_observations(path: impl AsRef<Path>) -> Result<Vec<CellObservation>, IngestError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Reading cell observations from {}", path.display());
    read_observations_from_reader(file)
}

/// Read observations from any CSV source.
///
/// Rows are numbered from 0 in file order (header excluded); that number becomes
/// each observation's [`RowId`](crate::RowId).
///
/// # Example
/// ```
/// use sector_overlap::read_observations_from_reader;
///
/// let data = "\
/// Abonado,Latitud,Longitud,Radio_de_cobertura,Azimuth,Angulo,fecha
/// 3001234567,4.61,-74.08,2,120,65,2024-03-01 10:00:00
/// 3007654321,4.62,-74.07,1.5,300,90,yesterday
/// ";
/// let observations = read_observations_from_reader(data.as_bytes()).unwrap();
///
/// assert_eq!(observations.len(), 2);
/// assert_eq!(observations[0].subscriber_id, "3001234567");
/// assert!(observations[0].timestamp.is_some());
/// assert!(observations[1].timestamp.is_none());
/// ```
pub fn read_observations_from_reader<R: Read>(
    reader: R,
) -> Result<Vec<CellObservation>, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns = ColumnIndex::from_headers(reader.headers()?)?;

    let mut observations = Vec::new();
    let mut invalid_timestamps = 0usize;

    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let field = |idx: usize| record.get(idx).unwrap_or("");

        let timestamp = parse_timestamp(field(columns.timestamp));
        if timestamp.is_none() {
            invalid_timestamps += 1;
        }

        observations.push(CellObservation {
            row: crate::RowId(row),
            latitude: parse_number(field(columns.latitude), "Latitud", row)?,
            longitude: parse_number(field(columns.longitude), "Longitud", row)?,
            radius_km: parse_number(field(columns.radius), "Radio_de_cobertura", row)?,
            azimuth_deg: parse_number(field(columns.azimuth), "Azimuth", row)?,
            beamwidth_deg: parse_number(field(columns.beamwidth), "Angulo", row)?,
            subscriber_id: field(columns.subscriber).to_string(),
            timestamp,
        });
    }

    info!(
        "Loaded {} observations ({} without a valid timestamp)",
        observations.len(),
        invalid_timestamps
    );
    Ok(observations)
}

/// Parse a timestamp permissively. Returns `None` for anything unrecognised.
///
/// Accepts RFC 3339 (converted to UTC), ISO `YYYY-MM-DD HH:MM[:SS[.fff]]` with a
/// space or `T`, `YYYY/MM/DD`, and `a/b/YYYY` or `a-b-YYYY` read month-first, falling
/// back to day-first when the month would be out of range. Date-only forms of each
/// parse as midnight.
///
/// # Example
/// ```
/// use sector_overlap::parse_timestamp;
///
/// assert!(parse_timestamp("2024-03-01 10:15:00").is_some());
/// assert!(parse_timestamp("25/12/2023 08:00").is_some());
/// assert!(parse_timestamp("soon").is_none());
/// ```
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }

    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    {
        return Some(dt);
    }

    let parsed = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0));
    if parsed.is_none() {
        debug!("Unparseable timestamp '{}'", raw);
    }
    parsed
}

fn parse_number(raw: &str, column: &'static str, row: usize) -> Result<f64, IngestError> {
    if NULL_TOKENS.contains(&raw) {
        return Err(IngestError::NullValue { column, row });
    }
    let value = raw.parse::<f64>().map_err(|_| IngestError::InvalidNumber {
        column,
        row,
        value: raw.to_string(),
    })?;
    // Any spelling of NaN is a null
    if value.is_nan() {
        return Err(IngestError::NullValue { column, row });
    }
    Ok(value)
}

/// Positions of the required columns in the header.
struct ColumnIndex {
    latitude: usize,
    longitude: usize,
    radius: usize,
    azimuth: usize,
    beamwidth: usize,
    subscriber: usize,
    timestamp: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, IngestError> {
        let mut positions = [0usize; REQUIRED_COLUMNS.len()];
        for (slot, name) in positions.iter_mut().zip(REQUIRED_COLUMNS) {
            *slot = headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| IngestError::MissingColumn(name.to_string()))?;
        }

        let [latitude, longitude, radius, azimuth, beamwidth, subscriber, timestamp] = positions;
        Ok(Self {
            latitude,
            longitude,
            radius,
            azimuth,
            beamwidth,
            subscriber,
            timestamp,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
