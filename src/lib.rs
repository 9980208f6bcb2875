//! # Sector Overlap
//!
//! Coverage-sector geometry and spatio-temporal overlap detection for cell-site
//! activation records.
//!
//! This library provides:
//! - Pie-slice coverage polygons built from a cell's position, radius, azimuth and beamwidth
//! - Pairwise detection of subscribers whose sectors intersect within a 15 minute window
//! - CSV ingestion, text reports and (optionally) GeoJSON export of the results
//!
//! ## Features
//!
//! - **`parallel`** - Enable parallel processing of the pairwise scan with rayon
//! - **`json`** - Serialize results and export sectors as GeoJSON
//! - **`cli`** - Build the `sector-overlap` command-line analyzer
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use sector_overlap::{analyze, AnalysisConfig, CellObservation};
//!
//! let at = |minute| NaiveDate::from_ymd_opt(2024, 3, 1)
//!     .and_then(|d| d.and_hms_opt(10, minute, 0));
//!
//! let observations = vec![
//!     CellObservation::new(0, 10.0, -74.0, 1.0, 0.0, 90.0)
//!         .with_subscriber("A")
//!         .with_timestamp(at(0)),
//!     CellObservation::new(1, 10.0, -74.0, 1.0, 30.0, 90.0)
//!         .with_subscriber("B")
//!         .with_timestamp(at(5)),
//! ];
//!
//! let analysis = analyze(&observations, &AnalysisConfig::default());
//! assert_eq!(analysis.sectors.len(), 2);
//! assert_eq!(analysis.events.len(), 1);
//! println!("{}", analysis.events[0]);
//! ```
//!
//! ## Coordinate System
//!
//! Sectors use a flat-earth approximation (111.32 km per degree, longitude scaled by the
//! cosine of each vertex's latitude). Vertices are `(lat, lon)` pairs; the underlying
//! [`geo`] polygons use `x = lon`, `y = lat`.

use chrono::NaiveDateTime;
use geo::{Polygon, Rect};
use std::fmt;

// Coverage sector construction
pub mod sector;
pub use sector::{build_sector, build_sectors, GeometryError, ARC_SAMPLES, KM_PER_DEGREE};

// Pairwise overlap detection
pub mod overlap;
pub use overlap::{detect_overlaps, overlap_window, OverlapReport, OVERLAP_WINDOW_MINUTES};

#[cfg(feature = "parallel")]
pub use overlap::detect_overlaps_parallel;

// CSV ingestion
pub mod ingest;
pub use ingest::{
    parse_timestamp, read_observations, read_observations_from_reader, IngestError,
    REQUIRED_COLUMNS,
};

// Text and GeoJSON rendering
pub mod report;
pub use report::{render_text, Palette, DEFAULT_PALETTE, TIMESTAMP_FORMAT};

#[cfg(feature = "json")]
pub use report::to_geojson;

// Builder -> detector orchestration
pub mod pipeline;
pub use pipeline::{analyze, map_center, Analysis, AnalysisConfig};

// ============================================================================
// Core Types
// ============================================================================

/// Stable identifier of an input record: its zero-based data-row index in the
/// original batch (header excluded).
///
/// Sectors, events and warnings always refer back to the record through this id,
/// never through their position in a filtered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "json", derive(serde::Serialize), serde(transparent))]
pub struct RowId(pub usize);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single cell-site activation record.
///
/// # Example
/// ```
/// use sector_overlap::CellObservation;
///
/// let obs = CellObservation::new(0, 4.6097, -74.0817, 2.5, 120.0, 65.0)
///     .with_subscriber("3001234567");
/// assert_eq!(obs.center(), (4.6097, -74.0817));
/// assert!(obs.timestamp.is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct CellObservation {
    /// Row of the record in the original batch
    pub row: RowId,
    /// Cell latitude in degrees
    pub latitude: f64,
    /// Cell longitude in degrees
    pub longitude: f64,
    /// Coverage radius in kilometers (must be > 0 to build a sector)
    pub radius_km: f64,
    /// Bearing of the beam center in degrees
    pub azimuth_deg: f64,
    /// Angular width of the beam in degrees (must be > 0 to build a sector)
    pub beamwidth_deg: f64,
    /// Opaque subscriber identifier
    pub subscriber_id: String,
    /// Activation time; `None` when the source value could not be parsed
    pub timestamp: Option<NaiveDateTime>,
}

impl CellObservation {
    /// Create an observation with an empty subscriber and no timestamp.
    pub fn new(
        row: usize,
        latitude: f64,
        longitude: f64,
        radius_km: f64,
        azimuth_deg: f64,
        beamwidth_deg: f64,
    ) -> Self {
        Self {
            row: RowId(row),
            latitude,
            longitude,
            radius_km,
            azimuth_deg,
            beamwidth_deg,
            subscriber_id: String::new(),
            timestamp: None,
        }
    }

    pub fn with_subscriber(mut self, subscriber_id: impl Into<String>) -> Self {
        self.subscriber_id = subscriber_id.into();
        self
    }

    pub fn with_timestamp(mut self, timestamp: Option<NaiveDateTime>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Cell position as `(lat, lon)`.
    pub fn center(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}

/// A pie-slice polygon approximating one observation's coverage footprint.
///
/// The vertex list is the sampled arc followed by the cell center; the ring closes
/// implicitly back to the first arc vertex. The sector carries its originating
/// record's subscriber and timestamp so the overlap scan never has to look them up
/// by position.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct CoverageSector {
    /// Row of the originating observation
    pub row: RowId,
    /// Subscriber of the originating observation
    pub subscriber_id: String,
    /// Timestamp of the originating observation
    pub timestamp: Option<NaiveDateTime>,
    /// Display color (cosmetic)
    pub color: String,
    /// Arc vertices followed by the center, as `(lat, lon)`; never empty
    pub(crate) vertices: Vec<(f64, f64)>,
    /// Polygon in `x = lon, y = lat` space
    #[cfg_attr(feature = "json", serde(skip))]
    pub(crate) polygon: Polygon<f64>,
    /// Pre-computed bounding box (for R-tree indexing)
    #[cfg_attr(feature = "json", serde(skip))]
    pub(crate) bounds: Rect<f64>,
}

/// Two distinct subscribers whose sectors intersect within the overlap window.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct OverlapEvent {
    pub row_a: RowId,
    pub row_b: RowId,
    pub subscriber_a: String,
    pub subscriber_b: String,
    pub timestamp_a: NaiveDateTime,
    pub timestamp_b: NaiveDateTime,
}

/// A pair skipped because at least one side has no valid timestamp.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct PairWarning {
    pub row_a: RowId,
    pub row_b: RowId,
    pub subscriber_a: String,
    pub subscriber_b: String,
}

/// A row whose coverage sector could not be built.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct RowWarning {
    pub row: RowId,
    pub subscriber_id: String,
    pub reason: GeometryError,
}

// ============================================================================
// Tests
// ============================================================================
