//! Runs a batch through the sector builder and then the overlap detector.

use log::{debug, info};

use crate::overlap::{detect_overlaps, OverlapReport};
use crate::report::Palette;
use crate::sector::build_sectors;
use crate::{CellObservation, CoverageSector, OverlapEvent, PairWarning, RowWarning};

/// Configuration for a batch analysis.
#[derive(Debug, Clone, Default)]
pub struct AnalysisConfig {
    /// Display colors assigned to sectors by row id.
    /// Default: red, blue, green, orange, purple, gray
    pub palette: Palette,

    /// Run the pairwise scan with rayon. Ignored unless the `parallel` feature is enabled.
    /// Default: false
    pub parallel: bool,
}

/// Complete result of one batch.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct Analysis {
    /// Sectors that built successfully, in row order
    pub sectors: Vec<CoverageSector>,
    /// Rows skipped because their geometry was invalid
    pub row_warnings: Vec<RowWarning>,
    /// Detected co-locations
    pub events: Vec<OverlapEvent>,
    /// Pairs skipped for missing timestamps
    pub pair_warnings: Vec<PairWarning>,
}

/// Analyze a batch of observations.
///
/// Geometry failures and missing timestamps degrade the result (itemized in
/// `row_warnings` / `pair_warnings`) but never abort the batch.
///
/// # Example
/// ```
/// use sector_overlap::{analyze, AnalysisConfig, CellObservation};
///
/// let observations = vec![
///     CellObservation::new(0, 10.0, -74.0, 1.0, 0.0, 90.0).with_subscriber("A"),
///     CellObservation::new(1, 10.0, -74.0, -1.0, 0.0, 90.0).with_subscriber("B"),
/// ];
///
/// let analysis = analyze(&observations, &AnalysisConfig::default());
/// assert_eq!(analysis.sectors.len(), 1);
/// assert_eq!(analysis.row_warnings.len(), 1);
/// ```
pub fn analyze(observations: &[CellObservation], config: &AnalysisConfig) -> Analysis {
    let (sectors, row_warnings) = build_sectors(observations, &config.palette);

    let OverlapReport { events, warnings } = scan(&sectors, config.parallel);

    info!(
        "Analyzed {} observations: {} sectors, {} skipped rows, {} events, {} pair warnings",
        observations.len(),
        sectors.len(),
        row_warnings.len(),
        events.len(),
        warnings.len()
    );

    Analysis {
        sectors,
        row_warnings,
        events,
        pair_warnings: warnings,
    }
}

#[cfg(feature = "parallel")]
fn scan(sectors: &[CoverageSector], parallel: bool) -> OverlapReport {
    if parallel {
        debug!("Using parallel overlap scan (rayon)");
        crate::overlap::detect_overlaps_parallel(sectors)
    } else {
        debug!("Using sequential overlap scan");
        detect_overlaps(sectors)
    }
}

#[cfg(not(feature = "parallel"))]
fn scan(sectors: &[CoverageSector], parallel: bool) -> OverlapReport {
    if parallel {
        debug!("Parallel scan requested but the `parallel` feature is disabled");
    }
    detect_overlaps(sectors)
}

/// Mean cell position of a batch as `(lat, lon)`, for centering a map.
///
/// Returns `None` for an empty batch.
pub fn map_center(observations: &[CellObservation]) -> Option<(f64, f64)> {
    if observations.is_empty() {
        return None;
    }

    let n = observations.len() as f64;
    let sum_lat: f64 = observations.iter().map(|o| o.latitude).sum();
    let sum_lng: f64 = observations.iter().map(|o| o.longitude).sum();

    Some((sum_lat / n, sum_lng / n))
}

// ============================================================================
// Tests
// ============================================================================
