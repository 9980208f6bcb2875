//! # Overlap Detection
//!
//! Pairwise spatio-temporal scan over coverage sectors.
//!
//! For every unordered pair of sectors `(i, j)` with `i < j`:
//! 1. If either timestamp is missing, the pair yields a [`PairWarning`] and is skipped.
//! 2. Otherwise, if the polygons intersect (boundary-inclusive), the timestamps are
//!    strictly less than [`OVERLAP_WINDOW_MINUTES`] apart, and the subscribers differ,
//!    the pair yields an [`OverlapEvent`].
//!
//! An R-tree over sector bounding boxes rules out pairs that cannot intersect before
//! the polygon test runs; it never changes the result. Output order follows the pair
//! order `(i, j)` over the input slice.

use chrono::{Duration, NaiveDateTime};
use log::{debug, info, warn};
use rstar::{RTree, RTreeObject, AABB};
use std::collections::HashSet;

use crate::{CoverageSector, OverlapEvent, PairWarning};

/// Width of the co-location window. Pairs exactly this far apart do not overlap.
pub const OVERLAP_WINDOW_MINUTES: i64 = 15;

/// [`OVERLAP_WINDOW_MINUTES`] as a duration.
pub fn overlap_window() -> Duration {
    Duration::minutes(OVERLAP_WINDOW_MINUTES)
}

/// Events and warnings produced by one scan.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct OverlapReport {
    /// Detected co-locations, in pair order
    pub events: Vec<OverlapEvent>,
    /// Pairs skipped for missing timestamps, in pair order
    pub warnings: Vec<PairWarning>,
}

/// Result of testing a single pair.
enum PairOutcome {
    Event(OverlapEvent),
    Warning(PairWarning),
}

/// Sector bounding box (used for spatial indexing).
#[derive(Debug, Clone)]
struct SectorEnvelope {
    index: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for SectorEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Detect overlap events over all sector pairs.
///
/// Sectors must be distinct rows; each unordered pair is tested exactly once.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use sector_overlap::{build_sector, detect_overlaps, CellObservation};
///
/// let at = |minute| NaiveDate::from_ymd_opt(2024, 3, 1)
///     .and_then(|d| d.and_hms_opt(10, minute, 0));
///
/// let a = CellObservation::new(0, 10.0, -74.0, 1.0, 0.0, 90.0)
///     .with_subscriber("A")
///     .with_timestamp(at(0));
/// let b = CellObservation::new(1, 10.0, -74.0, 1.0, 30.0, 90.0)
///     .with_subscriber("B")
///     .with_timestamp(at(20));
///
/// let sectors = vec![build_sector(&a, "red").unwrap(), build_sector(&b, "blue").unwrap()];
/// let report = detect_overlaps(&sectors);
///
/// // 20 minutes apart: spatial overlap alone is not enough
/// assert!(report.events.is_empty());
/// assert!(report.warnings.is_empty());
/// ```
pub fn detect_overlaps(sectors: &[CoverageSector]) -> OverlapReport {
    let candidates = candidate_pairs(sectors);
    let n = sectors.len();

    let outcomes = (0..n).flat_map(|i| {
        let candidates = &candidates;
        ((i + 1)..n).filter_map(move |j| {
            evaluate_pair(&sectors[i], &sectors[j], candidates.contains(&(i, j)))
        })
    });

    let report = collect_outcomes(outcomes);
    info!(
        "Scanned {} sectors: {} overlap events, {} invalid-timestamp pairs",
        n,
        report.events.len(),
        report.warnings.len()
    );
    report
}

/// Detect overlap events using parallel processing.
///
/// This is the same as `detect_overlaps` but tests pairs with rayon. Results and
/// their order are identical to the sequential scan.
#[cfg(feature = "parallel")]
pub fn detect_overlaps_parallel(sectors: &[CoverageSector]) -> OverlapReport {
    use rayon::prelude::*;

    let candidates = candidate_pairs(sectors);
    let n = sectors.len();

    let per_row: Vec<Vec<PairOutcome>> = (0..n)
        .into_par_iter()
        .map(|i| {
            ((i + 1)..n)
                .filter_map(|j| {
                    evaluate_pair(&sectors[i], &sectors[j], candidates.contains(&(i, j)))
                })
                .collect()
        })
        .collect();

    let report = collect_outcomes(per_row.into_iter().flatten());
    info!(
        "Scanned {} sectors in parallel: {} overlap events, {} invalid-timestamp pairs",
        n,
        report.events.len(),
        report.warnings.len()
    );
    report
}

/// True when two timestamps are strictly closer than the overlap window.
pub fn within_window(a: NaiveDateTime, b: NaiveDateTime) -> bool {
    let gap = if a >= b { a - b } else { b - a };
    gap < overlap_window()
}

/// Index pairs `(i, j)`, `i < j`, whose bounding boxes touch or overlap.
fn candidate_pairs(sectors: &[CoverageSector]) -> HashSet<(usize, usize)> {
    let envelopes: Vec<SectorEnvelope> = sectors
        .iter()
        .enumerate()
        .map(|(index, s)| SectorEnvelope {
            index,
            envelope: AABB::from_corners(
                [s.bounds.min().x, s.bounds.min().y],
                [s.bounds.max().x, s.bounds.max().y],
            ),
        })
        .collect();
    let rtree = RTree::bulk_load(envelopes.clone());

    let mut pairs = HashSet::new();
    for env in &envelopes {
        for other in rtree.locate_in_envelope_intersecting(&env.envelope) {
            if other.index > env.index {
                pairs.insert((env.index, other.index));
            }
        }
    }

    debug!(
        "R-tree pre-filter kept {} of {} sector pairs",
        pairs.len(),
        sectors.len() * sectors.len().saturating_sub(1) / 2
    );
    pairs
}

fn evaluate_pair(
    a: &CoverageSector,
    b: &CoverageSector,
    bounds_touch: bool,
) -> Option<PairOutcome> {
    let (Some(ts_a), Some(ts_b)) = (a.timestamp, b.timestamp) else {
        return Some(PairOutcome::Warning(PairWarning {
            row_a: a.row,
            row_b: b.row,
            subscriber_a: a.subscriber_id.clone(),
            subscriber_b: b.subscriber_id.clone(),
        }));
    };

    // Cheap checks first, polygon test last
    if !bounds_touch || a.subscriber_id == b.subscriber_id || !within_window(ts_a, ts_b) {
        return None;
    }
    if !a.intersects(b) {
        return None;
    }

    Some(PairOutcome::Event(OverlapEvent {
        row_a: a.row,
        row_b: b.row,
        subscriber_a: a.subscriber_id.clone(),
        subscriber_b: b.subscriber_id.clone(),
        timestamp_a: ts_a,
        timestamp_b: ts_b,
    }))
}

fn collect_outcomes(outcomes: impl Iterator<Item = PairOutcome>) -> OverlapReport {
    let mut report = OverlapReport::default();
    for outcome in outcomes {
        match outcome {
            PairOutcome::Event(event) => {
                debug!(
                    "Overlap: {} (row {}) and {} (row {})",
                    event.subscriber_a, event.row_a, event.subscriber_b, event.row_b
                );
                report.events.push(event);
            }
            PairOutcome::Warning(warning) => {
                warn!(
                    "Invalid timestamps for subscribers {} and {} (rows {} and {})",
                    warning.subscriber_a, warning.subscriber_b, warning.row_a, warning.row_b
                );
                report.warnings.push(warning);
            }
        }
    }
    report
}

// ============================================================================
// Tests
// ============================================================================
