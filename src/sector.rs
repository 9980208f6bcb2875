//! # Coverage Sectors
//!
//! Converts a cell observation into a pie-slice polygon approximating the physical
//! footprint of its directional beam.
//!
//! ## Algorithm
//!
//! 1. The beam spans `azimuth ± beamwidth / 2`.
//! 2. [`ARC_SAMPLES`] angles are sampled evenly across that span, endpoints included.
//! 3. Each angle θ becomes a vertex with a flat-earth conversion:
//!    - `lat = lat0 + (r / 111.32) · sin θ`
//!    - `lon = lon0 + (r / (111.32 · cos(lat))) · cos θ`
//!
//!    where `lat` in the longitude term is the vertex's own, just-computed latitude.
//! 4. The cell center is appended, closing the slice.
//!
//! ## Limitations
//!
//! The longitude term diverges as latitude approaches ±90°; the approximation is not
//! corrected there. Beamwidths of 360° or more produce a full (or self-overlapping)
//! circle and are used as given, as are azimuths outside `[0, 360)`.

use geo::{BoundingRect, Coord, Intersects, LineString, Polygon};
use log::{debug, warn};

use crate::report::Palette;
use crate::{CellObservation, CoverageSector, RowWarning};

/// Number of points sampled along the sector arc.
pub const ARC_SAMPLES: usize = 30;

/// Kilometers per degree of latitude in the flat-earth approximation.
pub const KM_PER_DEGREE: f64 = 111.32;

/// Why a sector could not be built for an observation.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub enum GeometryError {
    #[error("observation has a non-finite position, radius or angle")]
    NonFiniteInput,
    #[error("coverage radius must be positive, got {0} km")]
    NonPositiveRadius(f64),
    #[error("beamwidth must be positive, got {0} degrees")]
    NonPositiveBeamwidth(f64),
    #[error("arc vertex {index} is not finite")]
    NonFiniteVertex { index: usize },
    #[error("sector has fewer than three distinct vertices")]
    Degenerate,
}

/// Build the coverage sector for one observation.
///
/// Fails with a [`GeometryError`] when the radius or beamwidth is not positive, an
/// input or vertex is not finite, or the vertices collapse to fewer than three distinct
/// points. A failure concerns this observation only; callers skip it and carry on.
///
/// # Example
/// ```
/// use sector_overlap::{build_sector, CellObservation, ARC_SAMPLES};
///
/// let obs = CellObservation::new(0, 10.0, -74.0, 1.0, 0.0, 90.0).with_subscriber("A");
/// let sector = build_sector(&obs, "red").unwrap();
///
/// assert_eq!(sector.vertices().len(), ARC_SAMPLES + 1);
/// assert_eq!(sector.center(), (10.0, -74.0));
/// ```
pub fn build_sector(obs: &CellObservation, color: &str) -> Result<CoverageSector, GeometryError> {
    validate(obs)?;

    let vertices = sector_vertices(obs)?;

    let distinct = count_distinct(&vertices);
    if distinct < 3 {
        return Err(GeometryError::Degenerate);
    }

    // geo closes the ring back to the first arc vertex
    let coords: Vec<Coord> = vertices
        .iter()
        .map(|&(lat, lon)| Coord { x: lon, y: lat })
        .collect();
    let polygon = Polygon::new(LineString::new(coords), vec![]);
    let bounds = polygon.bounding_rect().ok_or(GeometryError::Degenerate)?;

    Ok(CoverageSector {
        row: obs.row,
        subscriber_id: obs.subscriber_id.clone(),
        timestamp: obs.timestamp,
        color: color.to_string(),
        vertices,
        polygon,
        bounds,
    })
}

/// Build sectors for a whole batch, skipping rows that fail.
///
/// Returns the sectors in input order together with one [`RowWarning`] per skipped
/// row. Colors come from `palette` by row id, not by position in the output.
pub fn build_sectors(
    observations: &[CellObservation],
    palette: &Palette,
) -> (Vec<CoverageSector>, Vec<RowWarning>) {
    let mut sectors = Vec::with_capacity(observations.len());
    let mut skipped = Vec::new();

    for obs in observations {
        match build_sector(obs, palette.color_for(obs.row)) {
            Ok(sector) => sectors.push(sector),
            Err(reason) => {
                warn!(
                    "Could not build sector for row {} (subscriber {}): {}",
                    obs.row, obs.subscriber_id, reason
                );
                skipped.push(RowWarning {
                    row: obs.row,
                    subscriber_id: obs.subscriber_id.clone(),
                    reason,
                });
            }
        }
    }

    debug!(
        "Built {} sectors from {} observations ({} skipped)",
        sectors.len(),
        observations.len(),
        skipped.len()
    );

    (sectors, skipped)
}

impl CoverageSector {
    /// Arc vertices followed by the center, as `(lat, lon)`.
    pub fn vertices(&self) -> &[(f64, f64)] {
        &self.vertices
    }

    /// Originating cell position as `(lat, lon)` (always the last vertex).
    pub fn center(&self) -> (f64, f64) {
        self.vertices[self.vertices.len() - 1]
    }

    /// Sector polygon in `x = lon, y = lat` space.
    pub fn polygon(&self) -> &Polygon<f64> {
        &self.polygon
    }

    /// Bounding box of the sector in `x = lon, y = lat` space.
    pub fn bounds(&self) -> &geo::Rect<f64> {
        &self.bounds
    }

    /// Boundary-inclusive intersection test: any shared boundary or interior point
    /// counts, so sectors that only touch (e.g. at a shared center) intersect.
    pub fn intersects(&self, other: &CoverageSector) -> bool {
        self.polygon.intersects(&other.polygon)
    }
}

fn validate(obs: &CellObservation) -> Result<(), GeometryError> {
    let inputs = [
        obs.latitude,
        obs.longitude,
        obs.radius_km,
        obs.azimuth_deg,
        obs.beamwidth_deg,
    ];
    if inputs.iter().any(|v| !v.is_finite()) {
        return Err(GeometryError::NonFiniteInput);
    }
    if obs.radius_km <= 0.0 {
        return Err(GeometryError::NonPositiveRadius(obs.radius_km));
    }
    if obs.beamwidth_deg <= 0.0 {
        return Err(GeometryError::NonPositiveBeamwidth(obs.beamwidth_deg));
    }
    Ok(())
}

/// Sample the arc and append the center.
fn sector_vertices(obs: &CellObservation) -> Result<Vec<(f64, f64)>, GeometryError> {
    let half_width = obs.beamwidth_deg / 2.0;
    let start = (obs.azimuth_deg - half_width).to_radians();
    let end = (obs.azimuth_deg + half_width).to_radians();
    let step = (end - start) / (ARC_SAMPLES - 1) as f64;
    let lat_reach = obs.radius_km / KM_PER_DEGREE;

    let mut vertices = Vec::with_capacity(ARC_SAMPLES + 1);
    for i in 0..ARC_SAMPLES {
        // Last sample lands exactly on the end angle
        let theta = if i == ARC_SAMPLES - 1 {
            end
        } else {
            start + step * i as f64
        };

        let lat = obs.latitude + lat_reach * theta.sin();
        let lon = obs.longitude
            + (obs.radius_km / (KM_PER_DEGREE * lat.to_radians().cos())) * theta.cos();

        if !lat.is_finite() || !lon.is_finite() {
            return Err(GeometryError::NonFiniteVertex { index: i });
        }
        vertices.push((lat, lon));
    }
    vertices.push(obs.center());

    Ok(vertices)
}

fn count_distinct(vertices: &[(f64, f64)]) -> usize {
    let mut distinct: Vec<(f64, f64)> = Vec::with_capacity(vertices.len());
    for v in vertices {
        if !distinct.contains(v) {
            distinct.push(*v);
        }
        if distinct.len() >= 3 {
            break;
        }
    }
    distinct.len()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RowId;
    use geo::Area;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    fn obs(azimuth: f64, beamwidth: f64) -> CellObservation {
        CellObservation::new(0, 10.0, -74.0, 1.0, azimuth, beamwidth).with_subscriber("A")
    }

    /// Project vertices to local kilometers, undoing the per-vertex longitude scaling.
    fn area_km2(sector: &CoverageSector) -> f64 {
        let (lat0, lon0) = sector.center();
        let coords: Vec<Coord> = sector
            .vertices
            .iter()
            .map(|&(lat, lon)| Coord {
                x: (lon - lon0) * KM_PER_DEGREE * lat.to_radians().cos(),
                y: (lat - lat0) * KM_PER_DEGREE,
            })
            .collect();
        Polygon::new(LineString::new(coords), vec![]).unsigned_area()
    }

    #[test]
    fn test_vertex_count_and_center_last() {
        let sector = build_sector(&obs(0.0, 90.0), "red").unwrap();
        assert_eq!(sector.vertices().len(), ARC_SAMPLES + 1);
        assert_eq!(sector.vertices().last(), Some(&(10.0, -74.0)));
        assert_eq!(sector.center(), (10.0, -74.0));
        assert_eq!(sector.row, RowId(0));
        assert_eq!(sector.subscriber_id, "A");
        assert_eq!(sector.color, "red");
    }

    #[test]
    fn test_arc_endpoints_follow_beam_edges() {
        // azimuth 0, beamwidth 90: arc runs from -45 to +45 degrees
        let sector = build_sector(&obs(0.0, 90.0), "red").unwrap();
        let (first_lat, first_lon) = sector.vertices[0];
        let (last_lat, last_lon) = sector.vertices[ARC_SAMPLES - 1];

        let reach = 1.0 / KM_PER_DEGREE;
        let edge = std::f64::consts::FRAC_1_SQRT_2 * reach;
        assert!(approx_eq(first_lat, 10.0 - edge, 1e-12));
        assert!(approx_eq(last_lat, 10.0 + edge, 1e-12));
        // Both endpoints sit east of the center
        assert!(first_lon > -74.0);
        assert!(last_lon > -74.0);
    }

    #[test]
    fn test_longitude_uses_vertex_latitude() {
        let sector = build_sector(&obs(0.0, 90.0), "red").unwrap();
        let theta = (-45.0f64).to_radians();
        let lat = 10.0 + (1.0 / KM_PER_DEGREE) * theta.sin();
        let expected_lon = -74.0 + (1.0 / (KM_PER_DEGREE * lat.to_radians().cos())) * theta.cos();
        assert_eq!(sector.vertices[0], (lat, expected_lon));
    }

    #[test]
    fn test_full_circle_area() {
        let sector = build_sector(&obs(0.0, 360.0), "red").unwrap();
        let area = area_km2(&sector);
        let expected = std::f64::consts::PI;
        // 29-gon inscribed in the unit circle covers ~99.2% of it
        assert!(approx_eq(area, expected, expected * 0.02), "area {}", area);
    }

    #[test]
    fn test_zero_radius_rejected() {
        let mut o = obs(0.0, 90.0);
        o.radius_km = 0.0;
        assert_eq!(build_sector(&o, "red").unwrap_err(), GeometryError::NonPositiveRadius(0.0));
    }

    #[test]
    fn test_negative_radius_rejected() {
        let mut o = obs(0.0, 90.0);
        o.radius_km = -2.0;
        assert_eq!(
            build_sector(&o, "red").unwrap_err(),
            GeometryError::NonPositiveRadius(-2.0)
        );
    }

    #[test]
    fn test_non_positive_beamwidth_rejected() {
        assert_eq!(
            build_sector(&obs(0.0, 0.0), "red").unwrap_err(),
            GeometryError::NonPositiveBeamwidth(0.0)
        );
        assert_eq!(
            build_sector(&obs(0.0, -10.0), "red").unwrap_err(),
            GeometryError::NonPositiveBeamwidth(-10.0)
        );
    }

    #[test]
    fn test_nan_input_rejected() {
        let mut o = obs(0.0, 90.0);
        o.latitude = f64::NAN;
        assert_eq!(build_sector(&o, "red").unwrap_err(), GeometryError::NonFiniteInput);
    }

    #[test]
    fn test_vanishing_beam_is_degenerate() {
        // Arc samples collapse onto a single point
        let o = obs(0.0, 1e-300);
        assert_eq!(build_sector(&o, "red").unwrap_err(), GeometryError::Degenerate);
    }

    #[test]
    fn test_wide_beam_passes_through() {
        // Beamwidths above 360 are not clamped
        let sector = build_sector(&obs(-30.0, 400.0), "red").unwrap();
        assert_eq!(sector.vertices.len(), ARC_SAMPLES + 1);
    }

    #[test]
    fn test_build_sectors_skips_failures_and_keeps_row_ids() {
        let observations = vec![
            CellObservation::new(0, 10.0, -74.0, 1.0, 0.0, 90.0).with_subscriber("A"),
            CellObservation::new(1, 10.0, -74.0, 0.0, 0.0, 90.0).with_subscriber("B"),
            CellObservation::new(2, 10.0, -74.0, 1.0, 90.0, 90.0).with_subscriber("C"),
        ];
        let (sectors, skipped) = build_sectors(&observations, &Palette::default());

        assert_eq!(sectors.len(), 2);
        assert_eq!(sectors[0].row, RowId(0));
        assert_eq!(sectors[1].row, RowId(2));
        assert_eq!(sectors[1].subscriber_id, "C");
        // Color follows the row, not the output position
        assert_eq!(sectors[1].color, "green");

        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].row, RowId(1));
        assert_eq!(skipped[0].subscriber_id, "B");
    }

    #[test]
    fn test_shared_center_touches() {
        let a = build_sector(&obs(0.0, 60.0), "red").unwrap();
        let b = build_sector(&obs(180.0, 60.0), "blue").unwrap();
        assert!(a.intersects(&b));
    }

    #[test]
    fn test_distant_sectors_do_not_intersect() {
        let a = build_sector(&obs(0.0, 90.0), "red").unwrap();
        let far = CellObservation::new(1, 11.0, -74.0, 1.0, 0.0, 90.0);
        let b = build_sector(&far, "blue").unwrap();
        assert!(!a.intersects(&b));
    }
}
