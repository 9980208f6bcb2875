//! Human-readable and GeoJSON rendering of an analysis.
//!
//! Covers the presentation side of the pipeline:
//! - Display colors per row (stateless palette cycling)
//! - One sentence per overlap event and per warning
//! - A plain-text report of the whole batch
//! - GeoJSON export of the sectors (feature `json`)

use std::fmt;

use crate::{Analysis, OverlapEvent, PairWarning, RowId, RowWarning};

/// Timestamp format used in rendered sentences.
pub const TIMESTAMP_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

/// Colors assigned to rows in turn.
pub const DEFAULT_PALETTE: [&str; 6] = ["red", "blue", "green", "orange", "purple", "gray"];

/// Fixed list of display colors, cycled by row id.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    colors: Vec<String>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl Palette {
    /// Create a palette. Returns `None` if `colors` is empty.
    pub fn new(colors: Vec<String>) -> Option<Self> {
        if colors.is_empty() {
            return None;
        }
        Some(Self { colors })
    }

    /// Color for a row: `colors[row % len]`.
    ///
    /// # Example
    /// ```
    /// use sector_overlap::{Palette, RowId};
    ///
    /// let palette = Palette::default();
    /// assert_eq!(palette.color_for(RowId(0)), "red");
    /// assert_eq!(palette.color_for(RowId(7)), "blue");
    /// ```
    pub fn color_for(&self, row: RowId) -> &str {
        &self.colors[row.0 % self.colors.len()]
    }
}

impl fmt::Display for OverlapEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Subscribers {} and {} activated cells whose coverage areas intersect. \
             The overlap falls within the period {} - {}.",
            self.subscriber_a,
            self.subscriber_b,
            self.timestamp_a.format(TIMESTAMP_FORMAT),
            self.timestamp_b.format(TIMESTAMP_FORMAT),
        )
    }
}

impl fmt::Display for PairWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid timestamps for subscribers {} and {}.",
            self.subscriber_a, self.subscriber_b
        )
    }
}

impl fmt::Display for RowWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Could not build the coverage sector for row {} (subscriber {}): {}.",
            self.row, self.subscriber_id, self.reason
        )
    }
}

/// Render the whole analysis as a plain-text report.
pub fn render_text(analysis: &Analysis) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "Coverage sectors: {} built, {} skipped\n",
        analysis.sectors.len(),
        analysis.row_warnings.len()
    ));
    for warning in &analysis.row_warnings {
        out.push_str(&format!("  ! {}\n", warning));
    }

    out.push_str("\nCommon zones:\n");
    if analysis.events.is_empty() {
        out.push_str("  (none)\n");
    }
    for event in &analysis.events {
        out.push_str(&format!("  - {}\n", event));
    }

    if !analysis.pair_warnings.is_empty() {
        out.push_str("\nWarnings:\n");
        for warning in &analysis.pair_warnings {
            out.push_str(&format!("  ! {}\n", warning));
        }
    }

    out
}

/// Export the built sectors as a GeoJSON `FeatureCollection`.
///
/// Each sector becomes a `Polygon` feature with a closed `[lon, lat]` ring and
/// `row`, `subscriber`, `color` and `timestamp` properties.
#[cfg(feature = "json")]
pub fn to_geojson(analysis: &Analysis) -> serde_json::Value {
    use serde_json::json;

    let features: Vec<serde_json::Value> = analysis
        .sectors
        .iter()
        .map(|sector| {
            let mut ring: Vec<[f64; 2]> = sector.vertices.iter().map(|&(lat, lon)| [lon, lat]).collect();
            if let Some(&first) = ring.first() {
                ring.push(first);
            }
            json!({
                "type": "Feature",
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [ring],
                },
                "properties": {
                    "row": sector.row,
                    "subscriber": sector.subscriber_id,
                    "color": sector.color,
                    "timestamp": sector.timestamp.map(|t| t.format(TIMESTAMP_FORMAT).to_string()),
                },
            })
        })
        .collect();

    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GeometryError;
    use chrono::NaiveDate;

    fn event() -> OverlapEvent {
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        OverlapEvent {
            row_a: RowId(0),
            row_b: RowId(1),
            subscriber_a: "A".to_string(),
            subscriber_b: "B".to_string(),
            timestamp_a: day.and_hms_opt(9, 5, 0).unwrap(),
            timestamp_b: day.and_hms_opt(9, 12, 30).unwrap(),
        }
    }

    #[test]
    fn test_palette_cycles_by_row() {
        let palette = Palette::default();
        assert_eq!(palette.color_for(RowId(0)), "red");
        assert_eq!(palette.color_for(RowId(5)), "gray");
        assert_eq!(palette.color_for(RowId(6)), "red");
        assert_eq!(palette.color_for(RowId(13)), "blue");
    }

    #[test]
    fn test_custom_palette() {
        assert!(Palette::new(vec![]).is_none());
        let palette = Palette::new(vec!["#000".to_string(), "#fff".to_string()]).unwrap();
        assert_eq!(palette.color_for(RowId(3)), "#fff");
    }

    #[test]
    fn test_event_sentence_formats_timestamps() {
        let text = event().to_string();
        assert!(text.contains("Subscribers A and B"));
        assert!(text.contains("01-03-2024 09:05:00 - 01-03-2024 09:12:30"));
    }

    #[test]
    fn test_warning_sentences() {
        let pair = PairWarning {
            row_a: RowId(2),
            row_b: RowId(4),
            subscriber_a: "X".to_string(),
            subscriber_b: "Y".to_string(),
        };
        assert_eq!(pair.to_string(), "Invalid timestamps for subscribers X and Y.");

        let row = RowWarning {
            row: RowId(3),
            subscriber_id: "Z".to_string(),
            reason: GeometryError::NonPositiveRadius(0.0),
        };
        let text = row.to_string();
        assert!(text.contains("row 3"));
        assert!(text.contains("coverage radius must be positive"));
    }

    #[test]
    fn test_render_text_sections() {
        let analysis = Analysis {
            events: vec![event()],
            ..Analysis::default()
        };
        let text = render_text(&analysis);
        assert!(text.starts_with("Coverage sectors: 0 built, 0 skipped"));
        assert!(text.contains("Common zones:\n  - Subscribers A and B"));
        assert!(!text.contains("Warnings:"));
    }

    #[test]
    fn test_render_text_without_events() {
        let text = render_text(&Analysis::default());
        assert!(text.contains("Common zones:\n  (none)"));
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_geojson_rings_are_closed() {
        use crate::{analyze, AnalysisConfig, CellObservation};

        let observations = vec![CellObservation::new(0, 10.0, -74.0, 1.0, 0.0, 90.0).with_subscriber("A")];
        let analysis = analyze(&observations, &AnalysisConfig::default());
        let geojson = to_geojson(&analysis);

        assert_eq!(geojson["type"], "FeatureCollection");
        let feature = &geojson["features"][0];
        assert_eq!(feature["properties"]["subscriber"], "A");
        assert_eq!(feature["properties"]["color"], "red");

        let ring = feature["geometry"]["coordinates"][0].as_array().unwrap();
        assert_eq!(ring.len(), crate::ARC_SAMPLES + 2);
        assert_eq!(ring.first(), ring.last());
        // Center is stored as [lon, lat]
        assert_eq!(ring[crate::ARC_SAMPLES], serde_json::json!([-74.0, 10.0]));
    }
}
