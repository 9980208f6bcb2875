//! Basic example of building sectors and detecting overlaps.
//!
//! Run with: cargo run --example basic_sectors

use chrono::{NaiveDate, NaiveDateTime};
use sector_overlap::{analyze, build_sector, AnalysisConfig, CellObservation};

fn at(minute: u32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(2024, 3, 1).and_then(|d| d.and_hms_opt(10, minute, 0))
}

fn cell(row: usize, azimuth: f64, beamwidth: f64, subscriber: &str, ts: Option<NaiveDateTime>) -> CellObservation {
    CellObservation::new(row, 10.0, -74.0, 1.0, azimuth, beamwidth)
        .with_subscriber(subscriber)
        .with_timestamp(ts)
}

fn main() {
    let config = AnalysisConfig::default();

    println!("Sector Overlap Examples\n");

    // Sector geometry
    let sector = build_sector(&cell(0, 0.0, 90.0, "A", at(0)), "red").unwrap();
    let (first_lat, first_lon) = sector.vertices()[0];
    println!("Sector for A: {} vertices, arc starts at ({:.5}, {:.5}), center {:?}\n",
        sector.vertices().len(), first_lat, first_lon, sector.center());

    let scenarios = [
        ("1. Overlapping beams, 5 minutes apart", vec![
            cell(0, 0.0, 90.0, "A", at(0)),
            cell(1, 30.0, 90.0, "B", at(5)),
        ]),
        ("2. Overlapping beams, 20 minutes apart", vec![
            cell(0, 0.0, 90.0, "A", at(0)),
            cell(1, 30.0, 90.0, "B", at(20)),
        ]),
        ("3. Missing timestamp", vec![
            cell(0, 0.0, 90.0, "A", at(0)),
            cell(1, 30.0, 90.0, "B", None),
        ]),
        ("4. Zero radius row skipped", vec![
            cell(0, 0.0, 90.0, "A", at(0)),
            CellObservation::new(1, 10.0, -74.0, 0.0, 30.0, 90.0).with_subscriber("B"),
        ]),
    ];

    for (title, observations) in scenarios {
        println!("{}:", title);
        let analysis = analyze(&observations, &config);
        for warning in &analysis.row_warnings {
            println!("   ! {}", warning);
        }
        for event in &analysis.events {
            println!("   {}", event);
        }
        for warning in &analysis.pair_warnings {
            println!("   ! {}", warning);
        }
        if analysis.events.is_empty() {
            println!("   No overlap");
        }
        println!();
    }
}
