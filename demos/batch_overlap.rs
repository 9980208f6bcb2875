//! Example of scanning a larger batch for overlaps.
//!
//! Run with: cargo run --example batch_overlap --features parallel

use chrono::{Duration, NaiveDate};
use sector_overlap::{
    build_sectors, detect_overlaps, detect_overlaps_parallel, CellObservation, Palette,
};
use std::time::Instant;

fn main() {
    println!("Batch Overlap Example\n");

    let Some(start) = NaiveDate::from_ymd_opt(2024, 3, 1).and_then(|d| d.and_hms_opt(8, 0, 0)) else {
        return;
    };

    // 200 activations spread over a small grid of sites and two hours
    let observations: Vec<CellObservation> = (0..200)
        .map(|i| {
            let site = i % 16;
            let lat = 4.60 + (site / 4) as f64 * 0.01;
            let lon = -74.08 + (site % 4) as f64 * 0.01;
            let timestamp = if i % 37 == 0 {
                None
            } else {
                Some(start + Duration::minutes((i * 7 % 120) as i64))
            };
            CellObservation::new(i, lat, lon, 0.8, ((i * 53) % 360) as f64, 65.0)
                .with_subscriber(format!("300{:07}", i % 25))
                .with_timestamp(timestamp)
        })
        .collect();

    let (sectors, skipped) = build_sectors(&observations, &Palette::default());
    println!("Built {} sectors ({} skipped)\n", sectors.len(), skipped.len());

    let t = Instant::now();
    let sequential = detect_overlaps(&sectors);
    println!("Sequential scan: {:?}", t.elapsed());

    let t = Instant::now();
    let parallel = detect_overlaps_parallel(&sectors);
    println!("Parallel scan:   {:?}\n", t.elapsed());

    assert_eq!(sequential, parallel);

    println!("Stats:");
    println!("  Overlap events: {}", parallel.events.len());
    println!("  Invalid-timestamp pairs: {}", parallel.warnings.len());
    for event in parallel.events.iter().take(5) {
        println!("  {}", event);
    }
}
