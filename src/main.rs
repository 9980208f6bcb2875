//! Command-line analyzer: reads a CSV batch of cell activations and reports
//! subscribers whose coverage sectors overlap in space and time.
//!
//! Run with: cargo run --features cli -- cells.csv --geojson sectors.geojson

use anyhow::Context;
use clap::Parser;
use sector_overlap::{
    analyze, map_center, read_observations, render_text, to_geojson, AnalysisConfig,
};
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "Detect co-located subscribers from cell coverage sectors")]
struct Args {
    /// CSV file with Latitud, Longitud, Radio_de_cobertura, Azimuth, Angulo, Abonado, fecha
    input: PathBuf,
    /// Write the coverage sectors as GeoJSON to this path
    #[arg(long)]
    geojson: Option<PathBuf>,
    /// Print the full analysis as JSON instead of text
    #[arg(long, default_value_t = false)]
    json: bool,
    /// Test sector pairs in parallel
    #[arg(long, default_value_t = false)]
    parallel: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let observations = read_observations(&args.input)
        .with_context(|| format!("loading cell observations from {}", args.input.display()))?;

    let config = AnalysisConfig {
        parallel: args.parallel,
        ..AnalysisConfig::default()
    };
    let analysis = analyze(&observations, &config);

    if let Some(path) = &args.geojson {
        let geojson = serde_json::to_string_pretty(&to_geojson(&analysis))?;
        fs::write(path, geojson)
            .with_context(|| format!("writing GeoJSON to {}", path.display()))?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        return Ok(());
    }

    if let Some((lat, lon)) = map_center(&observations) {
        println!("Batch of {} cells centered at ({:.5}, {:.5})\n", observations.len(), lat, lon);
    }
    print!("{}", render_text(&analysis));

    Ok(())
}
