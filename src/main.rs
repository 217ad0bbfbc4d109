use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use drive_routes::{
    sdk::config::AppConfig,
    sdk::map::TileSource,
    sdk::report,
    sdk::routing::provider,
    sdk::util::log::{init_logging, level_for_verbosity},
    BatchAggregator, BlankTileSource, ManualPairs, MapComposer, OsmTileSource, PairSource,
    ReportExporter, TabularPairs, DEFAULT_FILE_NAME,
};
use std::{fs, fs::File, path::PathBuf};

/// Batch drive times and a combined route map for origin/destination pairs
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    input: Input,

    /// Where to write the map document
    #[arg(short, long, default_value = DEFAULT_FILE_NAME, global = true)]
    output: PathBuf,

    /// [Optional] Also write the drive-time table as CSV
    #[arg(short, long, global = true)]
    report: Option<PathBuf>,

    /// Skip map rendering and export
    #[arg(long, global = true)]
    no_map: bool,

    /// Render on a plain background instead of fetching basemap tiles
    #[arg(long, global = true)]
    blank_basemap: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Input {
    /// Pairs given on the command line
    Manual {
        /// "LAT,LON:LAT,LON" (origin:destination), repeatable
        #[arg(short, long = "pair", value_parser = parse_pair, required = true)]
        pairs: Vec<((f64, f64), (f64, f64))>,
    },
    /// Pairs read from a CSV file or an .xlsx workbook (first sheet) with
    /// Origin, Origin_Lat, Origin_Lon, Destination, Destination_Lat,
    /// Destination_Lon columns
    File { path: PathBuf },
}

fn parse_point(raw: &str) -> Result<(f64, f64), String> {
    let (lat, lon) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LON but got '{raw}'"))?;
    let num = |s: &str| {
        s.trim()
            .parse::<f64>()
            .map_err(|_| format!("'{}' is not a number", s.trim()))
    };
    Ok((num(lat)?, num(lon)?))
}

fn parse_pair(raw: &str) -> Result<((f64, f64), (f64, f64)), String> {
    let (origin, destination) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected ORIGIN:DESTINATION but got '{raw}'"))?;
    Ok((parse_point(origin)?, parse_point(destination)?))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(level_for_verbosity(cli.verbose));
    dotenvy::dotenv().ok();

    // --- 1. Dependency Initialization ---
    let config = AppConfig::from_env()?;
    log::info!("Routing backend: {:?}", config.ors);
    let router = provider::from_config(&config.ors, &config.routing)?;

    // --- 2. Load Pairs ---
    let source: Box<dyn PairSource> = match &cli.input {
        Input::Manual { pairs } => Box::new(ManualPairs::new(pairs.clone())),
        Input::File { path } => Box::new(
            TabularPairs::from_path(path)
                .with_context(|| format!("Failed to read {}", path.display()))?,
        ),
    };
    let load = source.load()?;
    for rejection in &load.rejected {
        println!("[SKIPPED] {}", rejection);
    }

    // --- 3. Route Every Pair ---
    let outcome = BatchAggregator::new(router.as_ref()).run(&load.pairs);
    for notice in &outcome.notices {
        println!("{}", notice);
    }
    println!(
        "Routed {} of {} pairs ({} failed, {} skipped at load).",
        outcome.rows.len(),
        outcome.processed(),
        outcome.failures.len(),
        load.rejected.len()
    );
    if outcome.is_empty() {
        log::warn!("No route could be computed; nothing to report or render.");
        return Ok(());
    }
    println!("\n{}\n", report::render_table(&outcome.rows));

    if let Some(path) = &cli.report {
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        report::write_csv(&outcome.rows, file)?;
        log::info!("Report written to {}", path.display());
    }

    // --- 4. Map + Document ---
    if cli.no_map {
        return Ok(());
    }
    let tiles: Box<dyn TileSource> = if cli.blank_basemap {
        Box::new(BlankTileSource::default())
    } else {
        Box::new(OsmTileSource::from_config(&config.map)?)
    };
    let composer = MapComposer::new(tiles).with_size(config.map.width, config.map.height);
    // the report above stays valid even if the map cannot be produced
    let exported = composer
        .render(&outcome.items)
        .and_then(|canvas| ReportExporter::default().export(&canvas));
    match exported {
        Ok(pdf) => {
            fs::write(&cli.output, pdf)
                .with_context(|| format!("Failed to write {}", cli.output.display()))?;
            log::info!("Map written to {}", cli.output.display());
        }
        Err(e) => log::error!("Map export failed: {}", e),
    }

    Ok(())
}
