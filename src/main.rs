use anyhow::Result;
use clap::Parser;
use contagion_common::SimulationConfig;
use contagion_engine::draw::{NullSurface, Surface};
use contagion_engine::render::RasterSurface;
use contagion_engine::{AssetLoader, Driver, FsAssetLoader, PlaceholderAssetLoader, SimEvent};
use log::{debug, info};
use std::path::PathBuf;
use std::time::Instant;

/// Command-line arguments for the headless runner
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the config.toml file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Override the RNG seed from the config
    #[arg(long)]
    seed: Option<u64>,

    /// Tick as fast as possible instead of on the configured interval
    #[arg(long)]
    no_delay: bool,
}

fn main() -> Result<()> {
    // Initialize the logger
    env_logger::init();
    let args = Args::parse();

    info!("Starting Contagion Engine...");

    // --- Load Configuration ---
    let mut config = SimulationConfig::load(&args.config)?;
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if args.no_delay {
        config.timing.interval_slow_ms = 0.0;
        config.timing.interval_fast_ms = 0.0;
    }
    debug!("Simulation Parameters: {:#?}", config.get_sim_params());

    let loader: Box<dyn AssetLoader> = match &config.assets.directory {
        Some(dir) => {
            info!("Loading sprites from '{}'.", dir);
            Box::new(FsAssetLoader::new(dir))
        }
        None => {
            info!("No asset directory configured, using placeholder sprites.");
            Box::new(PlaceholderAssetLoader::default())
        }
    };

    match config.output.final_frame.clone() {
        Some(path) => {
            let surface = RasterSurface::new(config.arena.width as u32, config.arena.height as u32);
            let driver = run(&config, loader, surface)?;
            driver.surface().save(&path)?;
            info!("Final frame saved to {}", path);
        }
        None => {
            run(&config, loader, NullSurface)?;
        }
    }

    info!("Simulation Complete.");
    Ok(())
}

/// Creates the population, runs it to completion and reports the terminal state.
fn run<S: Surface>(config: &SimulationConfig, loader: Box<dyn AssetLoader>, surface: S) -> Result<Driver<S>> {
    let mut driver = Driver::new(config, loader, surface)?;
    driver.population_mut().subscribe(|event| match event {
        SimEvent::EntityInfected { name } => info!("{} has been infected!", name),
        SimEvent::RemoveTransientEntity { id } => debug!("Removal requested for entity {}", id),
        SimEvent::SimulationComplete => info!("Everyone is infected."),
    });

    let report = driver.setup()?;
    info!("{} entities ready, {} failed to load.", report.created, report.failed);

    let start_time = Instant::now();
    driver.run_blocking();
    let population = driver.population();
    info!(
        "Ran {} ticks in {:.2} s | Infected: {}/{} | Phase: {:?}",
        population.tick_count(),
        start_time.elapsed().as_secs_f64(),
        population.infected_count(),
        population.entity_count(),
        driver.phase()
    );

    if config.output.print_summary {
        println!("{}", serde_json::to_string_pretty(&population.snapshot())?);
    }
    Ok(driver)
}
