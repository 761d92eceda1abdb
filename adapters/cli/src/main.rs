#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless command-line driver for the Crypt Crawler simulation.
//!
//! Loads a level layout, solves and populates it, then runs a scripted
//! player through a fixed number of ticks and prints what happened.

mod session;

use std::{path::PathBuf, process, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use crypt_crawler_core::WELCOME_BANNER;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::session::{load_layout, CrawlerConfig, Session, Summary};

/// Command-line arguments accepted by the crawler.
#[derive(Debug, Parser)]
#[command(name = "crypt-crawler", about = "Runs the Crypt Crawler simulation headlessly")]
struct Cli {
    /// Level layout as JSON `{ "w", "h", "spacing", "tiles" }`. Uses the built-in map when omitted.
    #[arg(long, value_name = "PATH")]
    level: Option<PathBuf>,
    /// TOML file overriding populator, enemy, scene and animation tuning.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Seed of every random draw made while building the level.
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// Number of simulation ticks to run.
    #[arg(long, default_value_t = 600)]
    ticks: u32,
    /// Length of a tick in milliseconds.
    #[arg(long, default_value_t = 16)]
    tick_ms: u64,
    /// Print the solved grid as interleaved `[tile, orientation]` JSON instead of a summary.
    #[arg(long)]
    export: bool,
}

/// Entry point for the Crypt Crawler command-line interface.
fn main() {
    init_tracing();
    if let Err(err) = run(Cli::parse()) {
        error!(error = %err, "run_failed");
        eprintln!("error: {err:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => CrawlerConfig::load(path)?,
        None => CrawlerConfig::default(),
    };
    let layout = load_layout(cli.level.as_deref())?;
    let mut session = Session::start(&layout, config, cli.seed)?;

    if cli.export {
        let json = serde_json::to_string(&session.export_tiles())
            .context("failed to encode the solved grid")?;
        println!("{json}");
        return Ok(());
    }

    let summary = session.run(cli.ticks, Duration::from_millis(cli.tick_ms))?;
    println!("{WELCOME_BANNER}");
    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &Summary) {
    println!("level: {}x{}", summary.width, summary.height);
    println!(
        "torches: {} ({} flames announced)",
        summary.population.torches, summary.torch_flames
    );
    println!(
        "enemies: {} spawned, {} alive, {} in scene after {} ticks",
        summary.population.enemies, summary.live_actors, summary.remaining_actors, summary.ticks
    );
    println!("light buckets occupied: {}", summary.population.occupied_buckets);
    println!("shadow-casting lights: {}", summary.shadow_lights);
    println!(
        "player: at ({:.1}, {:.1}), travelled {:.1}",
        summary.player_position.x, summary.player_position.z, summary.player_travel
    );
    println!("blood splatters: {}", summary.blood_splatters);
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
