//! RACER-EVO - CLI Entry Point
//!
//! Trains steering networks on the reference circuit.

use clap::{Parser, Subcommand};
use racer_evo::champion::{ChampionArchive, ChampionGenome};
use racer_evo::{benchmark, replay, Config, Simulation, TrackSurface};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "racer-evo")]
#[command(version)]
#[command(about = "Genetic training of neural steering controllers on a checkpoint track")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a new population
    Train {
        /// Configuration file (YAML)
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Number of generations to train
        #[arg(short, long, default_value = "100")]
        generations: u32,

        /// Output directory for champions and stats
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,

        /// Archive the champion every N generations
        #[arg(long, default_value = "10")]
        save_every: u32,

        /// Stop after the first generation whose best agent completes a lap
        #[arg(long)]
        stop_on_win: bool,

        /// Quiet mode (minimal output)
        #[arg(short, long)]
        quiet: bool,
    },

    /// Drive a saved champion alone and report how it did
    Replay {
        /// Champion file
        champion: PathBuf,

        /// Configuration file (YAML)
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Tick limit (0 uses the generation tick cap)
        #[arg(long, default_value = "0")]
        max_ticks: u64,
    },

    /// Generate default configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "config.yaml")]
        output: PathBuf,
    },

    /// Print the metadata of a champion file
    Inspect {
        /// Champion file
        champion: PathBuf,
    },

    /// Run performance benchmark
    Benchmark {
        /// Number of generations
        #[arg(short, long, default_value = "5")]
        generations: u32,

        /// Population size
        #[arg(short, long, default_value = "60")]
        population: usize,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // The configured level applies only where a config is loaded
    let config = match &cli.command {
        Commands::Train { config, .. } | Commands::Replay { config, .. } => Some(load_config(config)?),
        _ => None,
    };
    let level = config
        .as_ref()
        .map(|c| c.logging.log_level.clone())
        .unwrap_or_else(|| "info".to_string());

    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Commands::Train {
            generations,
            output,
            seed,
            save_every,
            stop_on_win,
            quiet,
            ..
        } => train(
            config.unwrap_or_default(),
            generations,
            output,
            seed,
            save_every,
            stop_on_win,
            quiet,
        ),

        Commands::Replay {
            champion, max_ticks, ..
        } => replay_champion(config.unwrap_or_default(), champion, max_ticks),

        Commands::Init { output } => generate_config(output),

        Commands::Inspect { champion } => inspect_champion(champion),

        Commands::Benchmark {
            generations,
            population,
        } => run_benchmark(generations, population),
    }
}

fn load_config(path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    if path.exists() {
        println!("Loading config from: {:?}", path);
        Ok(Config::from_file(path)?)
    } else {
        println!("Using default configuration");
        Ok(Config::default())
    }
}

fn train(
    config: Config,
    generations: u32,
    output: PathBuf,
    seed: Option<u64>,
    save_every: u32,
    stop_on_win: bool,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(&output)?;

    let mut sim = if let Some(s) = seed {
        println!("Using seed: {}", s);
        Simulation::new_with_seed(config.clone(), s)?
    } else {
        Simulation::new(config.clone())?
    };

    println!("Starting training");
    println!("  Population: {}", config.agents.population);
    println!("  Checkpoints: {}", sim.surface().checkpoint_count());
    println!("  Generations: {}", generations);
    println!("  Seed: {}", sim.seed());
    println!();

    // Keep the last 10 archived champions
    let archive = ChampionArchive::new(output.join("champions"), 10)?;
    let save_every = save_every.max(1);

    let start = Instant::now();

    for _ in 0..generations {
        let stats = sim.run_generation()?;

        if !quiet {
            println!("{}", stats.summary());
        }

        if stats.generation % save_every == 0 {
            if let Some(champion) = sim.champion() {
                let path = archive.save(champion)?;
                log::info!("champion archived: {:?}", path);
            }
        }

        if stop_on_win && stats.did_win {
            println!("\nLap completed in generation {}", stats.generation);
            break;
        }
    }

    let elapsed = start.elapsed();

    println!();
    println!("=== Training Complete ===");
    println!("Time: {:.2}s", elapsed.as_secs_f64());
    println!("Generations: {}", sim.history.generations.len());
    println!("Ticks: {}", sim.total_ticks());
    println!(
        "Speed: {:.1} ticks/s",
        sim.total_ticks() as f64 / elapsed.as_secs_f64()
    );
    match sim.history.all_time_best() {
        Some(best) => println!("Best fitness: {:.0}", best),
        None => println!("Best fitness: n/a"),
    }
    match sim.history.first_win() {
        Some(generation) => println!("First win: generation {}", generation),
        None => println!("First win: none"),
    }

    if let Some(champion) = sim.champion() {
        let path = output.join("champion.bin");
        champion.save(&path)?;
        println!("Champion: {:?}", path);
    }

    let stats_path = output.join("stats_history.json");
    sim.history.save(&stats_path)?;
    println!("Stats history: {:?}", stats_path);

    Ok(())
}

fn replay_champion(config: Config, champion_path: PathBuf, max_ticks: u64) -> Result<(), Box<dyn std::error::Error>> {
    println!("Loading champion: {:?}", champion_path);
    let champion = ChampionGenome::load(&champion_path)?;

    let surface = TrackSurface::default_circuit(&config.track)?;
    let outcome = replay(&config, &surface, champion.to_brain()?, max_ticks)?;

    println!();
    println!("=== Replay ===");
    println!("Ticks: {}", outcome.ticks);
    println!("Fitness: {:.0} (recorded {:.0})", outcome.fitness, champion.fitness);
    println!("Checkpoints: {}", outcome.checkpoints);
    println!("Laps: {}", outcome.laps);
    println!("Finished: {}", outcome.finished);
    println!("Ended by: {:?}", outcome.last_event);

    Ok(())
}

fn generate_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    config.save(&output)?;
    println!("Configuration saved to: {:?}", output);
    Ok(())
}

fn inspect_champion(champion_path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Champion ===");
    println!("File: {:?}", champion_path);
    println!();

    let champion = ChampionGenome::load(&champion_path)?;
    let topology = &champion.topology;

    println!("Version: {}", champion.version);
    println!("Generation: {}", champion.generation);
    println!("Fitness: {:.0}", champion.fitness);
    println!("Laps: {}", champion.laps);
    println!(
        "Topology: {} -> {:?} -> {} ({:?})",
        topology.n_inputs, topology.hidden_sizes, topology.n_outputs, topology.activation
    );
    println!("Parameters: {}", champion.parameters.len());

    let max_abs = champion
        .parameters
        .iter()
        .map(|p| p.abs())
        .fold(0.0f32, f32::max);
    println!("Max |weight|: {:.3}", max_abs);
    println!("Size: {} bytes", champion.size_bytes());

    Ok(())
}

fn run_benchmark(generations: u32, population: usize) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== RACER-EVO Benchmark ===");
    println!("Generations: {}", generations);
    println!("Population: {}", population);
    println!();

    let result = benchmark(generations, population)?;
    println!("{}", result);

    Ok(())
}
