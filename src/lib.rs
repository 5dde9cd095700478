//! # RACER-EVO
//!
//! Neuroevolution of steering controllers for cars on a checkpoint track.
//!
//! ## Features
//!
//! - **Simple GA**: elite-weighted selection with champion carry-over
//! - **Parallel**: agents tick independently via Rayon
//! - **Configurable**: YAML configuration files
//! - **Reproducible**: seeded random number generation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use racer_evo::{Config, Simulation};
//!
//! let mut sim = Simulation::new_with_seed(Config::default(), 7).unwrap();
//!
//! // Run twenty generations
//! sim.run(20).unwrap();
//!
//! for stats in &sim.history.generations {
//!     println!("{}", stats.summary());
//! }
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use racer_evo::Config;
//!
//! let mut config = Config::default();
//! config.agents.population = 100;
//! config.evolution.explore_mutation.rate = 0.2;
//! assert!(config.validate().is_ok());
//! ```
//!
//! ## Champions
//!
//! ```rust,no_run
//! use racer_evo::{Config, Simulation};
//! use racer_evo::champion::ChampionGenome;
//!
//! let mut sim = Simulation::new(Config::default()).unwrap();
//! sim.run(50).unwrap();
//!
//! if let Some(champion) = sim.champion() {
//!     champion.save("champion.bin").unwrap();
//! }
//!
//! let loaded = ChampionGenome::load("champion.bin").unwrap();
//! let brain = loaded.to_brain().unwrap();
//! ```

pub mod agent;
pub mod champion;
pub mod clock;
pub mod config;
pub mod error;
pub mod evolution;
pub mod geometry;
pub mod neural;
pub mod population;
pub mod progress;
pub mod sensor;
pub mod simulation;
pub mod snapshot;
pub mod stats;
pub mod steering;
pub mod track;

// Re-export main types
pub use agent::{Agent, AgentState};
pub use config::Config;
pub use error::{Result, SimError};
pub use simulation::{replay, ReplayOutcome, Simulation, StepOutcome};
pub use steering::{ManualSteering, NeuralController, SteeringSource};
pub use track::TrackSurface;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run a quick benchmark on the reference circuit
pub fn benchmark(generations: u32, population: usize) -> Result<BenchmarkResult> {
    use std::time::Instant;

    let mut config = Config::default();
    config.agents.population = population;
    config.timing.realtime = false;

    let mut sim = Simulation::new_with_seed(config, 0)?;

    let start = Instant::now();
    sim.run(generations)?;
    let elapsed = start.elapsed();

    Ok(BenchmarkResult {
        generations,
        population,
        ticks: sim.total_ticks(),
        elapsed_secs: elapsed.as_secs_f64(),
        ticks_per_second: sim.total_ticks() as f64 / elapsed.as_secs_f64(),
        best_fitness: sim.history.all_time_best(),
    })
}

/// Benchmark result
#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    pub generations: u32,
    pub population: usize,
    pub ticks: u64,
    pub elapsed_secs: f64,
    pub ticks_per_second: f64,
    /// `None` when no generation finished
    pub best_fitness: Option<f32>,
}

impl std::fmt::Display for BenchmarkResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Benchmark Results ===")?;
        writeln!(f, "Generations: {}", self.generations)?;
        writeln!(f, "Population: {}", self.population)?;
        writeln!(f, "Ticks: {}", self.ticks)?;
        writeln!(f, "Time: {:.3}s", self.elapsed_secs)?;
        writeln!(f, "Speed: {:.1} ticks/s", self.ticks_per_second)?;
        match self.best_fitness {
            Some(best) => writeln!(f, "Best fitness: {:.0}", best)?,
            None => writeln!(f, "Best fitness: n/a")?,
        }
        Ok(())
    }
}
