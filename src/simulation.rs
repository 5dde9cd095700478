//! Training session - the tick loop and the generational cycle.

use crate::agent::Agent;
use crate::champion::ChampionGenome;
use crate::clock::SimulationClock;
use crate::config::Config;
use crate::error::{Result, SimError};
use crate::evolution::EvolutionEngine;
use crate::neural::NeuralNet;
use crate::population::{Population, TickReport};
use crate::progress::{ProgressEvent, ProgressTracker};
use crate::sensor::SensorArray;
use crate::snapshot::{AgentView, GenerationSummary, SimulationSnapshot};
use crate::stats::{GenerationStats, StatsHistory};
use crate::steering::NeuralController;
use crate::track::TrackSurface;
use log::{info, warn};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// What one call to [`Simulation::step`] did
#[derive(Clone, Debug, PartialEq)]
pub enum StepOutcome {
    /// Agents are still driving
    Running(TickReport),
    /// The last agent resolved and the next generation was spawned
    GenerationEnded(GenerationStats),
}

/// A training session: one track, one population, one seeded RNG
pub struct Simulation {
    // Configuration
    pub config: Config,

    // Environment (read-only during ticks)
    surface: TrackSurface,
    sensor: SensorArray,
    tracker: ProgressTracker,

    // Population
    pub population: Population,

    // Evolution
    engine: EvolutionEngine,
    champion: Option<ChampionGenome>,

    // Statistics
    pub history: StatsHistory,

    clock: SimulationClock,

    // Random number generator (seeded for reproducibility)
    rng: ChaCha8Rng,
    seed: u64,
}

impl Simulation {
    /// Create a session on the reference circuit with a random seed
    pub fn new(config: Config) -> Result<Self> {
        let seed = rand::thread_rng().gen();
        Self::new_with_seed(config, seed)
    }

    /// Create a session on the reference circuit with a specific seed
    pub fn new_with_seed(config: Config, seed: u64) -> Result<Self> {
        let surface = TrackSurface::default_circuit(&config.track)?;
        Self::with_track(config, surface, seed)
    }

    /// Create a session on a caller-supplied track
    pub fn with_track(config: Config, surface: TrackSurface, seed: u64) -> Result<Self> {
        config.validate()?;
        config.validate_for_track(&surface)?;

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let sensor = SensorArray::new(&config.sensor);
        let tracker = ProgressTracker::new(&config.progress);
        let engine = EvolutionEngine::from_config(&config);
        let clock = SimulationClock::new(&config.timing);
        let population = Population::random(&config, &surface, &sensor, &mut rng)?;

        info!(
            "session started: {} agents, {} checkpoints, seed {}",
            population.len(),
            surface.checkpoint_count(),
            seed
        );

        Ok(Self {
            config,
            surface,
            sensor,
            tracker,
            population,
            engine,
            champion: None,
            history: StatsHistory::new(),
            clock,
            rng,
            seed,
        })
    }

    /// Advance every agent by one tick, and run the GA once all are dead
    pub fn step(&mut self) -> Result<StepOutcome> {
        self.clock.wait();
        let report = self
            .population
            .tick(&self.surface, &self.sensor, &self.tracker, self.config.timing.parallel);
        self.clock.advance();

        let cap = self.config.evolution.max_generation_ticks;
        if !self.population.is_extinct() && cap > 0 && self.population.ticks >= cap {
            let killed = self.population.kill_all();
            warn!(
                "generation {} hit the {} tick cap, killed {} survivors",
                self.population.generation, cap, killed
            );
        }

        if self.population.is_extinct() {
            return self.end_generation().map(StepOutcome::GenerationEnded);
        }
        Ok(StepOutcome::Running(report))
    }

    /// Record stats, reproduce, and spawn the next generation
    fn end_generation(&mut self) -> Result<GenerationStats> {
        let generation = self.population.generation;
        let stats = GenerationStats::from_agents(generation, self.population.ticks, &self.population.agents);

        let reproduction =
            self.engine
                .reproduce(&self.population.agents, self.config.agents.population, &mut self.rng)?;

        let champion = &reproduction.children[0].brain;
        self.champion = Some(ChampionGenome::from_brain(
            champion,
            generation,
            stats.best_fitness,
            stats.best_laps,
        ));

        if reproduction.did_win {
            info!(
                "generation {} won: champion completed {} lap(s) with fitness {:.0}",
                generation, stats.best_laps, stats.best_fitness
            );
        }
        let interval = self.config.logging.stats_interval.max(1);
        if generation % interval == 0 {
            info!("{}", stats.summary());
        }

        self.population = Population::from_brains(
            reproduction.into_brains(),
            generation + 1,
            &self.config,
            &self.surface,
            &self.sensor,
        )?;
        self.history.record(stats.clone());
        Ok(stats)
    }

    /// Tick until the current generation ends
    pub fn run_generation(&mut self) -> Result<GenerationStats> {
        loop {
            if let StepOutcome::GenerationEnded(stats) = self.step()? {
                return Ok(stats);
            }
        }
    }

    /// Run a number of complete generations
    pub fn run(&mut self, generations: u32) -> Result<()> {
        for _ in 0..generations {
            self.run_generation()?;
        }
        Ok(())
    }

    /// Run generations with a callback after each one
    pub fn run_with_callback<F>(&mut self, generations: u32, mut callback: F) -> Result<()>
    where
        F: FnMut(&Simulation, &GenerationStats),
    {
        for _ in 0..generations {
            let stats = self.run_generation()?;
            callback(self, &stats);
        }
        Ok(())
    }

    /// Read-only view for a renderer
    pub fn snapshot(&self) -> SimulationSnapshot {
        SimulationSnapshot {
            summary: GenerationSummary {
                generation: self.population.generation,
                tick: self.population.ticks,
                alive: self.population.alive_count(),
                population: self.population.len(),
                best_fitness: self.population.best_fitness(),
            },
            agents: self.population.agents.iter().map(AgentView::from).collect(),
        }
    }

    /// Champion of the last finished generation
    pub fn champion(&self) -> Option<&ChampionGenome> {
        self.champion.as_ref()
    }

    pub fn surface(&self) -> &TrackSurface {
        &self.surface
    }

    /// Current 1-based generation number
    pub fn generation(&self) -> u32 {
        self.population.generation
    }

    /// Ticks since the session started
    pub fn total_ticks(&self) -> u64 {
        self.clock.ticks()
    }

    /// Get seed for reproducibility
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

/// Result of driving one genome alone
#[derive(Clone, Debug, PartialEq)]
pub struct ReplayOutcome {
    pub ticks: u64,
    pub fitness: f32,
    pub checkpoints: u32,
    pub laps: u32,
    pub finished: bool,
    /// Event that ended the run, or `None` when the tick limit stopped it
    pub last_event: ProgressEvent,
}

/// Drive a single brain from the start pose until it resolves.
///
/// `max_ticks` of 0 falls back to the generation tick cap; with both at 0
/// the run only ends when the agent dies or finishes.
pub fn replay(config: &Config, surface: &TrackSurface, brain: NeuralNet, max_ticks: u64) -> Result<ReplayOutcome> {
    config.validate_for_track(surface)?;
    let sensor = SensorArray::new(&config.sensor);
    if brain.n_inputs() != sensor.ray_count() {
        return Err(SimError::config(format!(
            "network expects {} inputs but the sensor casts {} rays",
            brain.n_inputs(),
            sensor.ray_count()
        )));
    }

    let tracker = ProgressTracker::new(&config.progress);
    let limit = if max_ticks > 0 {
        max_ticks
    } else {
        config.evolution.max_generation_ticks
    };
    let mut clock = SimulationClock::new(&config.timing);
    let mut agent = Agent::spawn(NeuralController::new(brain, &config.steering), config, surface, &sensor);

    let mut last_event = ProgressEvent::None;
    while agent.is_alive() && (limit == 0 || clock.ticks() < limit) {
        clock.wait();
        let event = agent.tick(surface, &sensor, &tracker);
        if event != ProgressEvent::None {
            last_event = event;
        }
        clock.advance();
    }

    Ok(ReplayOutcome {
        ticks: clock.ticks(),
        fitness: agent.fitness(),
        checkpoints: agent.state.checkpoints_cleared,
        laps: agent.state.laps_completed,
        finished: agent.state.finished,
        last_event: if agent.is_alive() { ProgressEvent::None } else { last_event },
    })
}
