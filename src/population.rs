//! One generation of neural-controlled agents.

use crate::agent::Agent;
use crate::config::Config;
use crate::error::{Result, SimError};
use crate::neural::{NeuralNet, Topology};
use crate::progress::{ProgressEvent, ProgressTracker};
use crate::sensor::SensorArray;
use crate::steering::NeuralController;
use crate::track::TrackSurface;
use rand::Rng;
use rayon::prelude::*;

/// Counts of the notable events of one tick
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub alive: usize,
    pub checkpoints: usize,
    pub laps: usize,
    pub deaths: usize,
}

/// The agents of the current generation, in fixed enumeration order
pub struct Population {
    pub agents: Vec<Agent>,
    /// 1-based generation number
    pub generation: u32,
    /// Ticks elapsed in this generation
    pub ticks: u64,
}

impl Population {
    /// Controller topology implied by the configuration
    pub fn topology(config: &Config) -> Topology {
        Topology::new(
            config.input_count(),
            config.neural.hidden_sizes.clone(),
            1,
            config.neural.activation,
        )
    }

    /// First generation with freshly initialised random brains
    pub fn random<R: Rng>(
        config: &Config,
        surface: &TrackSurface,
        sensor: &SensorArray,
        rng: &mut R,
    ) -> Result<Self> {
        let topology = Self::topology(config);
        let brains = (0..config.agents.population)
            .map(|_| NeuralNet::random(topology.clone(), rng))
            .collect::<Result<Vec<_>>>()?;
        Self::from_brains(brains, 1, config, surface, sensor)
    }

    /// Spawn one agent per brain at the start pose
    pub fn from_brains(
        brains: Vec<NeuralNet>,
        generation: u32,
        config: &Config,
        surface: &TrackSurface,
        sensor: &SensorArray,
    ) -> Result<Self> {
        if brains.is_empty() {
            return Err(SimError::config("population must be > 0"));
        }
        if let Some(bad) = brains.iter().find(|b| b.n_inputs() != sensor.ray_count()) {
            return Err(SimError::config(format!(
                "network expects {} inputs but the sensor casts {} rays",
                bad.n_inputs(),
                sensor.ray_count()
            )));
        }

        let agents = brains
            .into_iter()
            .map(|brain| {
                let controller = NeuralController::new(brain, &config.steering);
                Agent::spawn(controller, config, surface, sensor)
            })
            .collect();

        Ok(Self {
            agents,
            generation,
            ticks: 0,
        })
    }

    /// Advance every live agent by one tick
    pub fn tick(
        &mut self,
        surface: &TrackSurface,
        sensor: &SensorArray,
        tracker: &ProgressTracker,
        parallel: bool,
    ) -> TickReport {
        let events: Vec<ProgressEvent> = if parallel {
            self.agents
                .par_iter_mut()
                .map(|agent| agent.tick(surface, sensor, tracker))
                .collect()
        } else {
            self.agents
                .iter_mut()
                .map(|agent| agent.tick(surface, sensor, tracker))
                .collect()
        };
        self.ticks += 1;

        let mut report = TickReport::default();
        for (idx, event) in events.iter().enumerate() {
            match *event {
                ProgressEvent::None => {}
                ProgressEvent::Checkpoint { index } => {
                    report.checkpoints += 1;
                    log::debug!(
                        "gen {} agent {}: checkpoint {} (fitness {})",
                        self.generation,
                        idx,
                        index,
                        self.agents[idx].fitness()
                    );
                }
                ProgressEvent::Lap { laps, finished } => {
                    report.laps += 1;
                    log::debug!(
                        "gen {} agent {}: lap {} completed{}",
                        self.generation,
                        idx,
                        laps,
                        if finished { ", retired" } else { "" }
                    );
                }
                ProgressEvent::Backward { index } => {
                    log::debug!(
                        "gen {} agent {}: drove backward into checkpoint {}",
                        self.generation,
                        idx,
                        index
                    );
                }
                ProgressEvent::IdleTimeout => {
                    log::debug!("gen {} agent {}: idle timeout", self.generation, idx);
                }
                ProgressEvent::Crashed => {}
            }
            if event.is_terminal() {
                report.deaths += 1;
            }
        }
        report.alive = self.alive_count();
        report
    }

    /// Number of agents still driving
    pub fn alive_count(&self) -> usize {
        self.agents.iter().filter(|a| a.is_alive()).count()
    }

    /// Check if every agent has resolved
    pub fn is_extinct(&self) -> bool {
        self.alive_count() == 0
    }

    /// Highest fitness so far; the first agent wins ties
    pub fn best(&self) -> Option<&Agent> {
        self.agents
            .iter()
            .reduce(|best, a| if a.fitness() > best.fitness() { a } else { best })
    }

    pub fn best_fitness(&self) -> f32 {
        self.best().map(|a| a.fitness()).unwrap_or(0.0)
    }

    /// Kill every survivor, returning how many were alive
    pub fn kill_all(&mut self) -> usize {
        let mut killed = 0;
        for agent in self.agents.iter_mut().filter(|a| a.is_alive()) {
            agent.kill();
            killed += 1;
        }
        killed
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
