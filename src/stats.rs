//! Per-generation statistics.

use crate::agent::Agent;
use crate::error::Result;
use crate::evolution::EvolutionEngine;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Summary of one finished generation
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    /// 1-based generation number
    pub generation: u32,
    /// Ticks the generation lasted
    pub ticks: u64,
    pub population: usize,
    pub best_fitness: f32,
    pub mean_fitness: f32,
    /// Gates cleared by the best agent
    pub best_checkpoints: u32,
    /// Laps completed by the best agent
    pub best_laps: u32,
    /// Agents that completed the lap quota
    pub finished: usize,
    pub did_win: bool,
}

impl GenerationStats {
    /// Compute stats from a fully resolved generation
    pub fn from_agents(generation: u32, ticks: u64, agents: &[Agent]) -> Self {
        let mut stats = Self {
            generation,
            ticks,
            population: agents.len(),
            ..Self::default()
        };
        if agents.is_empty() {
            return stats;
        }

        let ranked = EvolutionEngine::rank(agents);
        let best = &agents[ranked[0]];

        stats.best_fitness = best.fitness();
        stats.mean_fitness = agents.iter().map(|a| a.fitness()).sum::<f32>() / agents.len() as f32;
        stats.best_checkpoints = best.state.checkpoints_cleared;
        stats.best_laps = best.state.laps_completed;
        stats.finished = agents.iter().filter(|a| a.state.finished).count();
        stats.did_win = EvolutionEngine::did_win(best);
        stats
    }

    /// Format stats as a one-line summary
    pub fn summary(&self) -> String {
        format!(
            "Gen:{:5} | Ticks:{:5} | Best:{:8.0} | Mean:{:8.1} | CP:{:3} | Laps:{:2} | Finished:{:3}{}",
            self.generation,
            self.ticks,
            self.best_fitness,
            self.mean_fitness,
            self.best_checkpoints,
            self.best_laps,
            self.finished,
            if self.did_win { " | WIN" } else { "" }
        )
    }
}

/// Historical statistics tracker
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StatsHistory {
    /// One entry per finished generation
    pub generations: Vec<GenerationStats>,
}

impl StatsHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, stats: GenerationStats) {
        self.generations.push(stats);
    }

    pub fn latest(&self) -> Option<&GenerationStats> {
        self.generations.last()
    }

    /// Best fitness over generations
    pub fn best_fitness_series(&self) -> Vec<(u32, f32)> {
        self.generations
            .iter()
            .map(|s| (s.generation, s.best_fitness))
            .collect()
    }

    /// Highest fitness of any generation so far
    pub fn all_time_best(&self) -> Option<f32> {
        self.generations.iter().map(|s| s.best_fitness).reduce(f32::max)
    }

    /// First generation whose best agent completed a lap
    pub fn first_win(&self) -> Option<u32> {
        self.generations.iter().find(|s| s.did_win).map(|s| s.generation)
    }

    /// Save history to a JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load history from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}
