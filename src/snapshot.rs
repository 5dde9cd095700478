//! Read-only views of the simulation for a rendering collaborator.
//!
//! These are lightweight copies of simulation state; producing them never
//! touches the simulation itself.

use crate::agent::Agent;
use crate::geometry::Point;
use crate::sensor::RayHit;
use crate::steering::SteeringSource;
use serde::{Deserialize, Serialize};

/// Lightweight view of an agent for rendering
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentView {
    pub position: Point,
    pub heading_degrees: f32,
    pub alive: bool,
    pub fitness: f32,
    pub target_checkpoint: usize,
    /// Rays from the last sensor reading
    pub rays: Vec<RayHit>,
}

impl<S: SteeringSource> From<&Agent<S>> for AgentView {
    fn from(agent: &Agent<S>) -> Self {
        Self {
            position: agent.state.position,
            heading_degrees: agent.state.heading_degrees,
            alive: agent.state.alive,
            fitness: agent.state.fitness,
            target_checkpoint: agent.state.current_target_checkpoint,
            rays: agent.reading().rays.clone(),
        }
    }
}

/// Dashboard figures for the current generation
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationSummary {
    pub generation: u32,
    /// Ticks elapsed in this generation
    pub tick: u64,
    pub alive: usize,
    pub population: usize,
    pub best_fitness: f32,
}

impl GenerationSummary {
    /// Dashboard text, one line per figure
    pub fn lines(&self) -> [String; 3] {
        [
            format!("Gen: {}", self.generation),
            format!("Alive: {}/{}", self.alive, self.population),
            format!("Best: {:.0}", self.best_fitness),
        ]
    }
}

/// Complete per-tick snapshot
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SimulationSnapshot {
    pub summary: GenerationSummary,
    pub agents: Vec<AgentView>,
}

impl SimulationSnapshot {
    /// Only the agents still driving
    pub fn alive_agents(&self) -> impl Iterator<Item = &AgentView> {
        self.agents.iter().filter(|a| a.alive)
    }
}
