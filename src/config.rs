//! Configuration system for training sessions.
//!
//! Supports YAML configuration files with defaults matching the reference
//! circuit. A `Config` is built once per session and passed by reference to
//! every component that needs it.

use crate::error::{Result, SimError};
use crate::geometry::Point;
use crate::track::TrackSurface;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub track: TrackConfig,
    #[serde(default)]
    pub agents: AgentConfig,
    #[serde(default)]
    pub sensor: SensorConfig,
    #[serde(default)]
    pub neural: NeuralConfig,
    #[serde(default)]
    pub steering: SteeringConfig,
    #[serde(default)]
    pub progress: ProgressConfig,
    #[serde(default)]
    pub evolution: EvolutionConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Track geometry and spawn pose
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackConfig {
    /// World width in units
    pub width: usize,
    /// World height in units
    pub height: usize,
    pub start_x: f32,
    pub start_y: f32,
    /// Spawn heading in degrees (0 = +x, clockwise on screen)
    pub start_heading: f32,
    /// Drivable width of the rasterized circuit
    pub road_width: f32,
    /// Thickness of the checkpoint outlines stamped onto the surface
    pub checkpoint_outline: f32,
}

/// Population and motion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Number of agents per generation
    pub population: usize,
    /// Distance travelled per tick
    pub speed: f32,
}

/// Distance sensor geometry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorConfig {
    /// Ray offsets relative to the heading, in degrees
    pub ray_offsets: Vec<f32>,
    /// Distance between samples along a ray
    pub step: f32,
    /// Maximum ray length
    pub max_range: f32,
}

/// Hidden unit nonlinearity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Relu,
    Tanh,
}

/// Controller network topology
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeuralConfig {
    /// Hidden layer widths
    pub hidden_sizes: Vec<usize>,
    pub activation: Activation,
}

/// Steering decision constants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SteeringConfig {
    /// Heading change per tick for a neural turn decision
    pub turn_degrees: f32,
    /// Heading change per tick while a manual key is held
    pub manual_turn_degrees: f32,
    /// Output above this turns positive
    pub upper_threshold: f32,
    /// Output below this turns negative
    pub lower_threshold: f32,
}

/// Fitness rewards and kill rules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressConfig {
    pub checkpoint_reward: f32,
    pub lap_bonus: f32,
    /// Added to fitness (so normally negative) on backward driving
    pub backward_penalty: f32,
    /// Ticks allowed before the minimum progress must be reached
    pub idle_timeout_ticks: u32,
    /// Target checkpoint index an agent must have reached by the idle timeout
    pub min_progress_checkpoint: usize,
    /// Completed laps after which an agent is retired
    pub laps_to_finish: u32,
}

/// Mutation rate and perturbation size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MutationSettings {
    /// Probability of mutating each parameter
    pub rate: f32,
    /// Offsets are drawn uniformly from [-amount, amount]
    pub amount: f32,
}

/// Genetic algorithm configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionConfig {
    /// Applied to champion clones after a winning generation
    pub win_mutation: MutationSettings,
    /// Applied to elite clones after a non-winning generation
    pub explore_mutation: MutationSettings,
    /// Selection weights of the elite pool, best first; its length is the pool size
    pub elite_weights: Vec<f32>,
    /// Survivors are killed after this many ticks in one generation (0 disables)
    pub max_generation_ticks: u64,
}

/// Clock and execution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Ticks per second when pacing in real time
    pub tick_rate: u32,
    /// Sleep between ticks to hold the tick rate
    pub realtime: bool,
    /// Advance agents with rayon
    pub parallel: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Generations between summary log lines
    pub stats_interval: u32,
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            start_x: 150.0,
            start_y: 200.0,
            start_heading: 0.0,
            road_width: 120.0,
            checkpoint_outline: 2.0,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            population: 60,
            speed: 5.0,
        }
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            ray_offsets: vec![-75.0, -45.0, 0.0, 45.0, 75.0],
            step: 5.0,
            max_range: 65.0,
        }
    }
}

impl Default for NeuralConfig {
    fn default() -> Self {
        Self {
            hidden_sizes: vec![16, 16],
            activation: Activation::Relu,
        }
    }
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            turn_degrees: 5.0,
            manual_turn_degrees: 6.0,
            upper_threshold: 0.5,
            lower_threshold: -0.5,
        }
    }
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            checkpoint_reward: 1000.0,
            lap_bonus: 5000.0,
            backward_penalty: -500.0,
            idle_timeout_ticks: 200,
            min_progress_checkpoint: 2,
            laps_to_finish: 1,
        }
    }
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            win_mutation: MutationSettings {
                rate: 0.05,
                amount: 0.1,
            },
            explore_mutation: MutationSettings {
                rate: 0.1,
                amount: 0.5,
            },
            elite_weights: vec![0.50, 0.25, 0.10, 0.10, 0.05],
            max_generation_ticks: 5000,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            realtime: false,
            parallel: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            stats_interval: 1,
            log_level: "info".to_string(),
        }
    }
}

impl MutationSettings {
    /// Settings that leave every parameter untouched
    pub const NONE: MutationSettings = MutationSettings {
        rate: 0.0,
        amount: 0.0,
    };

    fn validate(&self, name: &str) -> Result<()> {
        if !(0.0..=1.0).contains(&self.rate) {
            return Err(SimError::config(format!("{name}.rate must be within [0, 1]")));
        }
        if !(self.amount >= 0.0 && self.amount.is_finite()) {
            return Err(SimError::config(format!("{name}.amount must be >= 0")));
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.track.width == 0 || self.track.height == 0 {
            return Err(SimError::config("track dimensions must be > 0"));
        }
        if self.agents.population == 0 {
            return Err(SimError::config("population must be > 0"));
        }
        if !(self.agents.speed >= 0.0 && self.agents.speed.is_finite()) {
            return Err(SimError::config("speed must be >= 0"));
        }
        if self.sensor.ray_offsets.is_empty() {
            return Err(SimError::config("at least one sensor ray is required"));
        }
        if !(self.sensor.step > 0.0) || !(self.sensor.max_range > 0.0) {
            return Err(SimError::config("sensor step and max_range must be > 0"));
        }
        if self.neural.hidden_sizes.is_empty() || self.neural.hidden_sizes.contains(&0) {
            return Err(SimError::config("hidden layer widths must be non-empty and > 0"));
        }
        if self.steering.lower_threshold > self.steering.upper_threshold {
            return Err(SimError::config(
                "lower_threshold cannot exceed upper_threshold",
            ));
        }
        if self.progress.laps_to_finish == 0 {
            return Err(SimError::config("laps_to_finish must be > 0"));
        }
        self.evolution.win_mutation.validate("win_mutation")?;
        self.evolution.explore_mutation.validate("explore_mutation")?;
        let weights = &self.evolution.elite_weights;
        if weights.is_empty() {
            return Err(SimError::config("elite_weights must not be empty"));
        }
        if weights.iter().any(|w| !(*w >= 0.0 && w.is_finite())) || weights.iter().sum::<f32>() <= 0.0 {
            return Err(SimError::config(
                "elite_weights must be non-negative with a positive sum",
            ));
        }
        if self.timing.tick_rate == 0 {
            return Err(SimError::config("tick_rate must be > 0"));
        }
        Ok(())
    }

    /// Checks that need the built track: gates present, spawn on the road
    pub fn validate_for_track(&self, surface: &TrackSurface) -> Result<()> {
        if surface.checkpoint_count() == 0 {
            return Err(SimError::config("track has no checkpoints"));
        }
        if surface.width() != self.track.width || surface.height() != self.track.height {
            log::warn!(
                "track is {}x{} but config declares {}x{}",
                surface.width(),
                surface.height(),
                self.track.width,
                self.track.height
            );
        }
        surface.validate_spawn(Point::new(self.track.start_x, self.track.start_y))
    }

    /// Number of network inputs implied by the sensor layout
    pub fn input_count(&self) -> usize {
        self.sensor.ray_offsets.len()
    }
}
