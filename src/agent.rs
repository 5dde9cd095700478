//! Agent state and per-tick behaviour.

use crate::config::Config;
use crate::geometry::Point;
use crate::neural::NeuralNet;
use crate::progress::{ProgressEvent, ProgressTracker};
use crate::sensor::{SensorArray, SensorReading};
use crate::steering::{NeuralController, SteeringSource};
use crate::track::TrackSurface;
use serde::{Deserialize, Serialize};

/// Kinematic and progress state of one agent
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    pub position: Point,
    pub heading_degrees: f32,
    pub speed: f32,
    pub alive: bool,
    /// Next gate to clear; wraps to 0 after a lap
    pub current_target_checkpoint: usize,
    pub fitness: f32,
    pub ticks_alive: u32,
    pub laps_completed: u32,
    pub checkpoints_cleared: u32,
    /// Retired after completing the lap quota
    pub finished: bool,
}

impl AgentState {
    /// Fresh state at the spawn pose, already inside gate 0 and targeting gate 1
    pub fn spawn(position: Point, heading_degrees: f32, speed: f32) -> Self {
        Self {
            position,
            heading_degrees,
            speed,
            alive: true,
            current_target_checkpoint: 1,
            fitness: 0.0,
            ticks_alive: 0,
            laps_completed: 0,
            checkpoints_cleared: 0,
            finished: false,
        }
    }
}

/// A car: kinematics, sensing and progress, steered by `S`
#[derive(Clone, Debug)]
pub struct Agent<S = NeuralController> {
    pub state: AgentState,
    steering: S,
    reading: SensorReading,
    last_event: ProgressEvent,
}

impl<S: SteeringSource> Agent<S> {
    /// Place an agent at an explicit pose
    pub fn new(
        steering: S,
        position: Point,
        heading_degrees: f32,
        speed: f32,
        surface: &TrackSurface,
        sensor: &SensorArray,
    ) -> Self {
        let mut state = AgentState::spawn(position, heading_degrees, speed);
        // A single-gate track targets gate 0 directly
        state.current_target_checkpoint %= surface.checkpoint_count();
        let reading = sensor.sense(position, heading_degrees, surface);

        Self {
            state,
            steering,
            reading,
            last_event: ProgressEvent::None,
        }
    }

    /// Place an agent at the configured start pose
    pub fn spawn(steering: S, config: &Config, surface: &TrackSurface, sensor: &SensorArray) -> Self {
        Self::new(
            steering,
            Point::new(config.track.start_x, config.track.start_y),
            config.track.start_heading,
            config.agents.speed,
            surface,
            sensor,
        )
    }

    /// Advance one tick: steer, move, evaluate, idle check, re-sense.
    /// Dead agents are left untouched.
    pub fn tick(&mut self, surface: &TrackSurface, sensor: &SensorArray, tracker: &ProgressTracker) -> ProgressEvent {
        if !self.state.alive {
            return ProgressEvent::None;
        }

        self.state.ticks_alive += 1;
        let delta = self.steering.steer(&self.reading);
        self.state.heading_degrees = (self.state.heading_degrees + delta).rem_euclid(360.0);
        self.state.position = self
            .state
            .position
            .advance(self.state.heading_degrees, self.state.speed);

        let mut event = tracker.evaluate(self.state.position, surface, &mut self.state);
        // Idle budget is checked after the move, so the final budgeted move can still score
        if self.state.alive && tracker.idle_expired(&self.state) {
            self.state.alive = false;
            event = ProgressEvent::IdleTimeout;
        }
        if self.state.alive {
            self.reading = sensor.sense(self.state.position, self.state.heading_degrees, surface);
        }

        self.last_event = event;
        event
    }

    /// Force the agent out of the current generation
    pub fn kill(&mut self) {
        self.state.alive = false;
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.state.alive
    }

    #[inline]
    pub fn fitness(&self) -> f32 {
        self.state.fitness
    }

    /// Sensor reading taken at the end of the last tick
    #[inline]
    pub fn reading(&self) -> &SensorReading {
        &self.reading
    }

    #[inline]
    pub fn last_event(&self) -> ProgressEvent {
        self.last_event
    }

    #[inline]
    pub fn steering(&self) -> &S {
        &self.steering
    }

    #[inline]
    pub fn steering_mut(&mut self) -> &mut S {
        &mut self.steering
    }
}

impl Agent<NeuralController> {
    /// The genome driving this agent
    #[inline]
    pub fn brain(&self) -> &NeuralNet {
        self.steering.brain()
    }
}
