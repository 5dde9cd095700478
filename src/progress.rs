//! Checkpoint progress, fitness and collision rules.
//!
//! Evaluation order each tick:
//! 1. leaving the road kills the agent and ends evaluation;
//! 2. entering the target gate rewards and advances the target, wrapping to
//!    gate 0 with a lap bonus after the last gate;
//! 3. otherwise, entering the gate two behind the target is backward driving:
//!    a one-off penalty and death.

use crate::agent::AgentState;
use crate::config::ProgressConfig;
use crate::geometry::Point;
use crate::track::TrackSurface;
use serde::{Deserialize, Serialize};

/// What happened to an agent during one evaluation
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum ProgressEvent {
    None,
    /// Left the road or the world
    Crashed,
    /// Cleared gate `index`
    Checkpoint { index: usize },
    /// Cleared the last gate; `finished` when the lap quota is reached
    Lap { laps: u32, finished: bool },
    /// Re-entered gate `index` two behind the target
    Backward { index: usize },
    /// Did not reach the minimum progress in time
    IdleTimeout,
}

impl ProgressEvent {
    /// Does this event end the agent's run?
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProgressEvent::Crashed
                | ProgressEvent::Backward { .. }
                | ProgressEvent::IdleTimeout
                | ProgressEvent::Lap { finished: true, .. }
        )
    }
}

/// Fitness and kill rules shared by every agent of a session
#[derive(Clone, Debug)]
pub struct ProgressTracker {
    checkpoint_reward: f32,
    lap_bonus: f32,
    backward_penalty: f32,
    idle_timeout_ticks: u32,
    min_progress_checkpoint: usize,
    laps_to_finish: u32,
}

impl ProgressTracker {
    pub fn new(config: &ProgressConfig) -> Self {
        Self {
            checkpoint_reward: config.checkpoint_reward,
            lap_bonus: config.lap_bonus,
            backward_penalty: config.backward_penalty,
            idle_timeout_ticks: config.idle_timeout_ticks,
            min_progress_checkpoint: config.min_progress_checkpoint,
            laps_to_finish: config.laps_to_finish,
        }
    }

    /// Apply the collision and checkpoint rules for `position` to `state`
    pub fn evaluate(&self, position: Point, surface: &TrackSurface, state: &mut AgentState) -> ProgressEvent {
        if !state.alive {
            return ProgressEvent::None;
        }

        if !surface.classify(position).is_drivable() {
            state.alive = false;
            return ProgressEvent::Crashed;
        }

        let count = surface.checkpoint_count();
        let target = state.current_target_checkpoint;

        if surface.checkpoints()[target].contains(position) {
            state.fitness += self.checkpoint_reward;
            state.checkpoints_cleared += 1;
            state.current_target_checkpoint += 1;

            if state.current_target_checkpoint >= count {
                state.current_target_checkpoint = 0;
                state.fitness += self.lap_bonus;
                state.laps_completed += 1;

                let finished = state.laps_completed >= self.laps_to_finish;
                if finished {
                    state.alive = false;
                    state.finished = true;
                }
                return ProgressEvent::Lap {
                    laps: state.laps_completed,
                    finished,
                };
            }
            return ProgressEvent::Checkpoint { index: target };
        }

        if let Some(behind) = self.backward_gate(state, count) {
            if surface.checkpoints()[behind].contains(position) {
                state.fitness += self.backward_penalty;
                state.alive = false;
                return ProgressEvent::Backward { index: behind };
            }
        }

        ProgressEvent::None
    }

    /// Gate two behind the target, if backward driving is checked at all.
    ///
    /// On the first lap targets 0 and 1 are never checked. After a lap the
    /// index wraps modulo the gate count, which needs at least three gates so
    /// that the gate behind differs from the target.
    pub fn backward_gate(&self, state: &AgentState, count: usize) -> Option<usize> {
        let target = state.current_target_checkpoint;
        if target > 1 {
            Some(target - 2)
        } else if state.laps_completed > 0 && count > 2 {
            Some((target + count - 2) % count)
        } else {
            None
        }
    }

    /// True once an agent short of the minimum progress has used its tick budget
    pub fn idle_expired(&self, state: &AgentState) -> bool {
        state.laps_completed == 0
            && state.current_target_checkpoint < self.min_progress_checkpoint
            && state.ticks_alive >= self.idle_timeout_ticks
    }
}
