//! Steering sources plugged into an [`Agent`](crate::agent::Agent).
//!
//! An agent's kinematics and progress logic do not depend on who steers it:
//! a trained network or a manual input collaborator are interchangeable.

use crate::config::SteeringConfig;
use crate::neural::NeuralNet;
use crate::sensor::SensorReading;
use serde::{Deserialize, Serialize};

/// Discrete steering decision for one tick
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Turn {
    /// Heading decreases
    Negative,
    Straight,
    /// Heading increases
    Positive,
}

impl Turn {
    /// Signed heading change for a turn of `magnitude` degrees
    #[inline]
    pub fn delta(self, magnitude: f32) -> f32 {
        match self {
            Turn::Negative => -magnitude,
            Turn::Straight => 0.0,
            Turn::Positive => magnitude,
        }
    }
}

/// Anything that turns sensor readings into a heading change
pub trait SteeringSource: Send {
    /// Heading change in degrees to apply this tick
    fn steer(&mut self, reading: &SensorReading) -> f32;
}

/// Network controller with thresholded output
#[derive(Clone, Debug)]
pub struct NeuralController {
    brain: NeuralNet,
    turn_degrees: f32,
    upper_threshold: f32,
    lower_threshold: f32,
}

impl NeuralController {
    pub fn new(brain: NeuralNet, config: &SteeringConfig) -> Self {
        Self {
            brain,
            turn_degrees: config.turn_degrees,
            upper_threshold: config.upper_threshold,
            lower_threshold: config.lower_threshold,
        }
    }

    /// Raw network output for the given ray distances
    pub fn output(&self, distances: &[f32]) -> f32 {
        self.brain.forward(distances).first().copied().unwrap_or(0.0)
    }

    /// Threshold the network output into a turn decision
    pub fn decide(&self, distances: &[f32]) -> Turn {
        let out = self.output(distances);
        if out > self.upper_threshold {
            Turn::Positive
        } else if out < self.lower_threshold {
            Turn::Negative
        } else {
            Turn::Straight
        }
    }

    #[inline]
    pub fn brain(&self) -> &NeuralNet {
        &self.brain
    }

    pub fn into_brain(self) -> NeuralNet {
        self.brain
    }
}

impl SteeringSource for NeuralController {
    fn steer(&mut self, reading: &SensorReading) -> f32 {
        self.decide(&reading.distances()).delta(self.turn_degrees)
    }
}

/// Held-key steering fed by an external input collaborator
#[derive(Clone, Debug)]
pub struct ManualSteering {
    turn_degrees: f32,
    left: bool,
    right: bool,
}

impl ManualSteering {
    pub fn new(config: &SteeringConfig) -> Self {
        Self {
            turn_degrees: config.manual_turn_degrees,
            left: false,
            right: false,
        }
    }

    /// Update which keys are held; holding both cancels out
    pub fn set_input(&mut self, left: bool, right: bool) {
        self.left = left;
        self.right = right;
    }

    pub fn turn(&self) -> Turn {
        match (self.left, self.right) {
            (true, false) => Turn::Negative,
            (false, true) => Turn::Positive,
            _ => Turn::Straight,
        }
    }
}

impl SteeringSource for ManualSteering {
    fn steer(&mut self, _reading: &SensorReading) -> f32 {
        self.turn().delta(self.turn_degrees)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Activation;
    use crate::neural::Topology;

    /// 1 input -> 1 hidden (relu, identity weight) -> linear output `scale * h + bias`
    fn linear_controller(scale: f32, bias: f32) -> NeuralController {
        let topo = Topology::new(1, vec![1], 1, Activation::Relu);
        let net = NeuralNet::from_parameters(topo, &[1.0, 0.0, scale, bias]).unwrap();
        NeuralController::new(net, &SteeringConfig::default())
    }

    #[test]
    fn test_thresholds() {
        let c = linear_controller(1.0, 0.0);
        assert_eq!(c.decide(&[0.6]), Turn::Positive);
        assert_eq!(c.decide(&[0.5]), Turn::Straight);
        assert_eq!(c.decide(&[0.0]), Turn::Straight);

        let c = linear_controller(-1.0, 0.0);
        assert_eq!(c.decide(&[0.6]), Turn::Negative);
        assert_eq!(c.decide(&[0.5]), Turn::Straight);
    }

    #[test]
    fn test_neural_steer_delta() {
        let mut c = linear_controller(0.0, 2.0);
        let reading = SensorReading {
            rays: vec![crate::sensor::RayHit {
                offset_degrees: 0.0,
                distance: 30.0,
                hit_point: Default::default(),
            }],
        };
        assert_eq!(c.steer(&reading), 5.0);
    }

    #[test]
    fn test_manual_steering() {
        let mut manual = ManualSteering::new(&SteeringConfig::default());
        let reading = SensorReading::default();

        assert_eq!(manual.steer(&reading), 0.0);
        manual.set_input(true, false);
        assert_eq!(manual.steer(&reading), -6.0);
        manual.set_input(false, true);
        assert_eq!(manual.steer(&reading), 6.0);
        manual.set_input(true, true);
        assert_eq!(manual.steer(&reading), 0.0);
    }
}
