//! Neural network module for agent controllers.
//!
//! Implements fixed-topology feed-forward networks with:
//! - Dense layer representation
//! - Flat parameter export and import
//! - Clone-and-perturb weight mutation

mod mutations;
mod network;

pub use network::{Layer, NeuralNet, Topology};
