//! Fixed-topology feed-forward network and forward propagation.

use crate::config::Activation;
use crate::error::{Result, SimError};
use ndarray::{Array1, Array2};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A single dense layer, `weights` shaped (inputs, outputs)
#[derive(Clone, Debug, PartialEq)]
pub struct Layer {
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
}

/// Layer sizes and nonlinearity of a network
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    pub n_inputs: usize,
    pub hidden_sizes: Vec<usize>,
    pub n_outputs: usize,
    pub activation: Activation,
}

impl Topology {
    pub fn new(n_inputs: usize, hidden_sizes: Vec<usize>, n_outputs: usize, activation: Activation) -> Self {
        Self {
            n_inputs,
            hidden_sizes,
            n_outputs,
            activation,
        }
    }

    /// (inputs, outputs) of every layer in order
    pub fn layer_shapes(&self) -> Vec<(usize, usize)> {
        let mut sizes = Vec::with_capacity(self.hidden_sizes.len() + 2);
        sizes.push(self.n_inputs);
        sizes.extend_from_slice(&self.hidden_sizes);
        sizes.push(self.n_outputs);
        sizes.windows(2).map(|w| (w[0], w[1])).collect()
    }

    /// Total number of weights and biases
    pub fn parameter_count(&self) -> usize {
        self.layer_shapes().iter().map(|(i, o)| i * o + o).sum()
    }

    fn validate(&self) -> Result<()> {
        if self.n_inputs == 0 || self.n_outputs == 0 {
            return Err(SimError::config("network inputs/outputs must be > 0"));
        }
        if self.hidden_sizes.contains(&0) {
            return Err(SimError::config("hidden layer widths must be > 0"));
        }
        Ok(())
    }
}

/// Feed-forward controller network; hidden layers use the configured
/// activation, the output layer is linear
#[derive(Clone, Debug, PartialEq)]
pub struct NeuralNet {
    pub topology: Topology,
    pub layers: Vec<Layer>,
}

impl NeuralNet {
    /// Random network with weights uniform in [-1, 1] and zero biases
    pub fn random<R: Rng>(topology: Topology, rng: &mut R) -> Result<Self> {
        topology.validate()?;
        let layers = topology
            .layer_shapes()
            .into_iter()
            .map(|(n_in, n_out)| Layer {
                weights: Array2::from_shape_fn((n_in, n_out), |_| rng.gen_range(-1.0..=1.0)),
                biases: Array1::zeros(n_out),
            })
            .collect();
        Ok(Self { topology, layers })
    }

    /// Rebuild a network from a flat parameter list (see [`NeuralNet::parameters`])
    pub fn from_parameters(topology: Topology, params: &[f32]) -> Result<Self> {
        topology.validate()?;
        let expected = topology.parameter_count();
        if params.len() != expected {
            return Err(SimError::InvalidFormat(format!(
                "expected {} parameters, found {}",
                expected,
                params.len()
            )));
        }

        let mut offset = 0;
        let mut layers = Vec::with_capacity(topology.hidden_sizes.len() + 1);
        for (n_in, n_out) in topology.layer_shapes() {
            let w_len = n_in * n_out;
            let weights = Array2::from_shape_vec((n_in, n_out), params[offset..offset + w_len].to_vec())
                .map_err(|e| SimError::InvalidFormat(e.to_string()))?;
            offset += w_len;
            let biases = Array1::from_vec(params[offset..offset + n_out].to_vec());
            offset += n_out;
            layers.push(Layer { weights, biases });
        }

        Ok(Self { topology, layers })
    }

    /// Flat parameter list: per layer, row-major weights then biases
    pub fn parameters(&self) -> Vec<f32> {
        let mut params = Vec::with_capacity(self.parameter_count());
        for layer in &self.layers {
            params.extend(layer.weights.iter().copied());
            params.extend(layer.biases.iter().copied());
        }
        params
    }

    /// Perform forward pass through the network
    #[inline]
    pub fn forward(&self, inputs: &[f32]) -> Vec<f32> {
        debug_assert_eq!(inputs.len(), self.topology.n_inputs);

        let mut activation = Array1::from_vec(inputs.to_vec());
        let last = self.layers.len().saturating_sub(1);

        for (i, layer) in self.layers.iter().enumerate() {
            activation = activation.dot(&layer.weights) + &layer.biases;
            if i < last {
                match self.topology.activation {
                    Activation::Relu => activation.mapv_inplace(|x| x.max(0.0)),
                    Activation::Tanh => activation.mapv_inplace(f32::tanh),
                }
            }
        }

        activation.to_vec()
    }

    #[inline]
    pub fn n_inputs(&self) -> usize {
        self.topology.n_inputs
    }

    /// Get total number of parameters (weights + biases)
    pub fn parameter_count(&self) -> usize {
        self.layers
            .iter()
            .map(|l| l.weights.len() + l.biases.len())
            .sum()
    }

    /// Check if network is valid (no NaN/Inf)
    pub fn is_valid(&self) -> bool {
        self.layers.iter().all(|layer| {
            layer.weights.iter().all(|w| w.is_finite()) && layer.biases.iter().all(|b| b.is_finite())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn topology() -> Topology {
        Topology::new(5, vec![16, 16], 1, Activation::Relu)
    }

    #[test]
    fn test_random_network_shape() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let net = NeuralNet::random(topology(), &mut rng).unwrap();

        assert_eq!(net.layers.len(), 3);
        assert_eq!(net.layers[0].weights.dim(), (5, 16));
        assert_eq!(net.layers[2].weights.dim(), (16, 1));
        assert_eq!(net.parameter_count(), 5 * 16 + 16 + 16 * 16 + 16 + 16 + 1);
        assert_eq!(net.parameter_count(), net.topology.parameter_count());
        assert!(net.is_valid());
    }

    #[test]
    fn test_forward_is_deterministic() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let net = NeuralNet::random(topology(), &mut rng).unwrap();
        let inputs = [10.0, 25.0, 65.0, 40.0, 5.0];

        let a = net.forward(&inputs);
        let b = net.forward(&inputs);
        assert_eq!(a.len(), 1);
        assert_eq!(a, b);
        assert!(a[0].is_finite());
    }

    #[test]
    fn test_hand_built_forward() {
        // 2 -> 1 (relu) -> 1 (linear)
        let topo = Topology::new(2, vec![1], 1, Activation::Relu);
        let net = NeuralNet::from_parameters(topo, &[1.0, -1.0, 0.0, -2.0, 0.5]).unwrap();

        // hidden = relu(3 - 1) = 2, out = -2 * 2 + 0.5
        assert_eq!(net.forward(&[3.0, 1.0]), vec![-3.5]);
        // hidden = relu(1 - 3) = 0, out = 0.5
        assert_eq!(net.forward(&[1.0, 3.0]), vec![0.5]);
    }

    #[test]
    fn test_tanh_hidden_units() {
        let topo = Topology::new(1, vec![1], 1, Activation::Tanh);
        let net = NeuralNet::from_parameters(topo, &[100.0, 0.0, 1.0, 0.0]).unwrap();
        let out = net.forward(&[1.0])[0];
        assert!((out - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_parameter_roundtrip() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let net = NeuralNet::random(topology(), &mut rng).unwrap();
        let rebuilt = NeuralNet::from_parameters(net.topology.clone(), &net.parameters()).unwrap();
        assert_eq!(net, rebuilt);
    }

    #[test]
    fn test_parameter_count_mismatch() {
        let err = NeuralNet::from_parameters(topology(), &[0.0; 3]).unwrap_err();
        assert!(matches!(err, SimError::InvalidFormat(_)));
    }
}
