//! Parameter mutation by clone-and-perturb.

use super::network::NeuralNet;
use crate::config::MutationSettings;
use rand::Rng;

impl NeuralNet {
    /// Independent copy of this network with mutation applied;
    /// `self` is never modified
    pub fn mutated<R: Rng>(&self, settings: &MutationSettings, rng: &mut R) -> NeuralNet {
        let mut child = self.clone();
        child.mutate_weights(settings.rate, settings.amount, rng);
        child
    }

    /// With probability `rate`, add an offset uniform in [-amount, amount]
    /// to each weight and bias
    pub fn mutate_weights<R: Rng>(&mut self, rate: f32, amount: f32, rng: &mut R) {
        if rate <= 0.0 || amount <= 0.0 {
            return;
        }

        for layer in &mut self.layers {
            layer.weights.mapv_inplace(|w| {
                if rng.gen::<f32>() < rate {
                    w + rng.gen_range(-amount..=amount)
                } else {
                    w
                }
            });

            layer.biases.mapv_inplace(|b| {
                if rng.gen::<f32>() < rate {
                    b + rng.gen_range(-amount..=amount)
                } else {
                    b
                }
            });
        }
    }
}
