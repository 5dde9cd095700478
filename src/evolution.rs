//! Generational selection and reproduction.

use crate::agent::Agent;
use crate::config::{Config, MutationSettings};
use crate::error::{Result, SimError};
use crate::neural::NeuralNet;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

/// A genome for the next generation and where it came from
#[derive(Clone, Debug)]
pub struct Child {
    pub brain: NeuralNet,
    /// Rank of the parent in the previous generation (0 = best)
    pub parent_rank: usize,
    /// False only for the champion clone
    pub mutated: bool,
}

/// Outcome of one reproduction step
#[derive(Clone, Debug)]
pub struct Reproduction {
    /// The top agent completed a lap
    pub did_win: bool,
    /// Champion first, then the mutated offspring
    pub children: Vec<Child>,
}

impl Reproduction {
    pub fn into_brains(self) -> Vec<NeuralNet> {
        self.children.into_iter().map(|c| c.brain).collect()
    }
}

/// Evolution engine for producing the next population
#[derive(Clone, Debug)]
pub struct EvolutionEngine {
    pub win_mutation: MutationSettings,
    pub explore_mutation: MutationSettings,
    /// Selection weights for the elite pool, best first
    pub elite_weights: Vec<f32>,
}

impl EvolutionEngine {
    /// Create evolution engine from config
    pub fn from_config(config: &Config) -> Self {
        Self {
            win_mutation: config.evolution.win_mutation,
            explore_mutation: config.evolution.explore_mutation,
            elite_weights: config.evolution.elite_weights.clone(),
        }
    }

    /// Agent indices by fitness, best first; ties keep population order
    pub fn rank(agents: &[Agent]) -> Vec<usize> {
        let mut order: Vec<usize> = (0..agents.len()).collect();
        order.sort_by(|&a, &b| agents[b].fitness().total_cmp(&agents[a].fitness()));
        order
    }

    /// A generation is won when its best agent completed a lap
    pub fn did_win(agent: &Agent) -> bool {
        agent.state.laps_completed > 0
    }

    /// Weighted choice over the first `pool` ranks
    pub fn elite_distribution(&self, pool: usize) -> Result<WeightedIndex<f32>> {
        let pool = pool.min(self.elite_weights.len());
        if pool == 0 {
            return Err(SimError::GenerationStarvation("elite pool is empty".to_string()));
        }
        WeightedIndex::new(&self.elite_weights[..pool])
            .map_err(|e| SimError::GenerationStarvation(format!("invalid elite weights: {}", e)))
    }

    /// Build `size` genomes from a finished generation.
    ///
    /// Every agent must already be dead. The champion is cloned unmutated;
    /// after a win the rest are lightly mutated champion clones, otherwise
    /// they are heavily mutated clones of weighted elite parents.
    pub fn reproduce<R: Rng>(&self, agents: &[Agent], size: usize, rng: &mut R) -> Result<Reproduction> {
        debug_assert!(agents.iter().all(|a| !a.is_alive()));

        let ranked = Self::rank(agents);
        let best = match ranked.first() {
            Some(&idx) => &agents[idx],
            None => {
                return Err(SimError::GenerationStarvation(
                    "no agents to reproduce from".to_string(),
                ))
            }
        };
        if size == 0 {
            return Err(SimError::GenerationStarvation(
                "target population size is 0".to_string(),
            ));
        }

        let did_win = Self::did_win(best);
        let champion = best.brain().clone();
        let mut children = Vec::with_capacity(size);

        if did_win {
            for _ in 1..size {
                children.push(Child {
                    brain: champion.mutated(&self.win_mutation, rng),
                    parent_rank: 0,
                    mutated: true,
                });
            }
        } else {
            let dist = self.elite_distribution(ranked.len())?;
            for _ in 1..size {
                let rank = dist.sample(rng);
                let parent = agents[ranked[rank]].brain();
                children.push(Child {
                    brain: parent.mutated(&self.explore_mutation, rng),
                    parent_rank: rank,
                    mutated: true,
                });
            }
        }

        children.insert(
            0,
            Child {
                brain: champion,
                parent_rank: 0,
                mutated: false,
            },
        );

        Ok(Reproduction { did_win, children })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Activation;
    use crate::geometry::{Point, Rect};
    use crate::neural::Topology;
    use crate::sensor::SensorArray;
    use crate::steering::NeuralController;
    use crate::track::{Surface, TrackSurface};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn track() -> TrackSurface {
        TrackSurface::from_fn(100, 100, vec![Rect::new(0.0, 0.0, 10.0, 10.0)], |_, _| Surface::Road).unwrap()
    }

    /// Dead agents with the given fitness values
    fn generation(fitness: &[f32], rng: &mut ChaCha8Rng) -> Vec<Agent> {
        let config = Config::default();
        let track = track();
        let sensor = SensorArray::new(&config.sensor);
        let topo = Topology::new(5, vec![4, 4], 1, Activation::Relu);

        fitness
            .iter()
            .map(|&f| {
                let brain = NeuralNet::random(topo.clone(), rng).unwrap();
                let controller = NeuralController::new(brain, &config.steering);
                let mut agent = Agent::new(controller, Point::new(50.0, 50.0), 0.0, 5.0, &track, &sensor);
                agent.state.fitness = f;
                agent.kill();
                agent
            })
            .collect()
    }

    fn bits(net: &NeuralNet) -> Vec<u32> {
        net.parameters().iter().map(|p| p.to_bits()).collect()
    }

    #[test]
    fn test_rank_is_stable() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let agents = generation(&[10.0, 30.0, 10.0, 30.0, -500.0], &mut rng);
        assert_eq!(EvolutionEngine::rank(&agents), vec![1, 3, 0, 2, 4]);
    }

    #[test]
    fn test_champion_is_bit_identical() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let agents = generation(&[100.0, 3000.0, 2000.0], &mut rng);
        let mut engine = EvolutionEngine::from_config(&Config::default());
        engine.explore_mutation = MutationSettings::NONE;

        let repro = engine.reproduce(&agents, 10, &mut rng).unwrap();
        assert!(!repro.did_win);
        assert_eq!(repro.children.len(), 10);
        assert!(!repro.children[0].mutated);
        assert_eq!(bits(&repro.children[0].brain), bits(agents[1].brain()));

        // With zero mutation every child equals one of its elite parents
        for child in &repro.children {
            let parents: Vec<Vec<u32>> = agents.iter().map(|a| bits(a.brain())).collect();
            assert!(parents.contains(&bits(&child.brain)));
        }
    }

    #[test]
    fn test_win_path_clones_champion() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut agents = generation(&[100.0, 9000.0, 2000.0], &mut rng);
        agents[1].state.laps_completed = 1;

        let engine = EvolutionEngine::from_config(&Config::default());
        let repro = engine.reproduce(&agents, 20, &mut rng).unwrap();

        assert!(repro.did_win);
        assert!(repro.children.iter().all(|c| c.parent_rank == 0));
        assert_eq!(bits(&repro.children[0].brain), bits(agents[1].brain()));

        // Light mutation: every offset is within the win amount
        let champion = agents[1].brain().parameters();
        for child in &repro.children[1..] {
            for (c, p) in child.brain.parameters().iter().zip(champion.iter()) {
                assert!((c - p).abs() <= 0.1 + 1e-5);
            }
        }
    }

    #[test]
    fn test_parents_never_modified() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let agents = generation(&[5.0, 4.0, 3.0, 2.0, 1.0, 0.0], &mut rng);
        let before: Vec<Vec<u32>> = agents.iter().map(|a| bits(a.brain())).collect();

        let engine = EvolutionEngine::from_config(&Config::default());
        let mut repro = engine.reproduce(&agents, 60, &mut rng).unwrap();
        for child in &mut repro.children {
            child.brain.mutate_weights(1.0, 1.0, &mut rng);
        }

        let after: Vec<Vec<u32>> = agents.iter().map(|a| bits(a.brain())).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_selection_frequencies_converge() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let agents = generation(&[50.0, 40.0, 30.0, 20.0, 10.0, 0.0, 0.0], &mut rng);
        let engine = EvolutionEngine::from_config(&Config::default());

        let mut counts = [0usize; 7];
        let mut total = 0;
        for _ in 0..50 {
            let repro = engine.reproduce(&agents, 1001, &mut rng).unwrap();
            for child in repro.children.iter().filter(|c| c.mutated) {
                counts[child.parent_rank] += 1;
                total += 1;
            }
        }

        let expected = [0.50, 0.25, 0.10, 0.10, 0.05];
        for (rank, &p) in expected.iter().enumerate() {
            let observed = counts[rank] as f32 / total as f32;
            assert!((observed - p).abs() < 0.01, "rank {}: {} vs {}", rank, observed, p);
        }
        // Ranks outside the elite pool are never parents
        assert_eq!(counts[5] + counts[6], 0);
    }

    #[test]
    fn test_small_generation_truncates_pool() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let agents = generation(&[1.0, 2.0], &mut rng);
        let engine = EvolutionEngine::from_config(&Config::default());

        let repro = engine.reproduce(&agents, 30, &mut rng).unwrap();
        assert_eq!(repro.children.len(), 30);
        assert!(repro.children.iter().all(|c| c.parent_rank < 2));
    }

    #[test]
    fn test_starvation() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let engine = EvolutionEngine::from_config(&Config::default());

        let err = engine.reproduce(&[], 10, &mut rng).unwrap_err();
        assert!(matches!(err, SimError::GenerationStarvation(_)));

        let mut empty_pool = engine.clone();
        empty_pool.elite_weights.clear();
        let agents = generation(&[1.0], &mut rng);
        let err = empty_pool.reproduce(&agents, 10, &mut rng).unwrap_err();
        assert!(matches!(err, SimError::GenerationStarvation(_)));
    }
}
