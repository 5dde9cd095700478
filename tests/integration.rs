//! Integration tests for RACER-EVO

use racer_evo::champion::ChampionGenome;
use racer_evo::geometry::{Point, Rect};
use racer_evo::progress::{ProgressEvent, ProgressTracker};
use racer_evo::sensor::SensorArray;
use racer_evo::track::Surface;
use racer_evo::{replay, Agent, Config, ManualSteering, SimError, Simulation, TrackSurface};

fn small_config() -> Config {
    let mut config = Config::default();
    config.agents.population = 16;
    config.neural.hidden_sizes = vec![8, 8];
    config.evolution.max_generation_ticks = 600;
    config
}

/// Open 200x100 road, gate 0 around the start and gate 1 further right
fn two_gate_track() -> TrackSurface {
    let gates = vec![Rect::new(0.0, 0.0, 100.0, 100.0), Rect::new(150.0, 0.0, 20.0, 100.0)];
    TrackSurface::from_fn(200, 100, gates, |_, _| Surface::Road).unwrap()
}

#[test]
fn test_full_training_cycle() {
    let mut sim = Simulation::new_with_seed(small_config(), 12345).unwrap();
    sim.run(4).unwrap();

    assert_eq!(sim.generation(), 5);
    assert_eq!(sim.history.generations.len(), 4);
    for (i, stats) in sim.history.generations.iter().enumerate() {
        assert_eq!(stats.generation, i as u32 + 1);
        assert_eq!(stats.population, 16);
        assert!(stats.ticks <= 600);
        assert!(stats.best_fitness >= stats.mean_fitness);
    }

    // Fresh generation: everyone alive at the start pose with a valid brain
    for agent in &sim.population.agents {
        assert!(agent.is_alive());
        assert!(agent.brain().is_valid());
        assert_eq!(agent.state.position, Point::new(150.0, 200.0));
    }
}

#[test]
fn test_seed_reproducibility() {
    let mut a = Simulation::new_with_seed(small_config(), 777).unwrap();
    let mut b = Simulation::new_with_seed(small_config(), 777).unwrap();

    a.run(3).unwrap();
    b.run(3).unwrap();

    assert_eq!(a.history.generations, b.history.generations);
    for (x, y) in a.population.agents.iter().zip(b.population.agents.iter()) {
        assert_eq!(x.brain(), y.brain());
    }
}

#[test]
fn test_parallel_matches_serial() {
    let mut serial_config = small_config();
    serial_config.timing.parallel = false;

    let mut serial = Simulation::new_with_seed(serial_config, 99).unwrap();
    let mut parallel = Simulation::new_with_seed(small_config(), 99).unwrap();
    serial.run(2).unwrap();
    parallel.run(2).unwrap();

    assert_eq!(serial.history.generations, parallel.history.generations);
}

#[test]
fn test_champion_persistence_and_replay() {
    let config = small_config();
    let mut sim = Simulation::new_with_seed(config.clone(), 2024).unwrap();
    sim.run(2).unwrap();

    let champion = sim.champion().expect("champion after two generations").clone();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("champion.bin");
    champion.save(&path).unwrap();

    let loaded = ChampionGenome::load(&path).unwrap();
    assert_eq!(loaded, champion);
    assert_eq!(loaded.generation, 2);

    // The same genome on the same track scores the same
    let outcome = replay(&config, sim.surface(), loaded.to_brain().unwrap(), 0).unwrap();
    assert_eq!(outcome.fitness, champion.fitness);
    assert_eq!(outcome.laps, champion.laps);
}

#[test]
fn test_two_checkpoint_lap() {
    let track = two_gate_track();
    let config = Config::default();
    let sensor = SensorArray::new(&config.sensor);
    let tracker = ProgressTracker::new(&config.progress);

    // One tick from gate 1
    let steering = ManualSteering::new(&config.steering);
    let mut agent = Agent::new(steering, Point::new(148.0, 50.0), 0.0, 5.0, &track, &sensor);
    assert_eq!(agent.state.current_target_checkpoint, 1);

    let event = agent.tick(&track, &sensor, &tracker);
    assert_eq!(event, ProgressEvent::Lap { laps: 1, finished: true });
    assert_eq!(agent.fitness(), 1000.0 + 5000.0);
    assert_eq!(agent.state.current_target_checkpoint, 0);
    assert!(agent.state.finished);
    assert!(!agent.is_alive());
}

#[test]
fn test_idle_generation_ends_on_timeout() {
    let mut config = small_config();
    config.agents.speed = 0.0;
    config.track.start_x = 50.0;
    config.track.start_y = 50.0;

    let mut sim = Simulation::with_track(config, two_gate_track(), 5).unwrap();
    let stats = sim.run_generation().unwrap();

    assert_eq!(stats.ticks, 200);
    assert_eq!(stats.best_fitness, 0.0);
    assert!(!stats.did_win);
    assert_eq!(sim.generation(), 2);
}

#[test]
fn test_manual_drive_on_reference_circuit() {
    let config = Config::default();
    let track = TrackSurface::default_circuit(&config.track).unwrap();
    let sensor = SensorArray::new(&config.sensor);
    let tracker = ProgressTracker::new(&config.progress);

    let mut agent = Agent::spawn(ManualSteering::new(&config.steering), &config, &track, &sensor);

    // Straight ahead clears gate 1, then runs off where the road bends
    let mut events = Vec::new();
    while agent.is_alive() {
        let event = agent.tick(&track, &sensor, &tracker);
        if event != ProgressEvent::None {
            events.push(event);
        }
    }

    assert_eq!(events, vec![ProgressEvent::Checkpoint { index: 1 }, ProgressEvent::Crashed]);
    assert_eq!(agent.fitness(), 1000.0);
    assert!(agent.state.position.x > 600.0);
}

#[test]
fn test_ascii_track_obstacle() {
    let map = "\
##########
#........#
#........#
#........#
##########";
    let track = TrackSurface::from_ascii(map, vec![Rect::new(1.0, 1.0, 2.0, 3.0)]).unwrap();
    let config = Config::default();
    let sensor = SensorArray::new(&config.sensor);
    let tracker = ProgressTracker::new(&config.progress);

    let steering = ManualSteering::new(&config.steering);
    let mut agent = Agent::new(steering, Point::new(2.0, 2.0), 0.0, 2.0, &track, &sensor);

    // Single gate: spawn targets gate 0
    assert_eq!(agent.state.current_target_checkpoint, 0);

    let mut ticks = 0;
    while agent.is_alive() {
        agent.tick(&track, &sensor, &tracker);
        ticks += 1;
    }
    assert_eq!(agent.last_event(), ProgressEvent::Crashed);
    // x = 4, 6, 8 are road; x = 10 is outside the map
    assert_eq!(ticks, 4);
}

#[test]
fn test_out_of_world_is_off_track() {
    let track = two_gate_track();
    assert_eq!(track.classify(Point::new(-5.0, 10.0)), Surface::OffTrack);
    assert_eq!(track.classify(Point::new(10.0, 100.0)), Surface::OffTrack);
    assert_eq!(track.classify(Point::new(10.0, 10.0)), Surface::Road);
}

#[test]
fn test_start_off_road_rejected() {
    let mut config = small_config();
    config.track.start_x = 5.0;
    config.track.start_y = 5.0;

    let result = Simulation::new_with_seed(config, 1);
    assert!(matches!(result, Err(SimError::Configuration(_))));
}

#[test]
fn test_fitness_only_drops_on_backward_gate() {
    let gates = vec![
        Rect::new(0.0, 0.0, 50.0, 300.0),
        Rect::new(100.0, 0.0, 50.0, 300.0),
        Rect::new(200.0, 0.0, 50.0, 300.0),
        Rect::new(400.0, 0.0, 50.0, 300.0),
        Rect::new(500.0, 0.0, 50.0, 300.0),
    ];
    let track = TrackSurface::from_fn(600, 300, gates, |_, _| Surface::Road).unwrap();
    let config = Config::default();
    let sensor = SensorArray::new(&config.sensor);
    let tracker = ProgressTracker::new(&config.progress);

    let steering = ManualSteering::new(&config.steering);
    let mut agent = Agent::new(steering, Point::new(25.0, 150.0), 0.0, 5.0, &track, &sensor);

    // Clear gates 1 and 2, U-turn short of gate 3, then drive back into gate 1
    let mut saw_backward = false;
    let mut ticks = 0;
    while agent.is_alive() && ticks < 1000 {
        let turning = agent.state.current_target_checkpoint == 3
            && agent.state.position.x > 255.0
            && agent.state.heading_degrees < 180.0;
        agent.steering_mut().set_input(false, turning);

        let before = agent.fitness();
        let event = agent.tick(&track, &sensor, &tracker);
        let after = agent.fitness();
        ticks += 1;

        match event {
            ProgressEvent::Backward { index } => {
                assert_eq!(index, 1);
                assert_eq!(after, before - 500.0);
                saw_backward = true;
            }
            _ => assert!(after >= before, "fitness fell from {} to {} on {:?}", before, after, event),
        }
    }

    assert!(saw_backward);
    assert!(!agent.is_alive());
    assert_eq!(agent.state.checkpoints_cleared, 2);
    assert_eq!(agent.fitness(), 1500.0);
}
