//! Fixed-rate tick clock.

use crate::config::TimingConfig;
use std::time::{Duration, Instant};

/// Counts ticks and, in real-time mode, paces them at the configured rate
#[derive(Clone, Debug)]
pub struct SimulationClock {
    tick_rate: u32,
    realtime: bool,
    ticks: u64,
    next_deadline: Option<Instant>,
}

impl SimulationClock {
    pub fn new(config: &TimingConfig) -> Self {
        Self {
            tick_rate: config.tick_rate.max(1),
            realtime: config.realtime,
            ticks: 0,
            next_deadline: None,
        }
    }

    /// Wall-clock length of one tick
    pub fn tick_duration(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / self.tick_rate as u64)
    }

    /// Block until the next tick is due; returns immediately when not pacing
    pub fn wait(&mut self) {
        if !self.realtime {
            return;
        }
        let now = Instant::now();
        match self.next_deadline {
            Some(deadline) if deadline > now => {
                std::thread::sleep(deadline - now);
                self.next_deadline = Some(deadline + self.tick_duration());
            }
            // Late or first tick: restart the schedule from now
            _ => self.next_deadline = Some(now + self.tick_duration()),
        }
    }

    /// Record one completed tick
    #[inline]
    pub fn advance(&mut self) {
        self.ticks += 1;
    }

    /// Total ticks since the session started
    #[inline]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    #[inline]
    pub fn is_realtime(&self) -> bool {
        self.realtime
    }

    /// Simulated seconds at the configured rate
    pub fn simulated_secs(&self) -> f64 {
        self.ticks as f64 / self.tick_rate as f64
    }
}
