//! Fan of distance rays cast against the track surface.

use crate::config::SensorConfig;
use crate::geometry::Point;
use crate::track::TrackSurface;
use serde::{Deserialize, Serialize};

/// Result of casting a single ray
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RayHit {
    /// Offset from the heading in degrees
    pub offset_degrees: f32,
    /// Travelled distance, a multiple of the step unless capped at max range
    pub distance: f32,
    /// Where the ray stopped
    pub hit_point: Point,
}

/// One hit per configured ray, in configuration order
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub rays: Vec<RayHit>,
}

impl SensorReading {
    /// Ray distances in ray order, as fed to a controller
    pub fn distances(&self) -> Vec<f32> {
        self.rays.iter().map(|r| r.distance).collect()
    }

    pub fn len(&self) -> usize {
        self.rays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rays.is_empty()
    }

    /// Shortest distance seen by any ray
    pub fn min_distance(&self) -> Option<f32> {
        self.rays.iter().map(|r| r.distance).reduce(f32::min)
    }
}

/// Fixed ray layout shared by every agent of a session
#[derive(Clone, Debug)]
pub struct SensorArray {
    offsets: Vec<f32>,
    step: f32,
    max_range: f32,
}

impl SensorArray {
    pub fn new(config: &SensorConfig) -> Self {
        Self {
            offsets: config.ray_offsets.clone(),
            step: config.step,
            max_range: config.max_range,
        }
    }

    /// Number of rays, and so the controller input arity
    #[inline]
    pub fn ray_count(&self) -> usize {
        self.offsets.len()
    }

    #[inline]
    pub fn max_range(&self) -> f32 {
        self.max_range
    }

    /// Cast every ray from `position`
    pub fn sense(&self, position: Point, heading_degrees: f32, surface: &TrackSurface) -> SensorReading {
        let rays = self
            .offsets
            .iter()
            .map(|&offset| self.cast(position, heading_degrees, offset, surface))
            .collect();
        SensorReading { rays }
    }

    /// Walk outward until a non-drivable sample, the world edge or max range
    fn cast(&self, origin: Point, heading_degrees: f32, offset: f32, surface: &TrackSurface) -> RayHit {
        let angle = heading_degrees + offset;
        let mut length = 0.0f32;
        let mut sample = origin;

        while length < self.max_range {
            length = (length + self.step).min(self.max_range);
            sample = origin.advance(angle, length);
            // OffTrack is not drivable, so leaving the world also stops the ray
            if !surface.classify(sample).is_drivable() {
                break;
            }
        }

        RayHit {
            offset_degrees: offset,
            distance: length,
            hit_point: sample,
        }
    }
}
