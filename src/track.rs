//! Classified track raster and its ordered checkpoint gates.

use crate::config::TrackConfig;
use crate::error::{Result, SimError};
use crate::geometry::{Point, Rect};

/// Classification of a single point of the world
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Surface {
    Road,
    Obstacle,
    /// Gate marker, passable like road
    Checkpoint,
    /// Returned for queries outside the world extent
    OffTrack,
}

impl Surface {
    /// Can an agent occupy or see through this point?
    #[inline]
    pub fn is_drivable(self) -> bool {
        matches!(self, Surface::Road | Surface::Checkpoint)
    }

    /// Parse an ASCII map character
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '.' => Some(Surface::Road),
            '#' => Some(Surface::Obstacle),
            'C' => Some(Surface::Checkpoint),
            _ => None,
        }
    }

    pub fn char(&self) -> char {
        match self {
            Surface::Road => '.',
            Surface::Obstacle => '#',
            Surface::Checkpoint => 'C',
            Surface::OffTrack => ' ',
        }
    }
}

/// An ordered gate region; `index` is its position in track order
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Checkpoint {
    pub index: usize,
    pub bounds: Rect,
}

impl Checkpoint {
    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        self.bounds.contains(p)
    }
}

/// Centre line of the reference circuit
pub const DEFAULT_CIRCUIT: [(f32, f32); 20] = [
    (150.0, 200.0),
    (500.0, 200.0),
    (900.0, 400.0),
    (1100.0, 400.0),
    (1400.0, 150.0),
    (1700.0, 150.0),
    (1800.0, 300.0),
    (1800.0, 500.0),
    (1600.0, 600.0),
    (1600.0, 800.0),
    (1400.0, 900.0),
    (1100.0, 900.0),
    (1000.0, 700.0),
    (900.0, 700.0),
    (800.0, 900.0),
    (500.0, 900.0),
    (300.0, 700.0),
    (300.0, 500.0),
    (150.0, 400.0),
    (150.0, 200.0),
];

/// Gates of the reference circuit, start/finish first
pub const DEFAULT_GATES: [Rect; 11] = [
    Rect::new(100.0, 150.0, 100.0, 100.0),
    Rect::new(500.0, 150.0, 100.0, 100.0),
    Rect::new(900.0, 350.0, 100.0, 100.0),
    Rect::new(1400.0, 100.0, 100.0, 100.0),
    Rect::new(1750.0, 250.0, 100.0, 100.0),
    Rect::new(1550.0, 550.0, 100.0, 100.0),
    Rect::new(1350.0, 850.0, 100.0, 100.0),
    Rect::new(950.0, 650.0, 100.0, 100.0),
    Rect::new(750.0, 850.0, 100.0, 100.0),
    Rect::new(250.0, 650.0, 100.0, 100.0),
    Rect::new(100.0, 350.0, 100.0, 100.0),
];

/// Immutable classified world shared read-only by all agents
#[derive(Clone, Debug)]
pub struct TrackSurface {
    width: usize,
    height: usize,
    /// Row-major cells, `cells[y * width + x]`
    cells: Vec<Surface>,
    checkpoints: Vec<Checkpoint>,
}

impl TrackSurface {
    /// Build from a raw raster supplied by an external track generator
    pub fn from_grid(
        width: usize,
        height: usize,
        cells: Vec<Surface>,
        gates: Vec<Rect>,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(SimError::config("track dimensions must be > 0"));
        }
        if cells.len() != width * height {
            return Err(SimError::config(format!(
                "track raster has {} cells, expected {}x{}",
                cells.len(),
                width,
                height
            )));
        }
        if gates.is_empty() {
            return Err(SimError::config("checkpoint list is empty"));
        }

        let checkpoints = gates
            .into_iter()
            .enumerate()
            .map(|(index, bounds)| Checkpoint { index, bounds })
            .collect();

        Ok(Self {
            width,
            height,
            cells,
            checkpoints,
        })
    }

    /// Build by classifying every cell with `f(x, y)`
    pub fn from_fn<F>(width: usize, height: usize, gates: Vec<Rect>, f: F) -> Result<Self>
    where
        F: Fn(usize, usize) -> Surface,
    {
        let mut cells = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                cells.push(f(x, y));
            }
        }
        Self::from_grid(width, height, cells, gates)
    }

    /// Parse a map where each character is one unit cell
    /// (`.` road, `#` obstacle, `C` checkpoint marker)
    pub fn from_ascii(text: &str, gates: Vec<Rect>) -> Result<Self> {
        let rows: Vec<&str> = text
            .lines()
            .map(str::trim_end)
            .filter(|l| !l.is_empty())
            .collect();
        let width = rows.first().map(|r| r.chars().count()).unwrap_or(0);

        let mut cells = Vec::with_capacity(width * rows.len());
        for (y, row) in rows.iter().enumerate() {
            if row.chars().count() != width {
                return Err(SimError::InvalidFormat(format!(
                    "row {} has {} cells, expected {}",
                    y,
                    row.chars().count(),
                    width
                )));
            }
            for c in row.chars() {
                let cell = Surface::from_char(c).ok_or_else(|| {
                    SimError::InvalidFormat(format!("unknown map character {:?} in row {}", c, y))
                })?;
                cells.push(cell);
            }
        }

        Self::from_grid(width, rows.len(), cells, gates)
    }

    /// Rasterize a closed thick polyline as road over obstacle ground,
    /// then stamp the gate outlines as checkpoint markers
    pub fn from_polyline(config: &TrackConfig, points: &[Point], gates: Vec<Rect>) -> Result<Self> {
        if points.len() < 2 {
            return Err(SimError::config("track polyline needs at least two points"));
        }
        let (width, height) = (config.width, config.height);
        let half = config.road_width / 2.0;
        let mut cells = vec![Surface::Obstacle; width * height];

        for (i, &a) in points.iter().enumerate() {
            let b = points[(i + 1) % points.len()];

            let x_min = (a.x.min(b.x) - half).floor().max(0.0) as usize;
            let y_min = (a.y.min(b.y) - half).floor().max(0.0) as usize;
            let x_max = ((a.x.max(b.x) + half).ceil().max(0.0) as usize).min(width);
            let y_max = ((a.y.max(b.y) + half).ceil().max(0.0) as usize).min(height);

            for y in y_min..y_max {
                for x in x_min..x_max {
                    let p = Point::new(x as f32, y as f32);
                    if p.distance_to_segment(a, b) <= half {
                        cells[y * width + x] = Surface::Road;
                    }
                }
            }
        }

        for gate in &gates {
            let x_min = gate.x.floor().max(0.0) as usize;
            let y_min = gate.y.floor().max(0.0) as usize;
            let x_max = (gate.right().ceil().max(0.0) as usize).min(width);
            let y_max = (gate.bottom().ceil().max(0.0) as usize).min(height);

            for y in y_min..y_max {
                for x in x_min..x_max {
                    if gate.on_outline(Point::new(x as f32, y as f32), config.checkpoint_outline) {
                        cells[y * width + x] = Surface::Checkpoint;
                    }
                }
            }
        }

        Self::from_grid(width, height, cells, gates)
    }

    /// The reference twenty-point circuit with its eleven gates
    pub fn default_circuit(config: &TrackConfig) -> Result<Self> {
        let points: Vec<Point> = DEFAULT_CIRCUIT.iter().copied().map(Point::from).collect();
        Self::from_polyline(config, &points, DEFAULT_GATES.to_vec())
    }

    /// Strictly inside the world extent
    #[inline]
    pub fn in_bounds(&self, p: Point) -> bool {
        p.x > 0.0 && p.x < self.width as f32 && p.y > 0.0 && p.y < self.height as f32
    }

    /// Classify a point; anything outside the world is `OffTrack`
    #[inline]
    pub fn classify(&self, p: Point) -> Surface {
        if !self.in_bounds(p) {
            return Surface::OffTrack;
        }
        self.cell(p.x as usize, p.y as usize)
    }

    /// Classify a raster cell by integer coordinates
    #[inline]
    pub fn cell(&self, x: usize, y: usize) -> Surface {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Surface::OffTrack
        }
    }

    #[inline]
    pub fn checkpoints(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    #[inline]
    pub fn checkpoint(&self, index: usize) -> Option<&Checkpoint> {
        self.checkpoints.get(index)
    }

    #[inline]
    pub fn checkpoint_count(&self) -> usize {
        self.checkpoints.len()
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Check that agents can spawn at `start`
    pub fn validate_spawn(&self, start: Point) -> Result<()> {
        if !self.classify(start).is_drivable() {
            return Err(SimError::config(format!(
                "start position ({}, {}) is not on the road",
                start.x, start.y
            )));
        }
        Ok(())
    }

    /// Fraction of cells an agent may occupy
    pub fn drivable_fraction(&self) -> f32 {
        let drivable = self.cells.iter().filter(|c| c.is_drivable()).count();
        drivable as f32 / self.cells.len() as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(x: f32, y: f32) -> Rect {
        Rect::new(x, y, 2.0, 2.0)
    }

    #[test]
    fn test_ascii_parsing() {
        let map = "\
#####
#..C#
#####
";
        let track = TrackSurface::from_ascii(map, vec![gate(1.0, 1.0)]).unwrap();
        assert_eq!(track.width(), 5);
        assert_eq!(track.height(), 3);
        assert_eq!(track.cell(1, 1), Surface::Road);
        assert_eq!(track.cell(3, 1), Surface::Checkpoint);
        assert_eq!(track.cell(0, 0), Surface::Obstacle);
    }

    #[test]
    fn test_ascii_rejects_ragged_rows() {
        let map = "###\n##\n";
        let err = TrackSurface::from_ascii(map, vec![gate(0.0, 0.0)]).unwrap_err();
        assert!(matches!(err, SimError::InvalidFormat(_)));
    }

    #[test]
    fn test_empty_checkpoints_rejected() {
        let err = TrackSurface::from_fn(4, 4, Vec::new(), |_, _| Surface::Road).unwrap_err();
        assert!(matches!(err, SimError::Configuration(_)));
    }

    #[test]
    fn test_out_of_bounds_is_off_track() {
        let track = TrackSurface::from_fn(10, 10, vec![gate(0.0, 0.0)], |_, _| Surface::Road).unwrap();
        assert_eq!(track.classify(Point::new(5.0, 5.0)), Surface::Road);
        assert_eq!(track.classify(Point::new(-1.0, 5.0)), Surface::OffTrack);
        assert_eq!(track.classify(Point::new(10.0, 5.0)), Surface::OffTrack);
        assert_eq!(track.classify(Point::new(0.0, 5.0)), Surface::OffTrack);
        assert_eq!(track.classify(Point::new(5.0, 1e9)), Surface::OffTrack);
        assert!(!Surface::OffTrack.is_drivable());
    }

    #[test]
    fn test_checkpoint_indices_follow_insertion_order() {
        let gates = vec![gate(0.0, 0.0), gate(4.0, 0.0), gate(8.0, 0.0)];
        let track = TrackSurface::from_fn(10, 10, gates, |_, _| Surface::Road).unwrap();
        let indices: Vec<usize> = track.checkpoints().iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert!(track.checkpoint(1).unwrap().contains(Point::new(5.0, 1.0)));
    }

    #[test]
    fn test_default_circuit() {
        let config = TrackConfig::default();
        let track = TrackSurface::default_circuit(&config).unwrap();

        assert_eq!(track.checkpoint_count(), 11);
        assert!(track.validate_spawn(Point::new(config.start_x, config.start_y)).is_ok());
        assert!(track.checkpoint(0).unwrap().contains(Point::new(config.start_x, config.start_y)));

        // Centre of a straight is road, the far corner is grass
        assert_eq!(track.classify(Point::new(320.0, 200.0)), Surface::Road);
        assert_eq!(track.classify(Point::new(1000.0, 50.0)), Surface::Obstacle);

        // Gate outline is stamped as a checkpoint marker
        assert_eq!(track.classify(Point::new(500.5, 200.0)), Surface::Checkpoint);

        let fraction = track.drivable_fraction();
        assert!(fraction > 0.1 && fraction < 0.6, "drivable fraction {}", fraction);
    }
}
