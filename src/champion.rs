//! Champion genome persistence.

use crate::error::{Result, SimError};
use crate::neural::{NeuralNet, Topology};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

const MAGIC: &[u8; 4] = b"RCEV";

/// A serialisable champion: topology plus flat parameter list
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChampionGenome {
    /// Version for compatibility checking
    pub version: u32,
    /// Generation the champion was ranked first in
    pub generation: u32,
    pub fitness: f32,
    pub laps: u32,
    pub topology: Topology,
    pub parameters: Vec<f32>,
}

impl ChampionGenome {
    /// Current file version
    pub const VERSION: u32 = 1;

    pub fn from_brain(brain: &NeuralNet, generation: u32, fitness: f32, laps: u32) -> Self {
        Self {
            version: Self::VERSION,
            generation,
            fitness,
            laps,
            topology: brain.topology.clone(),
            parameters: brain.parameters(),
        }
    }

    /// Rebuild the network
    pub fn to_brain(&self) -> Result<NeuralNet> {
        NeuralNet::from_parameters(self.topology.clone(), &self.parameters)
    }

    /// Save to a binary file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        // Write magic bytes for identification
        writer.write_all(MAGIC)?;

        let encoded = bincode::serialize(self)?;
        writer.write_all(&encoded)?;
        writer.flush()?;

        Ok(())
    }

    /// Load from a binary file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(SimError::InvalidFormat("Invalid magic bytes".to_string()));
        }

        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer)?;
        let champion: ChampionGenome = bincode::deserialize(&buffer)?;

        if champion.version != Self::VERSION {
            return Err(SimError::VersionMismatch {
                expected: Self::VERSION,
                found: champion.version,
            });
        }
        if champion.parameters.len() != champion.topology.parameter_count() {
            return Err(SimError::InvalidFormat(format!(
                "topology needs {} parameters, file has {}",
                champion.topology.parameter_count(),
                champion.parameters.len()
            )));
        }

        Ok(champion)
    }

    /// Get approximate size in bytes
    pub fn size_bytes(&self) -> usize {
        bincode::serialized_size(self).unwrap_or(0) as usize + MAGIC.len()
    }
}

/// Keeps the champions of recent generations in a directory
pub struct ChampionArchive {
    /// Base directory for champion files
    pub base_dir: PathBuf,
    /// Maximum files to keep
    pub max_files: usize,
}

impl ChampionArchive {
    pub fn new<P: Into<PathBuf>>(base_dir: P, max_files: usize) -> Result<Self> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self {
            base_dir,
            max_files: max_files.max(1),
        })
    }

    /// Generate champion filename
    pub fn champion_path(&self, generation: u32) -> PathBuf {
        self.base_dir.join(format!("champion_{:06}.bin", generation))
    }

    /// Save a champion and prune old files
    pub fn save(&self, champion: &ChampionGenome) -> Result<PathBuf> {
        let path = self.champion_path(champion.generation);
        champion.save(&path)?;
        self.cleanup()?;
        Ok(path)
    }

    fn entries(&self) -> Result<Vec<std::fs::DirEntry>> {
        let mut entries: Vec<_> = std::fs::read_dir(&self.base_dir)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry
                    .file_name()
                    .to_string_lossy()
                    .starts_with("champion_")
            })
            .collect();
        // Zero-padded names sort by generation
        entries.sort_by_key(|e| e.file_name());
        Ok(entries)
    }

    /// Remove old champions beyond max limit
    fn cleanup(&self) -> Result<()> {
        let entries = self.entries()?;
        if entries.len() > self.max_files {
            let to_remove = entries.len() - self.max_files;
            for entry in entries.into_iter().take(to_remove) {
                std::fs::remove_file(entry.path())?;
            }
        }
        Ok(())
    }

    /// Most recent champion file in the directory
    pub fn find_latest(&self) -> Option<PathBuf> {
        self.entries().ok()?.pop().map(|e| e.path())
    }
}
