use std::path::{Path, PathBuf};

use bevy_anim_replay::core::errors::DefinitionError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Could not read {0}: {1}")]
    Io(PathBuf, std::io::Error),
    #[error("Invalid tool configuration: {0}")]
    Config(#[from] ron::error::SpannedError),
    #[error("Invalid graph definition: {0}")]
    Definition(#[from] DefinitionError),
    #[error("At least {min} frames are needed, got {found}")]
    NotEnoughFrames { min: usize, found: usize },
}

/// Settings of a recording run, read from a `*.ron` file and overridden from the command line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Graph definition to record. The bundled walker graph when unset.
    pub graph: Option<PathBuf>,
    pub frames: usize,
    pub join_frame: Option<usize>,
    pub seed: u64,
    /// Seconds per simulation tick
    pub delta_time: f32,
    /// Control parameters are re-rolled every this many ticks
    pub input_interval: usize,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            graph: None,
            frames: 120,
            join_frame: None,
            seed: 0,
            delta_time: 1. / 30.,
            input_interval: 10,
        }
    }
}

impl ToolConfig {
    pub fn load(path: &Path) -> Result<Self, ToolError> {
        let source = read_to_string(path)?;
        Ok(ron::de::from_str(&source)?)
    }

    /// A join needs at least one frame after it, and a recording with a single frame has none.
    pub fn validate(&self) -> Result<(), ToolError> {
        let min = self.join_frame.map_or(1, |join| join.saturating_add(2));
        if self.frames < min {
            return Err(ToolError::NotEnoughFrames {
                min,
                found: self.frames,
            });
        }
        Ok(())
    }
}

pub fn read_to_string(path: &Path) -> Result<String, ToolError> {
    std::fs::read_to_string(path).map_err(|err| ToolError::Io(path.to_path_buf(), err))
}
