use thiserror::Error;

use super::{EngineError, FrameStoreError};

/// Possible errors produced when replaying a recording
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReplayError {
    #[error("There is no recorded data to replay")]
    NoRecordedData,
    #[error("The recording is still in progress")]
    RecordingInProgress,
    #[error("The recording has no initial state")]
    MissingInitialState,
    #[error(
        "Cannot join in progress at frame {join_frame}: it must be lower than {}",
        frame_count.saturating_sub(1)
    )]
    JoinFrameOutOfRange {
        join_frame: usize,
        frame_count: usize,
    },
    #[error("The engine no longer matches the recording, the recording must be discarded: {0}")]
    EngineDesync(EngineError),
    #[error("Engine failed during replay: {0}")]
    Engine(#[from] EngineError),
    #[error(transparent)]
    FrameStore(#[from] FrameStoreError),
}

impl ReplayError {
    /// Whether the recorded data can no longer be trusted and must be reset.
    pub fn invalidates_recording(&self) -> bool {
        matches!(self, ReplayError::EngineDesync(_))
    }
}

pub type ReplayResult<T> = Result<T, ReplayError>;
