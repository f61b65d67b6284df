use thiserror::Error;

use super::{EngineError, FrameStoreError};

/// Possible errors produced while recording graph evaluation
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RecordingError {
    #[error("A recording is already in progress")]
    AlreadyRecording,
    #[error("No recording is in progress")]
    NotRecording,
    #[error("Could not capture the engine's initial state: {0}")]
    InitialState(EngineError),
    #[error(transparent)]
    FrameStore(#[from] FrameStoreError),
}
