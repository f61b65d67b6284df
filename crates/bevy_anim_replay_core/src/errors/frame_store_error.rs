use thiserror::Error;

use super::EngineError;

#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FrameStoreError {
    #[error("Frame {index} is out of range, the store holds {count} frames")]
    OutOfRange { index: usize, count: usize },
    #[error("The frame store has been finalized and no longer accepts frames")]
    Finalized,
    #[error("Recorded frame does not match the recording's parameter layout: {0}")]
    LayoutMismatch(EngineError),
}
