use thiserror::Error;

use crate::control_parameters::ControlParamType;

/// Possible errors produced when loading or validating a sync graph definition
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("Could not parse RON: {0}")]
    RonSpannedError(#[from] ron::error::SpannedError),
    #[error("The skeleton has no bones")]
    EmptySkeleton,
    #[error("Bone {bone} has parent {parent}, which is not an earlier bone")]
    InvalidParent { bone: usize, parent: usize },
    #[error("The sync track has no events")]
    EmptySyncTrack,
    #[error("Sync event {0:?} must have a positive duration")]
    NonPositiveDuration(String),
    #[error("Binding refers to missing control parameter {0:?}")]
    MissingParameter(String),
    #[error("Control parameter {name:?} is {found:?}, but the binding requires {expected:?}")]
    BindingType {
        name: String,
        expected: ControlParamType,
        found: ControlParamType,
    },
    #[error("Aim binding refers to missing bone {0:?}")]
    MissingBone(String),
}
