use bevy::reflect::Reflect;
use thiserror::Error;

use crate::control_parameters::ControlParamType;

/// Possible errors reported by a graph engine or task system
#[non_exhaustive]
#[derive(Debug, Error, Reflect, Clone, PartialEq)]
pub enum EngineError {
    #[error("Tried to read control parameter as {0}, but it holds {1}")]
    MismatchedDataType(String, String),
    #[error("Expected {expected} control parameter values, got {found}")]
    ParameterCountMismatch { expected: usize, found: usize },
    #[error("Control parameter {index} should be {expected:?}, got {found:?}")]
    ParameterTypeMismatch {
        index: usize,
        expected: ControlParamType,
        found: ControlParamType,
    },
    #[error("Control parameter index {0} does not exist")]
    UnknownParameter(usize),
    #[error("There is no control parameter named {0:?}")]
    UnknownParameterName(String),
    #[error("Could not encode engine data: {0}")]
    Encode(String),
    #[error("Could not decode engine data: {0}")]
    Decode(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
