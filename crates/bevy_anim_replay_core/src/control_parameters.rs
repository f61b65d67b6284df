use std::fmt;

use bevy::{
    math::Vec3,
    reflect::{Reflect, std_traits::ReflectDefault},
};
use bevy_anim_replay_proc_macros::ValueWrapper;
use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, EngineResult};

#[derive(Reflect, Default, Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[reflect(Default)]
pub enum ControlParamType {
    #[default]
    Bool,
    Id,
    Int,
    Float,
    Vector,
    Target,
}

/// Something a graph can be asked to look at or reach for.
#[derive(Reflect, Default, Clone, Debug, Serialize, Deserialize, PartialEq)]
#[reflect(Default)]
pub enum Target {
    #[default]
    Unset,
    /// A bone of the character's own skeleton, by name
    Bone(String),
    /// A point in world space
    Point(Vec3),
}

impl Target {
    pub fn is_set(&self) -> bool {
        !matches!(self, Target::Unset)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Unset => write!(f, "Unset"),
            Target::Bone(bone) => write!(f, "Bone: {bone}"),
            Target::Point(point) => write!(f, "Point: {}", format_vec3(*point)),
        }
    }
}

/// Value of a single control parameter for one frame.
#[derive(Reflect, Clone, Debug, Serialize, Deserialize, PartialEq, ValueWrapper)]
#[unwrap_error(error(crate::errors::EngineError), variant(MismatchedDataType))]
pub enum ControlParamValue {
    #[trivial_copy]
    Bool(bool),
    /// Empty ids are considered unset
    Id(String),
    #[trivial_copy]
    Int(i32),
    #[trivial_copy]
    Float(f32),
    #[trivial_copy]
    Vector(Vec3),
    Target(Target),
}

impl ControlParamValue {
    pub fn param_type(&self) -> ControlParamType {
        self.into()
    }
}

impl Default for ControlParamValue {
    fn default() -> Self {
        Self::Bool(false)
    }
}

impl From<&ControlParamValue> for ControlParamType {
    fn from(value: &ControlParamValue) -> Self {
        match value {
            ControlParamValue::Bool(_) => ControlParamType::Bool,
            ControlParamValue::Id(_) => ControlParamType::Id,
            ControlParamValue::Int(_) => ControlParamType::Int,
            ControlParamValue::Float(_) => ControlParamType::Float,
            ControlParamValue::Vector(_) => ControlParamType::Vector,
            ControlParamValue::Target(_) => ControlParamType::Target,
        }
    }
}

/// Text shown next to a parameter's label when inspecting a frame.
impl fmt::Display for ControlParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlParamValue::Bool(value) => write!(f, "{}", if *value { "True" } else { "False" }),
            ControlParamValue::Id(id) => write!(f, "{id}"),
            ControlParamValue::Int(value) => write!(f, "{value}"),
            ControlParamValue::Float(value) => write!(f, "{value:.6}"),
            ControlParamValue::Vector(value) => write!(f, "{}", format_vec3(*value)),
            ControlParamValue::Target(target) => write!(f, "{target}"),
        }
    }
}

/// Checks that `values` lines up, position by position, with the `layout` of a graph's
/// control parameters.
pub fn validate_layout(layout: &[ControlParamType], values: &[ControlParamValue]) -> EngineResult<()> {
    if layout.len() != values.len() {
        return Err(EngineError::ParameterCountMismatch {
            expected: layout.len(),
            found: values.len(),
        });
    }

    for (index, (expected, value)) in layout.iter().zip(values).enumerate() {
        let found = value.param_type();
        if *expected != found {
            return Err(EngineError::ParameterTypeMismatch {
                index,
                expected: *expected,
                found,
            });
        }
    }

    Ok(())
}

fn format_vec3(v: Vec3) -> String {
    format!("({:.3}, {:.3}, {:.3})", v.x, v.y, v.z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_check_variant() {
        let value = ControlParamValue::Float(2.5);
        assert_eq!(value.as_float(), Ok(2.5));
        assert_eq!(
            value.as_bool(),
            Err(EngineError::MismatchedDataType(
                "Bool".to_string(),
                "Float".to_string()
            ))
        );
    }

    #[test]
    fn display_labels() {
        assert_eq!(ControlParamValue::Bool(true).to_string(), "True");
        assert_eq!(ControlParamValue::Id(String::new()).to_string(), "");
        assert_eq!(ControlParamValue::Int(-3).to_string(), "-3");
        assert_eq!(ControlParamValue::Float(0.5).to_string(), "0.500000");
        assert_eq!(
            ControlParamValue::Target(Target::Bone("head".into())).to_string(),
            "Bone: head"
        );
        assert_eq!(ControlParamValue::Target(Target::Unset).to_string(), "Unset");
    }

    #[test]
    fn layout_validation() {
        let layout = [ControlParamType::Float, ControlParamType::Bool];
        let good = [ControlParamValue::Float(1.), ControlParamValue::Bool(false)];
        assert_eq!(validate_layout(&layout, &good), Ok(()));

        let swapped = [ControlParamValue::Bool(false), ControlParamValue::Float(1.)];
        assert_eq!(
            validate_layout(&layout, &swapped),
            Err(EngineError::ParameterTypeMismatch {
                index: 0,
                expected: ControlParamType::Float,
                found: ControlParamType::Bool,
            })
        );

        assert_eq!(
            validate_layout(&layout, &good[..1]),
            Err(EngineError::ParameterCountMismatch {
                expected: 2,
                found: 1
            })
        );
    }
}
