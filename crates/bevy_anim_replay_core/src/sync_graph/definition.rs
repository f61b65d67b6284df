use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    control_parameters::{ControlParamType, ControlParamValue},
    errors::DefinitionError,
    id::GraphId,
    skeleton::{BoneDefinition, Skeleton},
};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SyncEventDefinition {
    pub id: String,
    /// Seconds
    pub duration: f32,
}

/// Which control parameters drive which part of the graph. Every binding is optional.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ParameterBindings {
    /// `Float`: playback speed multiplier, clamped to be non-negative
    pub speed: Option<String>,
    /// `Float`: amplitude of the procedural sway, in radians
    pub sway: Option<String>,
    /// `Vector`: offset applied to the root bone
    pub offset: Option<String>,
    /// `Bool`: mirror the pose across the character's YZ plane
    pub mirror: Option<String>,
    /// `Target`: what `aim_bone` should point at
    pub aim: Option<String>,
    pub aim_bone: Option<String>,
}

/// Serialized form of a [`SyncGraphDefinition`], as found in `*.syncgraph.ron` files.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncGraphDefinitionSerial {
    #[serde(default = "GraphId::new_random")]
    pub id: GraphId,
    pub skeleton: Vec<BoneDefinition>,
    pub sync_events: Vec<SyncEventDefinition>,
    /// Declared control parameters with their starting values. Order is significant.
    #[serde(default)]
    pub control_parameters: IndexMap<String, ControlParamValue>,
    #[serde(default)]
    pub bindings: ParameterBindings,
    #[serde(default = "default_sway")]
    pub default_sway: f32,
}

fn default_sway() -> f32 {
    0.2
}

/// Bindings resolved to control parameter and bone indices.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct ResolvedBindings {
    pub speed: Option<usize>,
    pub sway: Option<usize>,
    pub offset: Option<usize>,
    pub mirror: Option<usize>,
    pub aim: Option<usize>,
    pub aim_bone: Option<usize>,
}

/// A validated sync graph: a skeleton animated by a procedural cycle that runs over a looping
/// sync track, shaped by control parameters.
#[derive(Clone, Debug)]
pub struct SyncGraphDefinition {
    id: GraphId,
    skeleton: Skeleton,
    event_ids: Vec<String>,
    event_durations: Vec<f32>,
    parameters: IndexMap<String, ControlParamType>,
    parameter_defaults: Vec<ControlParamValue>,
    pub(crate) bindings: ResolvedBindings,
    default_sway: f32,
}

impl SyncGraphDefinition {
    pub fn from_ron_str(source: &str) -> Result<Self, DefinitionError> {
        let serial: SyncGraphDefinitionSerial = ron::de::from_str(source)?;
        Self::from_serial(serial)
    }

    pub fn from_serial(serial: SyncGraphDefinitionSerial) -> Result<Self, DefinitionError> {
        let skeleton = Skeleton::new(serial.skeleton)?;

        if serial.sync_events.is_empty() {
            return Err(DefinitionError::EmptySyncTrack);
        }
        if let Some(event) = serial
            .sync_events
            .iter()
            .find(|event| !(event.duration > 0. && event.duration.is_finite()))
        {
            return Err(DefinitionError::NonPositiveDuration(event.id.clone()));
        }

        let parameters: IndexMap<String, ControlParamType> = serial
            .control_parameters
            .iter()
            .map(|(name, value)| (name.clone(), value.param_type()))
            .collect();
        let parameter_defaults = serial.control_parameters.into_values().collect();
        let bind = |name: &Option<String>, expected: ControlParamType| {
            resolve_parameter(&parameters, name.as_deref(), expected)
        };
        let b = &serial.bindings;
        let bindings = ResolvedBindings {
            speed: bind(&b.speed, ControlParamType::Float)?,
            sway: bind(&b.sway, ControlParamType::Float)?,
            offset: bind(&b.offset, ControlParamType::Vector)?,
            mirror: bind(&b.mirror, ControlParamType::Bool)?,
            aim: bind(&b.aim, ControlParamType::Target)?,
            aim_bone: match &b.aim_bone {
                Some(bone) => Some(
                    skeleton
                        .bone_index(bone)
                        .ok_or_else(|| DefinitionError::MissingBone(bone.clone()))?,
                ),
                None => None,
            },
        };

        let (event_ids, event_durations) = serial
            .sync_events
            .into_iter()
            .map(|event| (event.id, event.duration))
            .unzip();

        Ok(Self {
            id: serial.id,
            skeleton,
            event_ids,
            event_durations,
            parameters,
            parameter_defaults,
            bindings,
            default_sway: serial.default_sway,
        })
    }

    pub fn id(&self) -> GraphId {
        self.id
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    pub fn event_ids(&self) -> &[String] {
        &self.event_ids
    }

    pub fn event_durations(&self) -> &[f32] {
        &self.event_durations
    }

    pub fn parameters(&self) -> &IndexMap<String, ControlParamType> {
        &self.parameters
    }

    pub fn parameter_defaults(&self) -> &[ControlParamValue] {
        &self.parameter_defaults
    }

    pub fn parameter_index(&self, name: &str) -> Option<usize> {
        self.parameters.get_index_of(name)
    }

    pub fn default_sway(&self) -> f32 {
        self.default_sway
    }
}

fn resolve_parameter(
    parameters: &IndexMap<String, ControlParamType>,
    name: Option<&str>,
    expected: ControlParamType,
) -> Result<Option<usize>, DefinitionError> {
    let Some(name) = name else {
        return Ok(None);
    };
    let Some((index, _, found)) = parameters.get_full(name) else {
        return Err(DefinitionError::MissingParameter(name.to_string()));
    };
    if *found != expected {
        return Err(DefinitionError::BindingType {
            name: name.to_string(),
            expected,
            found: *found,
        });
    }
    Ok(Some(index))
}
