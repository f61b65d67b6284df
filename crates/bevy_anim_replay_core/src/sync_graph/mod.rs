//! A small deterministic graph runtime: a procedural cycle driven by a looping sync track and a
//! handful of control parameters. It implements the engine seam so recordings can be made and
//! replayed without an external animation runtime.

mod definition;
mod instance;
mod task_system;
pub mod tasks;

use std::sync::Arc;

pub use definition::*;
pub use instance::*;
pub use task_system::*;

use crate::{engine::GraphVariation, id::GraphId};

/// Source of the bundled `walker.syncgraph.ron` definition.
pub const WALKER_GRAPH_RON: &str = include_str!("../../assets/walker.syncgraph.ron");

/// Creates [`SyncGraphInstance`]s and [`SyncTaskSystem`]s from a shared definition.
#[derive(Clone, Debug)]
pub struct SyncGraphVariation {
    definition: Arc<SyncGraphDefinition>,
}

impl SyncGraphVariation {
    pub fn new(definition: impl Into<Arc<SyncGraphDefinition>>) -> Self {
        Self {
            definition: definition.into(),
        }
    }

    pub fn definition(&self) -> &Arc<SyncGraphDefinition> {
        &self.definition
    }
}

impl GraphVariation for SyncGraphVariation {
    type Instance = SyncGraphInstance;
    type Tasks = SyncTaskSystem;

    fn graph_id(&self) -> GraphId {
        self.definition.id()
    }

    fn instantiate(&self, user_id: u64) -> SyncGraphInstance {
        SyncGraphInstance::new(self.definition.clone(), user_id)
    }

    fn create_task_system(&self) -> SyncTaskSystem {
        SyncTaskSystem::new(self.definition.clone())
    }
}

#[cfg(test)]
pub(crate) fn test_serial() -> SyncGraphDefinitionSerial {
    use bevy::math::Vec3;

    use crate::{
        control_parameters::{ControlParamValue, Target},
        pose::BonePose,
        skeleton::BoneDefinition,
    };

    let bone = |name: &str, parent: Option<usize>, y: f32| BoneDefinition {
        name: name.to_string(),
        parent,
        reference: BonePose {
            translation: Vec3::new(0., y, 0.),
            ..Default::default()
        },
    };

    SyncGraphDefinitionSerial {
        id: GraphId::new_random(),
        skeleton: vec![
            bone("root", None, 1.),
            bone("spine", Some(0), 0.3),
            bone("head", Some(1), 0.4),
            bone("arm_l", Some(1), 0.2),
        ],
        sync_events: vec![
            SyncEventDefinition {
                id: "left_foot_down".to_string(),
                duration: 0.4,
            },
            SyncEventDefinition {
                id: "right_foot_down".to_string(),
                duration: 0.6,
            },
        ],
        control_parameters: [
            ("speed", ControlParamValue::Float(1.)),
            ("sway", ControlParamValue::Float(0.3)),
            ("offset", ControlParamValue::Vector(Vec3::ZERO)),
            ("mirror", ControlParamValue::Bool(false)),
            ("look_at", ControlParamValue::Target(Target::Unset)),
            ("stance", ControlParamValue::Id("idle".to_string())),
            ("gait", ControlParamValue::Int(0)),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect(),
        bindings: ParameterBindings {
            speed: Some("speed".to_string()),
            sway: Some("sway".to_string()),
            offset: Some("offset".to_string()),
            mirror: Some("mirror".to_string()),
            aim: Some("look_at".to_string()),
            aim_bone: Some("head".to_string()),
        },
        default_sway: 0.2,
    }
}

#[cfg(test)]
pub(crate) fn test_definition() -> Arc<SyncGraphDefinition> {
    Arc::new(SyncGraphDefinition::from_serial(test_serial()).unwrap())
}

/// Records `frame_count` ticks of a walk whose parameters change along the way.
#[cfg(test)]
pub(crate) fn test_recording(frame_count: usize) -> crate::frame_store::FrameStore {
    test_recording_with_delta(frame_count, 1. / 30.)
}

/// Records `frame_count` ticks of `delta` seconds, each with its own inputs and transform.
#[cfg(test)]
pub(crate) fn test_recording_with_delta(
    frame_count: usize,
    delta: f32,
) -> crate::frame_store::FrameStore {
    use bevy::math::Vec3;

    use crate::{
        control_parameters::{ControlParamValue, Target},
        engine::GraphEngine,
        frame::RecordedFrame,
        recorder::FrameRecorder,
        transform::RigidTransform,
    };

    let definition = test_definition();
    let mut engine = SyncGraphInstance::new(definition.clone(), 0);
    let mut recorder = FrameRecorder::new();
    recorder.start_recording(definition.id(), &engine).unwrap();

    for tick in 0..frame_count {
        let t = tick as f32;
        engine
            .set_parameter("speed", ControlParamValue::Float(0.8 + 0.1 * (t % 4.)))
            .unwrap();
        engine
            .set_parameter("mirror", ControlParamValue::Bool(tick % 3 == 1))
            .unwrap();
        engine
            .set_parameter(
                "look_at",
                ControlParamValue::Target(Target::Point(Vec3::new(t, 1.5, 4.))),
            )
            .unwrap();

        let world = RigidTransform::from_translation(Vec3::new(0., 0., 0.05 * t));
        let tasks = engine.evaluate(delta, world).unwrap();
        engine.execute_pre_physics_tasks(world).unwrap();
        engine.execute_post_physics_tasks().unwrap();

        let frame = RecordedFrame::capture(&engine, delta, world, tasks);
        recorder.record_tick(tick as u64, frame).unwrap();
    }

    recorder.stop_recording();
    recorder.store().clone()
}
