//! The seam between the recorder/replayer and the animation runtime that actually evaluates
//! graphs. Nothing in this crate interprets engine state or task streams; they are only stored
//! and handed back.

use crate::{
    control_parameters::{ControlParamType, ControlParamValue},
    errors::EngineResult,
    frame::InitialState,
    id::GraphId,
    pose::Pose,
    sync_time::{SyncTrackTime, SyncTrackTimeRange},
    transform::RigidTransform,
};

/// A running, stateful evaluation of an animation graph.
pub trait GraphEngine: Send + Sync + 'static {
    fn serialize_current_state(&self) -> EngineResult<InitialState>;

    fn restore_state(&mut self, state: &InitialState) -> EngineResult<()>;

    /// Overwrites every control parameter and the character transform for the next evaluation.
    fn set_frame_inputs(
        &mut self,
        parameters: &[ControlParamValue],
        world_transform: RigidTransform,
    ) -> EngineResult<()>;

    /// Runs the graph update for one tick and returns the serialized task stream it produced.
    fn evaluate(&mut self, delta_time: f32, world_transform: RigidTransform)
    -> EngineResult<Vec<u8>>;

    fn execute_pre_physics_tasks(&mut self, world_transform: RigidTransform) -> EngineResult<()>;

    fn execute_post_physics_tasks(&mut self) -> EngineResult<()>;

    /// Drops all accumulated graph state and resumes playback from `time`.
    fn reset_state(&mut self, time: SyncTrackTime) -> EngineResult<()>;

    fn pose(&self) -> &Pose;

    fn reference_pose(&self) -> Pose;

    /// Sync range covered by the last evaluation.
    fn update_range(&self) -> SyncTrackTimeRange;

    fn control_parameter_values(&self) -> &[ControlParamValue];

    fn control_parameter_count(&self) -> usize;

    fn control_parameter_type(&self, index: usize) -> Option<ControlParamType>;

    fn control_parameter_id(&self, index: usize) -> Option<&str>;

    fn control_parameter_layout(&self) -> Vec<ControlParamType> {
        (0..self.control_parameter_count())
            .filter_map(|index| self.control_parameter_type(index))
            .collect()
    }
}

/// Executes a serialized task stream on its own, without a graph.
pub trait TaskSystem: Send + Sync + 'static {
    fn reset(&mut self);

    fn deserialize_tasks(&mut self, serialized_tasks: &[u8]) -> EngineResult<()>;

    fn update_pre_physics(
        &mut self,
        delta_time: f32,
        world_transform: RigidTransform,
        inverse_world_transform: RigidTransform,
    ) -> EngineResult<()>;

    fn update_post_physics(&mut self) -> EngineResult<()>;

    fn pose(&self) -> &Pose;
}

/// A graph definition that engine instances and task systems can be created from.
pub trait GraphVariation: Send + Sync + 'static {
    type Instance: GraphEngine;
    type Tasks: TaskSystem;

    fn graph_id(&self) -> GraphId;

    /// `user_id` distinguishes instances created from the same variation.
    fn instantiate(&self, user_id: u64) -> Self::Instance;

    fn create_task_system(&self) -> Self::Tasks;
}
