use std::sync::Arc;

use bevy::math::Vec3;
use serde::{Deserialize, Serialize};

use super::{
    definition::SyncGraphDefinition,
    tasks::{AimTarget, PoseTask, execute_tasks, finalize_pose, serialize_tasks},
};
use crate::{
    control_parameters::{ControlParamType, ControlParamValue, Target, validate_layout},
    engine::GraphEngine,
    errors::{EngineError, EngineResult},
    frame::InitialState,
    pose::Pose,
    sync_time::{SyncTrackTime, SyncTrackTimeRange},
    transform::RigidTransform,
};

/// Everything that carries over from one tick to the next.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct SyncGraphState {
    cursor: SyncTrackTime,
    parameters: Vec<ControlParamValue>,
    world_transform: RigidTransform,
}

/// Live evaluation of a [`SyncGraphDefinition`].
///
/// The only state that survives between ticks is the sync track cursor, so resetting the
/// cursor to a recorded update range start reproduces the sender's evaluation exactly.
#[derive(Debug)]
pub struct SyncGraphInstance {
    definition: Arc<SyncGraphDefinition>,
    user_id: u64,
    state: SyncGraphState,
    update_range: SyncTrackTimeRange,
    pending_tasks: Vec<PoseTask>,
    pose: Pose,
}

impl SyncGraphInstance {
    pub fn new(definition: Arc<SyncGraphDefinition>, user_id: u64) -> Self {
        let parameters = definition.parameter_defaults().to_vec();
        let pose = Pose::reference(definition.skeleton());

        Self {
            definition,
            user_id,
            state: SyncGraphState {
                cursor: SyncTrackTime::default(),
                parameters,
                world_transform: RigidTransform::IDENTITY,
            },
            update_range: SyncTrackTimeRange::default(),
            pending_tasks: Vec::new(),
            pose,
        }
    }

    pub fn definition(&self) -> &Arc<SyncGraphDefinition> {
        &self.definition
    }

    pub fn user_id(&self) -> u64 {
        self.user_id
    }

    pub fn cursor(&self) -> SyncTrackTime {
        self.state.cursor
    }

    /// Sets a single control parameter by name. The value must match the declared type.
    pub fn set_parameter(&mut self, name: &str, value: ControlParamValue) -> EngineResult<()> {
        let (index, _, ty) = self
            .definition
            .parameters()
            .get_full(name)
            .ok_or_else(|| EngineError::UnknownParameterName(name.to_string()))?;
        if *ty != value.param_type() {
            return Err(EngineError::ParameterTypeMismatch {
                index,
                expected: *ty,
                found: value.param_type(),
            });
        }
        self.state.parameters[index] = value;
        Ok(())
    }

    pub fn parameter(&self, name: &str) -> Option<&ControlParamValue> {
        self.definition
            .parameter_index(name)
            .and_then(|index| self.state.parameters.get(index))
    }

    fn bound_float(&self, binding: Option<usize>) -> EngineResult<Option<f32>> {
        binding
            .map(|index| self.parameter_at(index).and_then(ControlParamValue::as_float))
            .transpose()
    }

    fn parameter_at(&self, index: usize) -> EngineResult<&ControlParamValue> {
        self.state
            .parameters
            .get(index)
            .ok_or(EngineError::UnknownParameter(index))
    }

    /// Builds this tick's task list from the current parameters and cursor.
    fn build_tasks(&self) -> EngineResult<Vec<PoseTask>> {
        let bindings = self.definition.bindings;
        let mut tasks = Vec::with_capacity(4);

        let sway = self
            .bound_float(bindings.sway)?
            .unwrap_or(self.definition.default_sway());
        tasks.push(PoseTask::SampleCycle {
            phase: self
                .state
                .cursor
                .track_phase(self.definition.event_durations().len()),
            sway,
        });

        if let Some(index) = bindings.mirror
            && self.parameter_at(index)?.as_bool()?
        {
            tasks.push(PoseTask::Mirror);
        }

        if let Some(index) = bindings.offset {
            let offset = self.parameter_at(index)?.as_vector()?;
            if offset != Vec3::ZERO {
                tasks.push(PoseTask::OffsetRoot { offset });
            }
        }

        if let (Some(index), Some(bone)) = (bindings.aim, bindings.aim_bone) {
            let target = match self.parameter_at(index)?.as_target()? {
                Target::Unset => None,
                Target::Bone(name) => self
                    .definition
                    .skeleton()
                    .bone_index(name)
                    .map(AimTarget::Bone),
                Target::Point(point) => Some(AimTarget::WorldPoint(*point)),
            };
            if let Some(target) = target {
                tasks.push(PoseTask::Aim { bone, target });
            }
        }

        Ok(tasks)
    }
}

impl GraphEngine for SyncGraphInstance {
    fn serialize_current_state(&self) -> EngineResult<InitialState> {
        rmp_serde::to_vec(&self.state)
            .map(InitialState::new)
            .map_err(|err| EngineError::Encode(err.to_string()))
    }

    fn restore_state(&mut self, state: &InitialState) -> EngineResult<()> {
        let restored: SyncGraphState = rmp_serde::from_slice(state.data())
            .map_err(|err| EngineError::Decode(err.to_string()))?;
        validate_layout(&self.control_parameter_layout(), &restored.parameters)?;

        self.state = restored;
        self.update_range = SyncTrackTimeRange::new(self.state.cursor, self.state.cursor);
        self.pending_tasks.clear();
        self.pose.reset_to_reference(self.definition.skeleton());
        Ok(())
    }

    fn set_frame_inputs(
        &mut self,
        parameters: &[ControlParamValue],
        world_transform: RigidTransform,
    ) -> EngineResult<()> {
        validate_layout(&self.control_parameter_layout(), parameters)?;
        self.state.parameters.clear();
        self.state.parameters.extend_from_slice(parameters);
        self.state.world_transform = world_transform;
        Ok(())
    }

    fn evaluate(
        &mut self,
        delta_time: f32,
        world_transform: RigidTransform,
    ) -> EngineResult<Vec<u8>> {
        self.state.world_transform = world_transform;

        let speed = self
            .bound_float(self.definition.bindings.speed)?
            .unwrap_or(1.)
            .max(0.);
        let start = self.state.cursor;
        let end = start.advanced(delta_time * speed, self.definition.event_durations());
        self.state.cursor = end;
        self.update_range = SyncTrackTimeRange::new(start, end);

        let tasks = self.build_tasks()?;
        let serialized = serialize_tasks(&tasks)?;
        self.pending_tasks = tasks;
        Ok(serialized)
    }

    fn execute_pre_physics_tasks(&mut self, world_transform: RigidTransform) -> EngineResult<()> {
        execute_tasks(
            &self.pending_tasks,
            self.definition.skeleton(),
            world_transform.inverse(),
            &mut self.pose,
        );
        Ok(())
    }

    fn execute_post_physics_tasks(&mut self) -> EngineResult<()> {
        finalize_pose(&mut self.pose);
        Ok(())
    }

    fn reset_state(&mut self, time: SyncTrackTime) -> EngineResult<()> {
        self.state.cursor = time;
        self.update_range = SyncTrackTimeRange::new(time, time);
        self.pending_tasks.clear();
        self.pose.reset_to_reference(self.definition.skeleton());
        Ok(())
    }

    fn pose(&self) -> &Pose {
        &self.pose
    }

    fn reference_pose(&self) -> Pose {
        Pose::reference(self.definition.skeleton())
    }

    fn update_range(&self) -> SyncTrackTimeRange {
        self.update_range
    }

    fn control_parameter_values(&self) -> &[ControlParamValue] {
        &self.state.parameters
    }

    fn control_parameter_count(&self) -> usize {
        self.definition.parameters().len()
    }

    fn control_parameter_type(&self, index: usize) -> Option<ControlParamType> {
        self.definition
            .parameters()
            .get_index(index)
            .map(|(_, ty)| *ty)
    }

    fn control_parameter_id(&self, index: usize) -> Option<&str> {
        self.definition
            .parameters()
            .get_index(index)
            .map(|(name, _)| name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync_graph::test_definition;

    fn tick(instance: &mut SyncGraphInstance, delta: f32, world: RigidTransform) -> Vec<u8> {
        let tasks = instance.evaluate(delta, world).unwrap();
        instance.execute_pre_physics_tasks(world).unwrap();
        instance.execute_post_physics_tasks().unwrap();
        tasks
    }

    #[test]
    fn evaluation_is_deterministic() {
        let mut a = SyncGraphInstance::new(test_definition(), 1);
        let mut b = SyncGraphInstance::new(test_definition(), 2);
        for i in 0..10 {
            let world = RigidTransform::from_translation(Vec3::X * i as f32);
            assert_eq!(tick(&mut a, 1. / 60., world), tick(&mut b, 1. / 60., world));
            assert_eq!(a.pose(), b.pose());
        }
    }

    #[test]
    fn speed_parameter_scales_cursor() {
        let mut slow = SyncGraphInstance::new(test_definition(), 0);
        let mut fast = SyncGraphInstance::new(test_definition(), 0);
        slow.set_parameter("speed", ControlParamValue::Float(0.5)).unwrap();
        fast.set_parameter("speed", ControlParamValue::Float(1.0)).unwrap();
        tick(&mut slow, 0.2, RigidTransform::IDENTITY);
        tick(&mut fast, 0.1, RigidTransform::IDENTITY);
        assert_eq!(slow.cursor(), fast.cursor());
    }

    #[test]
    fn negative_speed_freezes_cursor() {
        let mut instance = SyncGraphInstance::new(test_definition(), 0);
        instance
            .set_parameter("speed", ControlParamValue::Float(-2.))
            .unwrap();
        tick(&mut instance, 0.5, RigidTransform::IDENTITY);
        assert_eq!(instance.cursor(), SyncTrackTime::default());
    }

    #[test]
    fn extreme_speed_keeps_cursor_on_track() {
        let mut instance = SyncGraphInstance::new(test_definition(), 0);
        let event_count = instance.definition().event_durations().len() as i32;

        instance
            .set_parameter("speed", ControlParamValue::Float(1e30))
            .unwrap();
        tick(&mut instance, 1. / 60., RigidTransform::IDENTITY);
        let cursor = instance.cursor();
        assert!((0..event_count).contains(&cursor.event_idx));
        assert!((0. ..1.).contains(&cursor.percentage_through));

        instance
            .set_parameter("speed", ControlParamValue::Float(f32::INFINITY))
            .unwrap();
        tick(&mut instance, 1. / 60., RigidTransform::IDENTITY);
        assert_eq!(instance.cursor(), cursor);
    }

    #[test]
    fn restore_returns_to_captured_state() {
        let mut instance = SyncGraphInstance::new(test_definition(), 0);
        tick(&mut instance, 0.3, RigidTransform::IDENTITY);
        let saved = instance.serialize_current_state().unwrap();
        let cursor = instance.cursor();

        tick(&mut instance, 0.3, RigidTransform::IDENTITY);
        assert_ne!(instance.cursor(), cursor);

        instance.restore_state(&saved).unwrap();
        assert_eq!(instance.cursor(), cursor);
        assert!(instance.pose().is_reference_pose());
    }

    #[test]
    fn reset_moves_only_the_cursor() {
        let mut instance = SyncGraphInstance::new(test_definition(), 0);
        instance
            .set_parameter("mirror", ControlParamValue::Bool(true))
            .unwrap();
        tick(&mut instance, 0.3, RigidTransform::IDENTITY);

        let resume = SyncTrackTime::new(1, 0.5);
        instance.reset_state(resume).unwrap();
        assert_eq!(instance.cursor(), resume);
        assert_eq!(
            instance.parameter("mirror"),
            Some(&ControlParamValue::Bool(true))
        );
    }

    #[test]
    fn frame_inputs_must_match_layout() {
        let mut instance = SyncGraphInstance::new(test_definition(), 0);
        let result = instance.set_frame_inputs(&[], RigidTransform::IDENTITY);
        assert!(matches!(
            result,
            Err(EngineError::ParameterCountMismatch { found: 0, .. })
        ));
    }

    #[test]
    fn set_parameter_checks_type() {
        let mut instance = SyncGraphInstance::new(test_definition(), 0);
        assert!(matches!(
            instance.set_parameter("speed", ControlParamValue::Bool(true)),
            Err(EngineError::ParameterTypeMismatch { .. })
        ));
    }

    #[test]
    fn optional_tasks_grow_the_task_stream() {
        let mut instance = SyncGraphInstance::new(test_definition(), 0);
        let plain = tick(&mut instance, 0.1, RigidTransform::IDENTITY);

        instance
            .set_parameter("mirror", ControlParamValue::Bool(true))
            .unwrap();
        instance
            .set_parameter(
                "look_at",
                ControlParamValue::Target(Target::Point(Vec3::new(0., 1., 5.))),
            )
            .unwrap();
        let busy = tick(&mut instance, 0.1, RigidTransform::IDENTITY);
        assert!(busy.len() > plain.len());
    }
}
