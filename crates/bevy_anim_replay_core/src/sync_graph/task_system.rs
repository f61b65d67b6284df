use std::sync::Arc;

use super::{
    definition::SyncGraphDefinition,
    tasks::{PoseTask, deserialize_tasks, execute_tasks, finalize_pose},
};
use crate::{
    engine::TaskSystem, errors::EngineResult, pose::Pose, transform::RigidTransform,
};

/// Runs recorded task streams of a [`SyncGraphDefinition`] without evaluating the graph.
#[derive(Debug)]
pub struct SyncTaskSystem {
    definition: Arc<SyncGraphDefinition>,
    tasks: Vec<PoseTask>,
    pose: Pose,
}

impl SyncTaskSystem {
    pub fn new(definition: Arc<SyncGraphDefinition>) -> Self {
        let pose = Pose::reference(definition.skeleton());
        Self {
            definition,
            tasks: Vec::new(),
            pose,
        }
    }

    pub fn tasks(&self) -> &[PoseTask] {
        &self.tasks
    }
}

impl TaskSystem for SyncTaskSystem {
    fn reset(&mut self) {
        self.tasks.clear();
        self.pose.reset_to_reference(self.definition.skeleton());
    }

    fn deserialize_tasks(&mut self, serialized_tasks: &[u8]) -> EngineResult<()> {
        self.tasks = deserialize_tasks(serialized_tasks)?;
        Ok(())
    }

    fn update_pre_physics(
        &mut self,
        _delta_time: f32,
        _world_transform: RigidTransform,
        inverse_world_transform: RigidTransform,
    ) -> EngineResult<()> {
        execute_tasks(
            &self.tasks,
            self.definition.skeleton(),
            inverse_world_transform,
            &mut self.pose,
        );
        Ok(())
    }

    fn update_post_physics(&mut self) -> EngineResult<()> {
        finalize_pose(&mut self.pose);
        Ok(())
    }

    fn pose(&self) -> &Pose {
        &self.pose
    }
}
