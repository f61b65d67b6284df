use bevy::reflect::Reflect;
use serde::{Deserialize, Serialize};

use crate::{
    control_parameters::ControlParamValue, engine::GraphEngine, sync_time::SyncTrackTimeRange,
    transform::RigidTransform,
};

/// Inputs and outputs of one simulation tick, as recorded from a live graph instance.
#[derive(Reflect, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordedFrame {
    pub delta_time: f32,
    pub character_world_transform: RigidTransform,
    pub update_range: SyncTrackTimeRange,
    /// Positionally aligned with the graph's control parameter list
    pub parameter_data: Vec<ControlParamValue>,
    serialized_task_data: Vec<u8>,
}

impl RecordedFrame {
    pub fn new(
        delta_time: f32,
        character_world_transform: RigidTransform,
        update_range: SyncTrackTimeRange,
        parameter_data: Vec<ControlParamValue>,
        serialized_task_data: Vec<u8>,
    ) -> Self {
        Self {
            delta_time,
            character_world_transform,
            update_range,
            parameter_data,
            serialized_task_data,
        }
    }

    /// Snapshots a live engine right after it evaluated a tick that produced `serialized_tasks`.
    pub fn capture<E: GraphEngine + ?Sized>(
        engine: &E,
        delta_time: f32,
        character_world_transform: RigidTransform,
        serialized_tasks: Vec<u8>,
    ) -> Self {
        Self {
            delta_time,
            character_world_transform,
            update_range: engine.update_range(),
            parameter_data: engine.control_parameter_values().to_vec(),
            serialized_task_data: serialized_tasks,
        }
    }

    /// The engine's task stream for this tick. Opaque to the recorder and never modified.
    pub fn serialized_task_data(&self) -> &[u8] {
        &self.serialized_task_data
    }

    pub fn serialized_task_size(&self) -> usize {
        self.serialized_task_data.len()
    }
}

/// Engine state captured right before the first recorded tick.
#[derive(Reflect, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InitialState {
    data: Vec<u8>,
}

impl InitialState {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
