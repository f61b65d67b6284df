use bevy::{
    app::{App, FixedUpdate, Plugin},
    ecs::{
        intern::Interned,
        schedule::{IntoScheduleConfigs, ScheduleLabel, SystemSet},
    },
};
use bevy_anim_replay_core::{
    control_parameters::{ControlParamType, ControlParamValue, Target},
    engine::GraphVariation,
    frame::{InitialState, RecordedFrame},
    frame_store::FrameStore,
    id::GraphId,
    pose::{BonePose, Pose, PoseKind},
    sync_time::{SyncTrackTime, SyncTrackTimeRange},
    transform::RigidTransform,
};

use crate::{
    debug_view::{NetworkReplayDebugView, apply_replay_commands},
    player::tick_replay_graphs,
};

/// Adds recording and replay of graphs of variation `V` to an app.
///
/// Entities with a [`ReplayGraphPlayer`] are ticked in `schedule`, and the one targeted by the
/// [`NetworkReplayDebugView`] resource is recorded.
///
/// [`ReplayGraphPlayer`]: crate::player::ReplayGraphPlayer
pub struct NetworkReplayPlugin<V: GraphVariation> {
    pub variation: V,
    pub schedule: Interned<dyn ScheduleLabel>,
}

#[derive(Clone, Debug, Copy, PartialEq, Eq, Hash, SystemSet)]
pub enum ReplaySet {
    /// Applies queued debug view commands, then ticks every replay graph player
    Record,
}

impl<V: GraphVariation> NetworkReplayPlugin<V> {
    pub fn new(variation: V) -> Self {
        Self {
            variation,
            schedule: FixedUpdate.intern(),
        }
    }

    pub fn in_schedule(mut self, schedule: impl ScheduleLabel) -> Self {
        self.schedule = schedule.intern();
        self
    }
}

impl<V: GraphVariation + Clone> Plugin for NetworkReplayPlugin<V> {
    fn build(&self, app: &mut App) {
        self.register_types(app);

        app.insert_resource(NetworkReplayDebugView::new(self.variation.clone()));
        app.configure_sets(self.schedule, ReplaySet::Record);
        app.add_systems(
            self.schedule,
            (apply_replay_commands::<V>, tick_replay_graphs::<V>)
                .chain()
                .in_set(ReplaySet::Record),
        );
    }
}

impl<V: GraphVariation> NetworkReplayPlugin<V> {
    fn register_types(&self, app: &mut App) {
        app //
            .register_type::<GraphId>()
            .register_type::<ControlParamType>()
            .register_type::<ControlParamValue>()
            .register_type::<Target>()
            .register_type::<SyncTrackTime>()
            .register_type::<SyncTrackTimeRange>()
            .register_type::<RigidTransform>()
            .register_type::<BonePose>()
            .register_type::<PoseKind>()
            .register_type::<Pose>()
            .register_type::<InitialState>()
            .register_type::<RecordedFrame>()
            .register_type::<FrameStore>();
    }
}
