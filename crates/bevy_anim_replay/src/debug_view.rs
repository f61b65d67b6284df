use bevy::{
    ecs::prelude::*,
    log::{info, warn},
};
use bevy_anim_replay_core::{
    engine::GraphVariation,
    errors::{ReplayError, ReplayResult},
    frame::RecordedFrame,
    frame_store::FrameStore,
    id::GraphId,
    inspector::{FrameInspector, FramePoses, FrameReport},
    recorder::FrameRecorder,
    replay::{ReplaySession, SerializedSizeStats},
};

use crate::player::ReplayGraphPlayer;

/// Requests applied to the [`NetworkReplayDebugView`] at the start of the next replay tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplayCommand {
    /// Discards any previous recording and starts recording this entity's player
    StartRecording(Entity),
    /// Stops recording and replays the whole recording
    StopRecording,
    /// Replays the recording again, with the replicated instance joining at the selected frame
    SimulateJoinInProgress,
    SelectFrame(usize),
    Reset,
}

/// Records one [`ReplayGraphPlayer`] and compares the full replay of the recording with a
/// simulated late join.
#[derive(Resource)]
pub struct NetworkReplayDebugView<V: GraphVariation> {
    variation: V,
    recorder: FrameRecorder,
    target: Option<Entity>,
    session: Option<ReplaySession<V>>,
    inspector: FrameInspector,
    pending: Vec<ReplayCommand>,
    last_error: Option<ReplayError>,
}

impl<V: GraphVariation> NetworkReplayDebugView<V> {
    pub fn new(variation: V) -> Self {
        Self {
            variation,
            recorder: FrameRecorder::new(),
            target: None,
            session: None,
            inspector: FrameInspector::new(),
            pending: Vec::new(),
            last_error: None,
        }
    }

    pub fn queue(&mut self, command: ReplayCommand) {
        self.pending.push(command);
    }

    pub fn variation(&self) -> &V {
        &self.variation
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    /// Entity being recorded, if recording is in progress.
    pub fn recording_target(&self) -> Option<Entity> {
        self.target.filter(|_| self.recorder.is_recording())
    }

    pub fn store(&self) -> &FrameStore {
        self.recorder.store()
    }

    pub fn session(&self) -> Option<&ReplaySession<V>> {
        self.session.as_ref()
    }

    pub fn selected_frame(&self) -> Option<usize> {
        self.inspector.selected()
    }

    pub fn size_stats(&self) -> Option<&SerializedSizeStats> {
        self.session.as_ref().and_then(ReplaySession::size_stats)
    }

    /// Error of the last failed replay, cleared by the next successful one.
    pub fn last_error(&self) -> Option<&ReplayError> {
        self.last_error.as_ref()
    }

    pub fn can_start_recording(&self) -> bool {
        !self.is_recording()
    }

    pub fn can_stop_recording(&self) -> bool {
        self.is_recording()
    }

    pub fn can_simulate_join_in_progress(&self) -> bool {
        !self.is_recording()
            && self.session.as_ref().is_some_and(ReplaySession::has_results)
            && self
                .inspector
                .selected()
                .is_some_and(|frame| frame + 1 < self.store().count())
    }

    pub fn start_recording(&mut self, entity: Entity, player: &ReplayGraphPlayer<V::Instance>) {
        self.reset();
        match self
            .recorder
            .start_recording(self.variation.graph_id(), player.engine())
        {
            Ok(()) => self.target = Some(entity),
            Err(error) => warn!("Could not start recording {entity}: {error}"),
        }
    }

    /// Appends a frame of the recorded player. Frames for repeated ticks are dropped.
    pub fn record_tick(&mut self, tick: u64, frame: RecordedFrame) {
        match self.recorder.record_tick(tick, frame) {
            Ok(_) => {}
            Err(error) => {
                warn!("Recording failed, discarding recorded data: {error}");
                self.reset();
            }
        }
    }

    /// Stops recording, replays the whole recording and selects its first frame.
    pub fn stop_recording(&mut self) {
        if !self.is_recording() {
            return;
        }
        self.recorder.stop_recording();

        let mut session = ReplaySession::new(&self.variation);
        let result = session.process_recording(self.recorder.store(), None);
        self.session = Some(session);
        if self.handle_result(result).is_some() {
            self.select_frame(0);
        }
    }

    /// Replays the recording again with the replicated instance joining at the selected frame.
    pub fn simulate_join_in_progress(&mut self) {
        let Some(frame) = self.inspector.selected() else {
            return;
        };
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let result = session.process_recording(self.recorder.store(), Some(frame));
        self.handle_result(result);
    }

    /// Selects `frame`, clamped to the recorded range, and regenerates the task system pose.
    pub fn select_frame(&mut self, frame: usize) {
        if self.is_recording() {
            return;
        }
        let frame_count = self.store().count();
        let Some(frame) = self.inspector.select(frame, frame_count) else {
            return;
        };
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let result = session
            .generate_task_system_pose(self.recorder.store(), frame)
            .map(|_| ());
        self.handle_result(result);
    }

    pub fn report(&self) -> Option<FrameReport> {
        let session = self.session.as_ref()?;
        self.inspector
            .report(self.store(), session.actual_instance())
            .ok()
            .flatten()
    }

    pub fn poses(&self) -> FramePoses<'_> {
        self.session
            .as_ref()
            .map(|session| self.inspector.poses(session))
            .unwrap_or_default()
    }

    /// Stops recording and discards the recording and all replay results.
    pub fn reset(&mut self) {
        self.recorder.reset();
        self.target = None;
        self.session = None;
        self.inspector.clear();
        self.last_error = None;
    }

    /// Discards the recording if the recorded entity or its graph is about to be reloaded.
    pub fn begin_hot_reload(&mut self, entities: &[Entity], graphs: &[GraphId]) {
        let entity_reloaded = self.target.is_some_and(|target| entities.contains(&target));
        let graph_reloaded = self
            .recorder
            .graph_id()
            .is_some_and(|graph| graphs.contains(&graph));

        if entity_reloaded || graph_reloaded {
            info!("Recorded graph is being reloaded, discarding recording");
            self.reset();
        }
    }

    fn handle_result<T>(&mut self, result: ReplayResult<T>) -> Option<T> {
        match result {
            Ok(value) => {
                self.last_error = None;
                Some(value)
            }
            Err(error) if error.invalidates_recording() => {
                warn!("{error}");
                self.reset();
                self.last_error = Some(error);
                None
            }
            Err(error) => {
                warn!("Replay failed: {error}");
                self.last_error = Some(error);
                None
            }
        }
    }
}

/// Applies queued [`ReplayCommand`]s. Recording stops and is discarded when the recorded
/// entity lost its player.
pub fn apply_replay_commands<V: GraphVariation>(
    mut debug_view: ResMut<NetworkReplayDebugView<V>>,
    players: Query<&ReplayGraphPlayer<V::Instance>>,
) {
    if let Some(target) = debug_view.target
        && !players.contains(target)
    {
        warn!("Recorded entity {target} no longer has a replay graph player");
        debug_view.reset();
    }

    let pending = std::mem::take(&mut debug_view.pending);
    for command in pending {
        match command {
            ReplayCommand::StartRecording(entity) => match players.get(entity) {
                Ok(player) => debug_view.start_recording(entity, player),
                Err(_) => warn!("Cannot record {entity}: it has no replay graph player"),
            },
            ReplayCommand::StopRecording => debug_view.stop_recording(),
            ReplayCommand::SimulateJoinInProgress => debug_view.simulate_join_in_progress(),
            ReplayCommand::SelectFrame(frame) => debug_view.select_frame(frame),
            ReplayCommand::Reset => debug_view.reset(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bevy::{
        MinimalPlugins,
        app::{App, Update},
        time::TimeUpdateStrategy,
        transform::components::Transform,
    };
    use bevy_anim_replay_core::{
        control_parameters::ControlParamValue,
        engine::GraphVariation,
        sync_graph::{
            SyncGraphDefinition, SyncGraphInstance, SyncGraphVariation, WALKER_GRAPH_RON,
        },
    };

    use super::*;
    use crate::plugin::NetworkReplayPlugin;

    type Player = ReplayGraphPlayer<SyncGraphInstance>;
    type DebugView = NetworkReplayDebugView<SyncGraphVariation>;

    fn variation() -> SyncGraphVariation {
        SyncGraphVariation::new(SyncGraphDefinition::from_ron_str(WALKER_GRAPH_RON).unwrap())
    }

    fn test_app() -> (App, Entity) {
        let variation = variation();
        let mut app = App::new();
        app.add_plugins((
            MinimalPlugins,
            NetworkReplayPlugin::new(variation.clone()).in_schedule(Update),
        ))
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f32(
            1. / 30.,
        )));
        let entity = app
            .world_mut()
            .spawn((Transform::default(), Player::new(variation.instantiate(0))))
            .id();
        (app, entity)
    }

    fn queue(app: &mut App, command: ReplayCommand) {
        app.world_mut().resource_mut::<DebugView>().queue(command);
    }

    fn debug_view(app: &App) -> &DebugView {
        app.world().resource::<DebugView>()
    }

    /// Records `frames` ticks, changing the walk speed and moving the character as it goes.
    fn record(app: &mut App, entity: Entity, frames: usize) {
        queue(app, ReplayCommand::StartRecording(entity));
        // First update has no elapsed time
        app.update();
        for frame in 0..frames {
            let mut player = app.world_mut().get_mut::<Player>(entity).unwrap();
            player
                .engine_mut()
                .set_parameter("speed", ControlParamValue::Float(1. + frame as f32 * 0.1))
                .unwrap();
            app.world_mut()
                .get_mut::<Transform>(entity)
                .unwrap()
                .translation
                .z += 0.1;
            app.update();
        }
    }

    #[test]
    fn records_and_replays_through_the_plugin() {
        let (mut app, entity) = test_app();
        record(&mut app, entity, 6);
        assert!(debug_view(&app).is_recording());
        assert_eq!(debug_view(&app).store().count(), 6);
        assert!(!debug_view(&app).can_start_recording());

        queue(&mut app, ReplayCommand::StopRecording);
        app.update();

        let view = debug_view(&app);
        assert!(!view.is_recording());
        assert!(view.store().is_finalized());
        assert_eq!(view.selected_frame(), Some(0));
        assert_eq!(view.size_stats().map(|stats| stats.sizes.len()), Some(6));
        assert!(view.poses().tracks_match());
        assert!(view.poses().generated.is_some());
        assert_eq!(view.report().map(|report| report.frame), Some(0));
        assert!(view.can_simulate_join_in_progress());
    }

    #[test]
    fn simulated_join_converges() {
        let (mut app, entity) = test_app();
        record(&mut app, entity, 8);
        queue(&mut app, ReplayCommand::StopRecording);
        queue(&mut app, ReplayCommand::SelectFrame(3));
        queue(&mut app, ReplayCommand::SimulateJoinInProgress);
        app.update();

        let view = debug_view(&app);
        let session = view.session().unwrap();
        assert_eq!(session.join_frame(), Some(3));
        assert!(session.mismatched_frames().is_empty());
        assert!(
            session
                .replicated_pose(2)
                .is_some_and(|pose| pose.is_reference_pose())
        );
        assert!(view.last_error().is_none());
    }

    #[test]
    fn join_on_last_frame_is_refused() {
        let (mut app, entity) = test_app();
        record(&mut app, entity, 4);
        queue(&mut app, ReplayCommand::StopRecording);
        queue(&mut app, ReplayCommand::SelectFrame(100));
        app.update();

        assert_eq!(debug_view(&app).selected_frame(), Some(3));
        assert!(!debug_view(&app).can_simulate_join_in_progress());

        queue(&mut app, ReplayCommand::SimulateJoinInProgress);
        app.update();
        let view = debug_view(&app);
        assert!(matches!(
            view.last_error(),
            Some(ReplayError::JoinFrameOutOfRange { .. })
        ));
        assert_eq!(view.session().and_then(ReplaySession::join_frame), None);
    }

    #[test]
    fn paused_player_records_nothing() {
        let (mut app, entity) = test_app();
        app.world_mut().get_mut::<Player>(entity).unwrap().pause();
        record(&mut app, entity, 3);
        assert_eq!(debug_view(&app).store().count(), 0);
        assert_eq!(app.world().get::<Player>(entity).unwrap().tick(), 0);
    }

    #[test]
    fn despawned_target_resets_recording() {
        let (mut app, entity) = test_app();
        record(&mut app, entity, 2);
        app.world_mut().despawn(entity);
        app.update();

        let view = debug_view(&app);
        assert!(!view.is_recording());
        assert!(!view.store().has_data());
        assert!(view.can_start_recording());
    }

    #[test]
    fn start_recording_requires_a_player() {
        let (mut app, _) = test_app();
        let other = app.world_mut().spawn(Transform::default()).id();
        queue(&mut app, ReplayCommand::StartRecording(other));
        app.update();
        assert!(!debug_view(&app).is_recording());
    }

    #[test]
    fn hot_reload_of_recorded_graph_resets() {
        let (mut app, entity) = test_app();
        record(&mut app, entity, 2);
        queue(&mut app, ReplayCommand::StopRecording);
        app.update();

        let unrelated = app.world_mut().spawn_empty().id();
        let mut view = app.world_mut().resource_mut::<DebugView>();
        view.begin_hot_reload(&[unrelated], &[GraphId::new_random()]);
        assert!(view.store().has_data());

        let graph = view.variation().graph_id();
        view.begin_hot_reload(&[], &[graph]);
        assert!(!view.store().has_data());
        assert!(view.session().is_none());
    }

    #[test]
    fn hot_reload_of_recorded_entity_resets() {
        let (mut app, entity) = test_app();
        record(&mut app, entity, 2);

        let mut view = app.world_mut().resource_mut::<DebugView>();
        view.begin_hot_reload(&[entity], &[]);
        assert!(!view.is_recording());
        assert_eq!(view.recording_target(), None);
    }
}
