use bevy::log::{info, warn};

use super::{ReplayTrack, SerializedSizeStats, check_join_frame, replay_full, replay_join_in_progress};
use crate::{
    engine::{GraphEngine, GraphVariation, TaskSystem},
    errors::{ReplayError, ReplayResult},
    frame_store::FrameStore,
    pose::Pose,
};

/// User id of the instance that replays the whole recording.
pub const ACTUAL_INSTANCE_USER_ID: u64 = 1;
/// User id of the instance that joins the stream part way through.
pub const REPLICATED_INSTANCE_USER_ID: u64 = 2;

/// Owns the engine instances used to reprocess a recording and the results of the last
/// successful pass.
///
/// Results are only replaced when a pass succeeds as a whole, so a failed
/// [`ReplaySession::process_recording`] leaves the previous results untouched.
pub struct ReplaySession<V: GraphVariation> {
    actual_instance: V::Instance,
    replicated_instance: V::Instance,
    task_system: V::Tasks,
    actual: ReplayTrack,
    replicated: ReplayTrack,
    generated_pose: Option<(usize, Pose)>,
    size_stats: Option<SerializedSizeStats>,
    join_frame: Option<usize>,
}

impl<V: GraphVariation> ReplaySession<V> {
    pub fn new(variation: &V) -> Self {
        Self {
            actual_instance: variation.instantiate(ACTUAL_INSTANCE_USER_ID),
            replicated_instance: variation.instantiate(REPLICATED_INSTANCE_USER_ID),
            task_system: variation.create_task_system(),
            actual: ReplayTrack::default(),
            replicated: ReplayTrack::default(),
            generated_pose: None,
            size_stats: None,
            join_frame: None,
        }
    }

    /// Replays `store` fully on the actual instance and from `join_frame` on the replicated
    /// instance, and recomputes the task stream size statistics.
    pub fn process_recording(
        &mut self,
        store: &FrameStore,
        join_frame: Option<usize>,
    ) -> ReplayResult<()> {
        let size_stats = SerializedSizeStats::from_store(store).ok_or(ReplayError::NoRecordedData)?;
        check_join_frame(store, join_frame)?;

        let actual = replay_full(&mut self.actual_instance, store)?;
        let replicated = replay_join_in_progress(&mut self.replicated_instance, store, join_frame)?;

        if !actual.divergent_frames.is_empty() {
            warn!(
                "Replay regenerated different task streams on {} of {} frames",
                actual.divergent_frames.len(),
                actual.len()
            );
        }

        self.actual = actual;
        self.replicated = replicated;
        self.size_stats = Some(size_stats);
        self.join_frame = join_frame;
        self.generated_pose = None;

        info!(
            "Processed {} recorded frames, replicated track joined at frame {}",
            store.count(),
            join_frame.unwrap_or(0)
        );
        Ok(())
    }

    /// Executes the recorded task stream of frame `frame_index` on the standalone task system,
    /// without evaluating a graph.
    pub fn generate_task_system_pose(
        &mut self,
        store: &FrameStore,
        frame_index: usize,
    ) -> ReplayResult<&Pose> {
        let frame = store.get(frame_index)?;
        let world_transform = frame.character_world_transform;

        self.task_system.reset();
        self.task_system
            .deserialize_tasks(frame.serialized_task_data())?;
        self.task_system.update_pre_physics(
            frame.delta_time,
            world_transform,
            world_transform.inverse(),
        )?;
        self.task_system.update_post_physics()?;

        let (_, pose) = self
            .generated_pose
            .insert((frame_index, self.task_system.pose().clone()));
        Ok(pose)
    }

    /// Drops all replay results. The engine instances are kept.
    pub fn clear(&mut self) {
        self.actual = ReplayTrack::default();
        self.replicated = ReplayTrack::default();
        self.generated_pose = None;
        self.size_stats = None;
        self.join_frame = None;
    }

    pub fn has_results(&self) -> bool {
        !self.actual.is_empty()
    }

    pub fn actual_track(&self) -> &ReplayTrack {
        &self.actual
    }

    pub fn replicated_track(&self) -> &ReplayTrack {
        &self.replicated
    }

    pub fn actual_pose(&self, frame: usize) -> Option<&Pose> {
        self.actual.pose(frame)
    }

    pub fn replicated_pose(&self, frame: usize) -> Option<&Pose> {
        self.replicated.pose(frame)
    }

    /// Pose generated by the last [`ReplaySession::generate_task_system_pose`], with its frame.
    pub fn generated_pose(&self) -> Option<(usize, &Pose)> {
        self.generated_pose
            .as_ref()
            .map(|(frame, pose)| (*frame, pose))
    }

    pub fn size_stats(&self) -> Option<&SerializedSizeStats> {
        self.size_stats.as_ref()
    }

    pub fn join_frame(&self) -> Option<usize> {
        self.join_frame
    }

    /// Frames at or after the join frame where the two tracks disagree.
    pub fn mismatched_frames(&self) -> Vec<usize> {
        let start = self.join_frame.unwrap_or(0);
        self.actual
            .poses
            .iter()
            .zip(&self.replicated.poses)
            .enumerate()
            .skip(start)
            .filter(|(_, (actual, replicated))| actual != replicated)
            .map(|(frame, _)| frame)
            .collect()
    }

    /// The instance that replays the whole recording. Used to label control parameters.
    pub fn actual_instance(&self) -> &V::Instance {
        &self.actual_instance
    }

    pub fn parameter_label(&self, index: usize) -> Option<&str> {
        self.actual_instance.control_parameter_id(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        pose::PoseKind,
        sync_graph::{SyncGraphVariation, test_definition, test_recording},
    };

    fn session() -> ReplaySession<SyncGraphVariation> {
        ReplaySession::new(&SyncGraphVariation::new(test_definition()))
    }

    #[test]
    fn instances_use_distinct_user_ids() {
        let session = session();
        assert_eq!(session.actual_instance.user_id(), ACTUAL_INSTANCE_USER_ID);
        assert_eq!(
            session.replicated_instance.user_id(),
            REPLICATED_INSTANCE_USER_ID
        );
    }

    #[test]
    fn processing_fills_both_tracks() {
        let store = test_recording(5);
        let mut session = session();
        session.process_recording(&store, Some(2)).unwrap();

        assert_eq!(session.actual_track().len(), 5);
        assert_eq!(session.replicated_track().len(), 5);
        assert_eq!(session.join_frame(), Some(2));
        assert!(session.mismatched_frames().is_empty());
        assert!(session.replicated_pose(1).is_some_and(Pose::is_reference_pose));
        assert_eq!(session.actual_pose(3), session.replicated_pose(3));
    }

    #[test]
    fn size_stats_cover_every_frame() {
        let store = test_recording(6);
        let mut session = session();
        session.process_recording(&store, None).unwrap();

        let stats = session.size_stats().unwrap();
        let sizes: Vec<usize> = store.serialized_task_sizes().collect();
        assert_eq!(stats.sizes, sizes);
        assert_eq!(stats.min, *sizes.iter().min().unwrap());
        assert_eq!(stats.max, *sizes.iter().max().unwrap());
        assert!(stats.min < stats.max);
    }

    #[test]
    fn failed_pass_keeps_previous_results() {
        let store = test_recording(5);
        let mut session = session();
        session.process_recording(&store, Some(1)).unwrap();
        let actual = session.actual_track().clone();

        assert!(matches!(
            session.process_recording(&store, Some(4)),
            Err(ReplayError::JoinFrameOutOfRange { .. })
        ));
        assert_eq!(session.actual_track(), &actual);
        assert_eq!(session.join_frame(), Some(1));

        assert_eq!(
            session.process_recording(&FrameStore::default(), None),
            Err(ReplayError::NoRecordedData)
        );
        assert!(session.has_results());
    }

    #[test]
    fn generated_pose_matches_recorded_tasks() {
        let store = test_recording(4);
        let mut session = session();
        let pose = session.generate_task_system_pose(&store, 2).unwrap().clone();

        assert_eq!(pose.kind, PoseKind::Animated);
        assert_eq!(session.generated_pose(), Some((2, &pose)));
        assert!(matches!(
            session.generate_task_system_pose(&store, 4),
            Err(ReplayError::FrameStore(_))
        ));
    }

    #[test]
    fn clear_drops_results() {
        let store = test_recording(3);
        let mut session = session();
        session.process_recording(&store, None).unwrap();
        session.clear();
        assert!(!session.has_results());
        assert!(session.size_stats().is_none());
        assert_eq!(session.parameter_label(0), Some("speed"));
    }
}
