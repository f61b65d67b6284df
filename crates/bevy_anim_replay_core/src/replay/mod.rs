//! Re-driving a graph engine from a [`FrameStore`].
//!
//! Two modes are supported. A full replay restores the recorded initial state and evaluates
//! every frame, producing the ground truth. A join-in-progress replay models a client that
//! starts receiving the stream at some frame: it has no history, so it seeds the control
//! parameters from that frame and resets the graph to the frame's update range start before
//! evaluating the remaining frames.

mod session;
mod size_stats;

pub use session::*;
pub use size_stats::*;

use crate::{
    control_parameters::ControlParamType,
    engine::GraphEngine,
    errors::{EngineError, ReplayError, ReplayResult},
    frame_store::FrameStore,
    pose::Pose,
};

/// Poses produced by one replay pass, indexed by frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReplayTrack {
    pub poses: Vec<Pose>,
    /// Frames whose regenerated task stream differs from the recorded one
    pub divergent_frames: Vec<usize>,
}

impl ReplayTrack {
    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    pub fn pose(&self, frame: usize) -> Option<&Pose> {
        self.poses.get(frame)
    }
}

/// Replays every recorded frame starting from the recorded initial state.
pub fn replay_full<E: GraphEngine + ?Sized>(
    engine: &mut E,
    store: &FrameStore,
) -> ReplayResult<ReplayTrack> {
    check_replayable(engine, store)?;
    let initial_state = store
        .initial_state()
        .ok_or(ReplayError::MissingInitialState)?;

    engine.restore_state(initial_state)?;

    let mut track = ReplayTrack {
        poses: Vec::with_capacity(store.count()),
        divergent_frames: Vec::new(),
    };
    for index in 0..store.count() {
        evaluate_frame(engine, store, index, &mut track)?;
    }
    Ok(track)
}

/// Replays the recording as a client joining at `join_frame` would.
///
/// Frames before the join frame are filled with the engine's reference pose. `None` starts at
/// frame 0 but still resets the engine from the recorded update range instead of restoring the
/// initial state, which is what a client that joined at the very start would do.
pub fn replay_join_in_progress<E: GraphEngine + ?Sized>(
    engine: &mut E,
    store: &FrameStore,
    join_frame: Option<usize>,
) -> ReplayResult<ReplayTrack> {
    check_replayable(engine, store)?;
    let start = check_join_frame(store, join_frame)?;

    let mut track = ReplayTrack {
        poses: vec![engine.reference_pose(); start],
        divergent_frames: Vec::new(),
    };
    track.poses.reserve(store.count() - start);

    let start_frame = store.get(start)?;
    engine.set_frame_inputs(
        &start_frame.parameter_data,
        start_frame.character_world_transform,
    )?;
    engine.reset_state(start_frame.update_range.start)?;

    for index in start..store.count() {
        evaluate_frame(engine, store, index, &mut track)?;
    }
    Ok(track)
}

/// Validates a join frame against `store` and returns the first frame to evaluate.
///
/// Joining on the last frame is rejected: at least one following frame is needed to observe
/// the joined client converging.
pub fn check_join_frame(store: &FrameStore, join_frame: Option<usize>) -> ReplayResult<usize> {
    match join_frame {
        None => Ok(0),
        Some(join_frame) if join_frame < store.count().saturating_sub(1) => Ok(join_frame),
        Some(join_frame) => Err(ReplayError::JoinFrameOutOfRange {
            join_frame,
            frame_count: store.count(),
        }),
    }
}

fn check_replayable<E: GraphEngine + ?Sized>(engine: &E, store: &FrameStore) -> ReplayResult<()> {
    if !store.has_data() {
        return Err(ReplayError::NoRecordedData);
    }
    if !store.is_finalized() {
        return Err(ReplayError::RecordingInProgress);
    }
    check_layout(store.parameter_layout(), &engine.control_parameter_layout())
        .map_err(ReplayError::EngineDesync)
}

fn check_layout(recorded: &[ControlParamType], live: &[ControlParamType]) -> Result<(), EngineError> {
    if recorded.len() != live.len() {
        return Err(EngineError::ParameterCountMismatch {
            expected: recorded.len(),
            found: live.len(),
        });
    }
    match recorded.iter().zip(live).position(|(r, l)| r != l) {
        Some(index) => Err(EngineError::ParameterTypeMismatch {
            index,
            expected: recorded[index],
            found: live[index],
        }),
        None => Ok(()),
    }
}

/// Evaluates frame `index` and appends the resulting pose to `track`.
///
/// Pre-physics tasks run with the next frame's character transform, or the current one on the
/// last frame.
fn evaluate_frame<E: GraphEngine + ?Sized>(
    engine: &mut E,
    store: &FrameStore,
    index: usize,
    track: &mut ReplayTrack,
) -> ReplayResult<()> {
    let frame = store.get(index)?;
    let next_frame = store.get_next_or_last(index)?;

    engine.set_frame_inputs(&frame.parameter_data, frame.character_world_transform)?;
    let tasks = engine.evaluate(frame.delta_time, frame.character_world_transform)?;
    engine.execute_pre_physics_tasks(next_frame.character_world_transform)?;
    engine.execute_post_physics_tasks()?;

    if tasks != frame.serialized_task_data() {
        track.divergent_frames.push(index);
    }
    track.poses.push(engine.pose().clone());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        frame::InitialState,
        id::GraphId,
        sync_graph::{SyncGraphInstance, test_definition, test_recording, test_recording_with_delta},
    };

    fn engine() -> SyncGraphInstance {
        SyncGraphInstance::new(test_definition(), 1)
    }

    #[test]
    fn full_replay_yields_one_pose_per_frame() {
        let store = test_recording(5);
        let track = replay_full(&mut engine(), &store).unwrap();
        assert_eq!(track.len(), 5);
        assert!(track.poses.iter().all(|pose| !pose.is_reference_pose()));
        assert!(track.divergent_frames.is_empty());
    }

    #[test]
    fn full_replay_is_idempotent() {
        let store = test_recording(6);
        let mut engine = engine();
        let first = replay_full(&mut engine, &store).unwrap();
        let second = replay_full(&mut engine, &store).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn joined_replay_converges_with_full_replay() {
        let store = test_recording(5);
        let full = replay_full(&mut engine(), &store).unwrap();
        let joined = replay_join_in_progress(&mut engine(), &store, Some(2)).unwrap();

        assert_eq!(joined.len(), 5);
        let reference = engine().reference_pose();
        assert_eq!(joined.poses[0], reference);
        assert_eq!(joined.poses[1], reference);
        for frame in 2..5 {
            assert_eq!(joined.poses[frame], full.poses[frame], "frame {frame}");
        }
    }

    #[test]
    fn every_join_frame_converges_with_full_replay() {
        let store = test_recording_with_delta(5, 1. / 60.);
        let transforms: Vec<_> = store
            .frames()
            .iter()
            .map(|frame| frame.character_world_transform)
            .collect();
        assert!(transforms.windows(2).all(|pair| pair[0] != pair[1]));

        let full = replay_full(&mut engine(), &store).unwrap();
        let reference = engine().reference_pose();
        for join_frame in 0..=3 {
            let joined = replay_join_in_progress(&mut engine(), &store, Some(join_frame)).unwrap();
            assert_eq!(joined.len(), 5);
            assert!(joined.divergent_frames.is_empty(), "join {join_frame}");
            for frame in 0..join_frame {
                assert_eq!(joined.poses[frame], reference, "join {join_frame} frame {frame}");
            }
            for frame in join_frame..5 {
                assert_eq!(
                    joined.poses[frame], full.poses[frame],
                    "join {join_frame} frame {frame}"
                );
            }
        }
    }

    #[test]
    fn join_without_frame_starts_from_first_update_range() {
        let store = test_recording(4);
        let full = replay_full(&mut engine(), &store).unwrap();
        let joined = replay_join_in_progress(&mut engine(), &store, None).unwrap();
        assert_eq!(joined.poses, full.poses);
    }

    #[test]
    fn join_on_last_frame_is_rejected() {
        let store = test_recording(5);
        assert_eq!(
            replay_join_in_progress(&mut engine(), &store, Some(4)),
            Err(ReplayError::JoinFrameOutOfRange {
                join_frame: 4,
                frame_count: 5
            })
        );
        assert!(replay_join_in_progress(&mut engine(), &store, Some(3)).is_ok());
    }

    #[test]
    fn far_out_of_range_join_is_rejected() {
        let store = test_recording(5);
        let expected = Err(ReplayError::JoinFrameOutOfRange {
            join_frame: usize::MAX,
            frame_count: 5,
        });
        assert_eq!(check_join_frame(&store, Some(usize::MAX)), expected);
        assert_eq!(
            replay_join_in_progress(&mut engine(), &store, Some(usize::MAX)),
            Err(ReplayError::JoinFrameOutOfRange {
                join_frame: usize::MAX,
                frame_count: 5,
            })
        );
        assert_eq!(
            check_join_frame(&FrameStore::default(), Some(0)),
            Err(ReplayError::JoinFrameOutOfRange {
                join_frame: 0,
                frame_count: 0
            })
        );
    }

    #[test]
    fn empty_store_is_rejected() {
        assert_eq!(
            replay_full(&mut engine(), &FrameStore::default()),
            Err(ReplayError::NoRecordedData)
        );
        assert_eq!(
            replay_join_in_progress(&mut engine(), &FrameStore::default(), None),
            Err(ReplayError::NoRecordedData)
        );
    }

    #[test]
    fn unfinished_recording_is_rejected() {
        let recorded = test_recording(3);
        let mut store = FrameStore::begin(
            GraphId::new_random(),
            recorded.parameter_layout().to_vec(),
            recorded.initial_state().cloned().unwrap_or_default(),
        );
        store.append(recorded.frames()[0].clone()).unwrap();
        assert_eq!(
            replay_full(&mut engine(), &store),
            Err(ReplayError::RecordingInProgress)
        );
    }

    #[test]
    fn layout_change_is_a_desync() {
        let recorded = test_recording(2);
        let mut layout = recorded.parameter_layout().to_vec();
        layout.pop();
        let mut store = FrameStore::begin(GraphId::new_random(), layout, InitialState::default());
        let mut frame = recorded.frames()[0].clone();
        frame.parameter_data.pop();
        store.append(frame).unwrap();
        store.finalize();

        let err = replay_full(&mut engine(), &store).unwrap_err();
        assert!(matches!(
            err,
            ReplayError::EngineDesync(EngineError::ParameterCountMismatch { .. })
        ));
        assert!(err.invalidates_recording());
    }
}
