use bevy::reflect::Reflect;

use crate::{
    control_parameters::{ControlParamType, validate_layout},
    errors::FrameStoreError,
    frame::{InitialState, RecordedFrame},
    id::GraphId,
};

/// Append-only sequence of recorded frames for a single graph, plus the state the graph was in
/// before the first of them.
///
/// Frame indices are contiguous and zero based. Frames are never removed individually; the
/// whole store is cleared with [`FrameStore::reset`].
#[derive(Reflect, Clone, Debug, Default)]
pub struct FrameStore {
    graph_id: Option<GraphId>,
    parameter_layout: Vec<ControlParamType>,
    initial_state: Option<InitialState>,
    frames: Vec<RecordedFrame>,
    finalized: bool,
}

impl FrameStore {
    /// Empty store ready to receive frames recorded from `graph_id`.
    pub fn begin(
        graph_id: GraphId,
        parameter_layout: Vec<ControlParamType>,
        initial_state: InitialState,
    ) -> Self {
        Self {
            graph_id: Some(graph_id),
            parameter_layout,
            initial_state: Some(initial_state),
            frames: Vec::new(),
            finalized: false,
        }
    }

    pub fn append(&mut self, frame: RecordedFrame) -> Result<usize, FrameStoreError> {
        if self.finalized || self.graph_id.is_none() {
            return Err(FrameStoreError::Finalized);
        }
        validate_layout(&self.parameter_layout, &frame.parameter_data)
            .map_err(FrameStoreError::LayoutMismatch)?;

        let index = self.frames.len();
        self.frames.push(frame);
        Ok(index)
    }

    pub fn get(&self, index: usize) -> Result<&RecordedFrame, FrameStoreError> {
        self.frames.get(index).ok_or(FrameStoreError::OutOfRange {
            index,
            count: self.frames.len(),
        })
    }

    /// Frame after `index`, or `index` itself when it is the last one.
    pub fn get_next_or_last(&self, index: usize) -> Result<&RecordedFrame, FrameStoreError> {
        let next = if index + 1 < self.frames.len() {
            index + 1
        } else {
            index
        };
        self.get(next)
    }

    /// Number of recorded frames, not counting the initial state.
    pub fn count(&self) -> usize {
        self.frames.len()
    }

    pub fn has_data(&self) -> bool {
        !self.frames.is_empty()
    }

    pub fn frames(&self) -> &[RecordedFrame] {
        &self.frames
    }

    pub fn initial_state(&self) -> Option<&InitialState> {
        self.initial_state.as_ref()
    }

    pub fn graph_id(&self) -> Option<GraphId> {
        self.graph_id
    }

    pub fn parameter_layout(&self) -> &[ControlParamType] {
        &self.parameter_layout
    }

    /// Stops accepting frames. Idempotent.
    pub fn finalize(&mut self) {
        self.finalized = true;
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Byte size of each frame's serialized task stream, in frame order.
    pub fn serialized_task_sizes(&self) -> impl Iterator<Item = usize> + '_ {
        self.frames.iter().map(RecordedFrame::serialized_task_size)
    }

    /// Drops every frame and the initial state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        control_parameters::ControlParamValue, errors::EngineError,
        sync_time::SyncTrackTimeRange, transform::RigidTransform,
    };

    fn frame(value: f32, task_bytes: usize) -> RecordedFrame {
        RecordedFrame::new(
            1. / 60.,
            RigidTransform::IDENTITY,
            SyncTrackTimeRange::default(),
            vec![ControlParamValue::Float(value)],
            vec![0; task_bytes],
        )
    }

    fn store() -> FrameStore {
        FrameStore::begin(
            GraphId::new_random(),
            vec![ControlParamType::Float],
            InitialState::new(vec![1, 2, 3]),
        )
    }

    #[test]
    fn append_and_get() {
        let mut store = store();
        assert!(!store.has_data());
        assert_eq!(store.append(frame(0., 4)), Ok(0));
        assert_eq!(store.append(frame(1., 8)), Ok(1));
        assert_eq!(store.count(), 2);
        assert!(store.has_data());
        assert_eq!(store.get(1).map(|f| f.serialized_task_size()), Ok(8));
        assert_eq!(store.serialized_task_sizes().collect::<Vec<_>>(), vec![4, 8]);
    }

    #[test]
    fn get_out_of_range() {
        let mut store = store();
        store.append(frame(0., 1)).unwrap();
        assert_eq!(
            store.get(1),
            Err(FrameStoreError::OutOfRange { index: 1, count: 1 })
        );
    }

    #[test]
    fn next_or_last_clamps_at_the_end() {
        let mut store = store();
        store.append(frame(0., 1)).unwrap();
        store.append(frame(1., 2)).unwrap();
        assert_eq!(store.get_next_or_last(0).unwrap().serialized_task_size(), 2);
        assert_eq!(store.get_next_or_last(1).unwrap().serialized_task_size(), 2);
    }

    #[test]
    fn finalized_store_rejects_frames() {
        let mut store = store();
        store.finalize();
        assert_eq!(store.append(frame(0., 1)), Err(FrameStoreError::Finalized));
    }

    #[test]
    fn default_store_rejects_frames() {
        let mut store = FrameStore::default();
        assert_eq!(store.append(frame(0., 1)), Err(FrameStoreError::Finalized));
    }

    #[test]
    fn mismatched_layout_is_rejected() {
        let mut store = store();
        let mut bad = frame(0., 1);
        bad.parameter_data = vec![ControlParamValue::Bool(true)];
        assert_eq!(
            store.append(bad),
            Err(FrameStoreError::LayoutMismatch(
                EngineError::ParameterTypeMismatch {
                    index: 0,
                    expected: ControlParamType::Float,
                    found: ControlParamType::Bool,
                }
            ))
        );
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn reset_discards_everything() {
        let mut store = store();
        store.append(frame(0., 1)).unwrap();
        store.finalize();
        store.reset();
        assert_eq!(store.count(), 0);
        assert!(store.initial_state().is_none());
        assert!(store.graph_id().is_none());
        assert!(!store.is_finalized());
    }
}
