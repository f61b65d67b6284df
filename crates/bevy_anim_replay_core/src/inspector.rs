//! Read-only presentation of a recording: per-frame reports and the poses to compare for the
//! selected frame.

use std::fmt;

use crate::{
    control_parameters::ControlParamValue,
    engine::{GraphEngine, GraphVariation},
    errors::FrameStoreError,
    frame_store::FrameStore,
    pose::Pose,
    replay::ReplaySession,
    sync_time::SyncTrackTimeRange,
    transform::RigidTransform,
};

#[derive(Clone, Debug, PartialEq)]
pub struct ParameterRow {
    pub label: String,
    pub value: ControlParamValue,
}

impl fmt::Display for ParameterRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label, self.value)
    }
}

/// Everything shown about one recorded frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameReport {
    pub frame: usize,
    pub sync_range: SyncTrackTimeRange,
    pub serialized_task_size: usize,
    pub parameters: Vec<ParameterRow>,
    /// Where the poses of this frame are drawn: the following frame's character transform, or
    /// this frame's on the last frame.
    pub draw_transform: RigidTransform,
}

impl fmt::Display for FrameReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Frame {}", self.frame)?;
        writeln!(f, "Sync Range: {}", self.sync_range)?;
        write!(f, "Serialized Task Size: {} bytes", self.serialized_task_size)?;
        for row in &self.parameters {
            write!(f, "\n  {row}")?;
        }
        Ok(())
    }
}

/// Poses available for a frame. Any of them may be missing when the recording has not been
/// processed, or when the generated pose belongs to another frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FramePoses<'a> {
    pub actual: Option<&'a Pose>,
    pub replicated: Option<&'a Pose>,
    pub generated: Option<&'a Pose>,
}

impl FramePoses<'_> {
    /// Whether the actual and replicated poses are both present and identical.
    pub fn tracks_match(&self) -> bool {
        matches!((self.actual, self.replicated), (Some(a), Some(r)) if a == r)
    }
}

/// Keeps track of the frame being inspected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameInspector {
    selected: Option<usize>,
}

impl FrameInspector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Selects `frame`, clamped to the last of `frame_count` frames. Selects nothing when there
    /// are no frames.
    pub fn select(&mut self, frame: usize, frame_count: usize) -> Option<usize> {
        self.selected = frame_count.checked_sub(1).map(|last| frame.min(last));
        self.selected
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }

    /// Report for the selected frame, labelling parameters with `engine`'s parameter ids.
    pub fn report<E: GraphEngine + ?Sized>(
        &self,
        store: &FrameStore,
        engine: &E,
    ) -> Result<Option<FrameReport>, FrameStoreError> {
        self.selected
            .map(|frame| frame_report(store, engine, frame))
            .transpose()
    }

    pub fn poses<'a, V: GraphVariation>(&self, session: &'a ReplaySession<V>) -> FramePoses<'a> {
        let Some(frame) = self.selected else {
            return FramePoses::default();
        };
        FramePoses {
            actual: session.actual_pose(frame),
            replicated: session.replicated_pose(frame),
            generated: session
                .generated_pose()
                .filter(|(generated_frame, _)| *generated_frame == frame)
                .map(|(_, pose)| pose),
        }
    }
}

/// Builds the report for `frame`. Parameters without an id on `engine` are labelled by index.
pub fn frame_report<E: GraphEngine + ?Sized>(
    store: &FrameStore,
    engine: &E,
    frame: usize,
) -> Result<FrameReport, FrameStoreError> {
    let recorded = store.get(frame)?;
    let next = store.get_next_or_last(frame)?;

    let parameters = recorded
        .parameter_data
        .iter()
        .enumerate()
        .map(|(index, value)| ParameterRow {
            label: engine
                .control_parameter_id(index)
                .map(str::to_string)
                .unwrap_or_else(|| format!("#{index}")),
            value: value.clone(),
        })
        .collect();

    Ok(FrameReport {
        frame,
        sync_range: recorded.update_range,
        serialized_task_size: recorded.serialized_task_size(),
        parameters,
        draw_transform: next.character_world_transform,
    })
}
