use bevy::log::{debug, info};

use crate::{
    engine::GraphEngine,
    errors::{FrameStoreError, RecordingError},
    frame::RecordedFrame,
    frame_store::FrameStore,
    id::GraphId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The frame was appended at this index
    Recorded(usize),
    /// The tick was a repeat or a stall and nothing was recorded
    Suppressed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum RecorderState {
    #[default]
    Idle,
    Recording {
        last_tick: Option<u64>,
    },
}

/// Captures one [`RecordedFrame`] per host simulation tick into a [`FrameStore`].
#[derive(Debug, Default)]
pub struct FrameRecorder {
    store: FrameStore,
    state: RecorderState,
}

impl FrameRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discards previous data and starts a new recording, capturing `engine`'s current state as
    /// the initial state.
    pub fn start_recording<E: GraphEngine + ?Sized>(
        &mut self,
        graph_id: GraphId,
        engine: &E,
    ) -> Result<(), RecordingError> {
        if self.is_recording() {
            return Err(RecordingError::AlreadyRecording);
        }

        let initial_state = engine
            .serialize_current_state()
            .map_err(RecordingError::InitialState)?;

        self.store = FrameStore::begin(graph_id, engine.control_parameter_layout(), initial_state);
        self.state = RecorderState::Recording { last_tick: None };
        info!("Started recording graph {graph_id}");
        Ok(())
    }

    /// Appends `frame` for host tick `tick`.
    ///
    /// Ticks that were already recorded (same or older tick number) and ticks with no elapsed
    /// time are suppressed, so a paused or stalled engine never produces duplicate frames.
    /// Non-finite deltas are suppressed as well.
    pub fn record_tick(
        &mut self,
        tick: u64,
        frame: RecordedFrame,
    ) -> Result<TickOutcome, RecordingError> {
        let RecorderState::Recording { last_tick } = &mut self.state else {
            return Err(RecordingError::NotRecording);
        };

        let stalled = !(frame.delta_time > 0. && frame.delta_time.is_finite());
        if last_tick.is_some_and(|last| tick <= last) || stalled {
            debug!("Suppressed recording of tick {tick}");
            return Ok(TickOutcome::Suppressed);
        }

        let index = self.store.append(frame)?;
        *last_tick = Some(tick);
        Ok(TickOutcome::Recorded(index))
    }

    /// Finalizes the frame store. Does nothing when not recording.
    pub fn stop_recording(&mut self) {
        if !self.is_recording() {
            return;
        }
        self.store.finalize();
        self.state = RecorderState::Idle;
        info!("Stopped recording after {} frames", self.store.count());
    }

    /// Stops any recording in progress and discards all recorded data.
    pub fn reset(&mut self) {
        self.state = RecorderState::Idle;
        self.store.reset();
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.state, RecorderState::Recording { .. })
    }

    pub fn has_recorded_data(&self) -> bool {
        self.store.has_data()
    }

    pub fn graph_id(&self) -> Option<GraphId> {
        self.store.graph_id()
    }

    pub fn store(&self) -> &FrameStore {
        &self.store
    }

    /// Frame `index` of the current recording.
    pub fn frame(&self, index: usize) -> Result<&RecordedFrame, FrameStoreError> {
        self.store.get(index)
    }
}
