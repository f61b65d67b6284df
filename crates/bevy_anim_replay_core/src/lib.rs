//! # Bevy Anim Replay Core
//!
//! Records the inputs and outputs of an animation graph, one frame per simulation tick, and
//! replays them deterministically to check that a networked client reproduces the sender's
//! poses.
//!
//! ## Overview
//!
//! - A [`FrameRecorder`] captures the graph's state when recording starts (an [`InitialState`])
//!   and then one [`RecordedFrame`] per host tick: delta time, character transform, the sync
//!   range the update covered, the control parameter values and the serialized task stream the
//!   graph produced. Frames land in a [`FrameStore`], which is finalized when recording stops.
//! - [`replay_full`] restores the initial state and evaluates every frame again. This is what
//!   the sender saw.
//! - [`replay_join_in_progress`] models a client that starts receiving the stream at some frame.
//!   It cannot replay history, so it seeds the parameters from that frame and resets the graph
//!   to the frame's sync range start. Frames before the join point are filled with the
//!   reference pose.
//! - A [`ReplaySession`] owns the engine instances for both passes, the task system used to
//!   execute a recorded task stream on its own, and the serialized size statistics.
//! - A [`FrameInspector`] turns a selected frame into a [`FrameReport`] and the poses to
//!   compare.
//!
//! The animation runtime is reached through the [`GraphEngine`], [`TaskSystem`] and
//! [`GraphVariation`] traits. The [`sync_graph`] module provides a small deterministic runtime
//! implementing them, loadable from `*.syncgraph.ron` files:
//!
//! ```ron
//! (
//!     skeleton: [
//!         (name: "root", reference: (translation: (0.0, 1.0, 0.0))),
//!         (name: "head", parent: Some(0), reference: (translation: (0.0, 0.6, 0.0))),
//!     ],
//!     sync_events: [
//!         (id: "left_foot_down", duration: 0.5),
//!         (id: "right_foot_down", duration: 0.5),
//!     ],
//!     control_parameters: {
//!         "speed": Float(1.0),
//!         "look_at": Target(Unset),
//!     },
//!     bindings: (speed: Some("speed"), aim: Some("look_at"), aim_bone: Some("head")),
//! )
//! ```
//!
//! [`FrameRecorder`]: crate::recorder::FrameRecorder
//! [`InitialState`]: crate::frame::InitialState
//! [`RecordedFrame`]: crate::frame::RecordedFrame
//! [`FrameStore`]: crate::frame_store::FrameStore
//! [`replay_full`]: crate::replay::replay_full
//! [`replay_join_in_progress`]: crate::replay::replay_join_in_progress
//! [`ReplaySession`]: crate::replay::ReplaySession
//! [`FrameInspector`]: crate::inspector::FrameInspector
//! [`FrameReport`]: crate::inspector::FrameReport
//! [`GraphEngine`]: crate::engine::GraphEngine
//! [`TaskSystem`]: crate::engine::TaskSystem
//! [`GraphVariation`]: crate::engine::GraphVariation

pub mod control_parameters;
pub mod engine;
pub mod errors;
pub mod frame;
pub mod frame_store;
pub mod id;
pub mod inspector;
pub mod pose;
pub mod recorder;
pub mod replay;
pub mod skeleton;
pub mod sync_graph;
pub mod sync_time;
pub mod transform;

pub mod prelude {
    pub use super::control_parameters::*;
    pub use super::engine::*;
    pub use super::errors::*;
    pub use super::frame::*;
    pub use super::frame_store::*;
    pub use super::id::*;
    pub use super::inspector::*;
    pub use super::pose::*;
    pub use super::recorder::*;
    pub use super::replay::*;
    pub use super::skeleton::*;
    pub use super::sync_graph::{
        SyncGraphDefinition, SyncGraphDefinitionSerial, SyncGraphInstance, SyncGraphVariation,
        SyncTaskSystem, WALKER_GRAPH_RON,
    };
    pub use super::sync_time::*;
    pub use super::transform::*;
}
