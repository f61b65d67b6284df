//! # Bevy Anim Replay
//!
//! Bevy integration of [`bevy_anim_replay_core`]: a plugin that ticks graph engines attached to
//! entities, records one of them, and replays the recording the way a client that joins a
//! networked session part way through would.
//!
//! ```ignore
//! let variation = SyncGraphVariation::new(SyncGraphDefinition::from_ron_str(WALKER_GRAPH_RON)?);
//! app.add_plugins(NetworkReplayPlugin::new(variation.clone()));
//!
//! let entity = commands
//!     .spawn((Transform::default(), ReplayGraphPlayer::new(variation.instantiate(0))))
//!     .id();
//! debug_view.queue(ReplayCommand::StartRecording(entity));
//! // ... later
//! debug_view.queue(ReplayCommand::StopRecording);
//! debug_view.queue(ReplayCommand::SelectFrame(10));
//! debug_view.queue(ReplayCommand::SimulateJoinInProgress);
//! ```
//!
//! The results of the last replay are read through the [`NetworkReplayDebugView`] resource.
//!
//! [`NetworkReplayDebugView`]: crate::debug_view::NetworkReplayDebugView

pub mod debug_view;
pub mod player;
pub mod plugin;

pub use bevy_anim_replay_core as core;

pub mod prelude {
    pub use super::core::prelude::*;
    pub use super::debug_view::*;
    pub use super::player::*;
    pub use super::plugin::*;
}
