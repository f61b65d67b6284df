use bevy::{
    ecs::prelude::*,
    log::warn,
    time::Time,
    transform::components::Transform,
};
use bevy_anim_replay_core::{
    engine::{GraphEngine, GraphVariation},
    errors::{EngineError, EngineResult},
    frame::RecordedFrame,
    pose::Pose,
    transform::RigidTransform,
};

use crate::debug_view::NetworkReplayDebugView;

/// Drives a live graph engine instance once per tick of the replay schedule.
#[derive(Component)]
pub struct ReplayGraphPlayer<E: GraphEngine> {
    engine: E,
    /// Host simulation tick, incremented every time the player is ticked
    tick: u64,
    paused: bool,
    /// Error that occurred during evaluation in the last tick
    error: Option<EngineError>,
}

impl<E: GraphEngine> ReplayGraphPlayer<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            tick: 0,
            paused: false,
            error: None,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Mutable access to the engine, e.g. to set control parameters before the next tick.
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn pose(&self) -> &Pose {
        self.engine.pose()
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn pause(&mut self) -> &mut Self {
        self.paused = true;
        self
    }

    pub fn resume(&mut self) -> &mut Self {
        self.paused = false;
        self
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// If evaluation produced an error in the last tick return the error, otherwise return
    /// `None`.
    pub fn error(&self) -> Option<&EngineError> {
        self.error.as_ref()
    }

    /// Evaluates one tick and runs both pose phases. Returns the serialized task stream.
    fn advance(&mut self, delta_time: f32, world_transform: RigidTransform) -> EngineResult<Vec<u8>> {
        let tasks = self.engine.evaluate(delta_time, world_transform)?;
        self.engine.execute_pre_physics_tasks(world_transform)?;
        self.engine.execute_post_physics_tasks()?;
        Ok(tasks)
    }
}

/// Ticks every unpaused [`ReplayGraphPlayer`] and records the one the debug view targets.
pub fn tick_replay_graphs<V: GraphVariation>(
    time: Res<Time>,
    mut players: Query<(Entity, &Transform, &mut ReplayGraphPlayer<V::Instance>)>,
    mut debug_view: ResMut<NetworkReplayDebugView<V>>,
) {
    let delta_time = time.delta_secs();
    if delta_time <= 0. {
        return;
    }

    for (entity, transform, mut player) in &mut players {
        if player.paused {
            continue;
        }

        player.tick += 1;
        let world_transform = RigidTransform::from(*transform);
        let tasks = match player.advance(delta_time, world_transform) {
            Ok(tasks) => {
                player.error = None;
                tasks
            }
            Err(error) => {
                warn!("Replay graph player {entity} failed to evaluate: {error}");
                player.error = Some(error);
                continue;
            }
        };

        if debug_view.recording_target() == Some(entity) {
            let frame = RecordedFrame::capture(&player.engine, delta_time, world_transform, tasks);
            debug_view.record_tick(player.tick, frame);
        }
    }
}
