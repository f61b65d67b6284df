use bevy::{
    ecs::prelude::*,
    log::warn,
    math::{Quat, Vec3},
    transform::components::Transform,
};
use bevy_anim_replay::{
    core::{
        control_parameters::{ControlParamType, ControlParamValue, Target},
        sync_graph::SyncGraphInstance,
    },
    player::ReplayGraphPlayer,
};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Character driven by [`drive_inputs`].
#[derive(Component)]
pub struct DrivenCharacter;

/// Seeded source of control parameter values, re-rolled every `interval` ticks.
#[derive(Resource)]
pub struct InputDriver {
    rng: StdRng,
    interval: usize,
    ticks: usize,
    velocity: Vec3,
}

impl InputDriver {
    pub fn new(seed: u64, interval: usize) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            interval: interval.max(1),
            ticks: 0,
            velocity: Vec3::Z,
        }
    }

    fn random_value(&mut self, ty: ControlParamType, current: &ControlParamValue) -> ControlParamValue {
        let rng = &mut self.rng;
        match ty {
            ControlParamType::Bool => ControlParamValue::Bool(rng.random_bool(0.3)),
            ControlParamType::Id => current.clone(),
            ControlParamType::Int => ControlParamValue::Int(rng.random_range(0..4)),
            ControlParamType::Float => ControlParamValue::Float(rng.random_range(0.0..1.5)),
            ControlParamType::Vector => ControlParamValue::Vector(Vec3::new(
                rng.random_range(-0.1..0.1),
                rng.random_range(-0.1..0.1),
                rng.random_range(-0.1..0.1),
            )),
            ControlParamType::Target => ControlParamValue::Target(if rng.random_bool(0.5) {
                Target::Point(Vec3::new(
                    rng.random_range(-5.0..5.0),
                    rng.random_range(0.0..2.0),
                    rng.random_range(-5.0..5.0),
                ))
            } else {
                Target::Unset
            }),
        }
    }
}

/// Moves the driven characters and periodically feeds them new control parameters.
pub fn drive_inputs(
    mut driver: ResMut<InputDriver>,
    mut characters: Query<
        (&mut Transform, &mut ReplayGraphPlayer<SyncGraphInstance>),
        With<DrivenCharacter>,
    >,
) {
    let reroll = driver.ticks % driver.interval == 0;
    driver.ticks += 1;

    for (mut transform, mut player) in &mut characters {
        if reroll {
            let turn = driver.rng.random_range(-0.5..0.5);
            driver.velocity = (Quat::from_rotation_y(turn) * driver.velocity).normalize();

            let engine = player.engine_mut();
            let definition = engine.definition().clone();
            for (name, ty) in definition.parameters() {
                let Some(current) = engine.parameter(name) else {
                    continue;
                };
                let value = driver.random_value(*ty, current);
                if let Err(error) = engine.set_parameter(name, value) {
                    warn!("Could not set {name}: {error}");
                }
            }
        }

        let rotation = transform.rotation;
        transform.translation += driver.velocity * 0.05;
        transform.rotation = rotation.slerp(
            Quat::from_rotation_arc(Vec3::Z, driver.velocity),
            0.2,
        );
    }
}
