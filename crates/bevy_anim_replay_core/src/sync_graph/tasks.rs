use std::f32::consts::TAU;

use bevy::math::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::{
    errors::{EngineError, EngineResult},
    pose::{Pose, PoseKind},
    skeleton::Skeleton,
    transform::RigidTransform,
};

/// Directions shorter than this are treated as zero when aiming.
const AIM_EPSILON: f32 = 1e-5;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum AimTarget {
    Bone(usize),
    WorldPoint(Vec3),
}

/// One pose generation step. A tick's task list is executed in order on top of the
/// reference pose.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PoseTask {
    /// Samples the procedural cycle at `phase` (`0.0..1.0` over the whole sync track)
    SampleCycle { phase: f32, sway: f32 },
    Mirror,
    OffsetRoot { offset: Vec3 },
    /// Rotates `bone` so that its forward (+Z) axis points at `target`
    Aim { bone: usize, target: AimTarget },
}

pub fn serialize_tasks(tasks: &[PoseTask]) -> EngineResult<Vec<u8>> {
    rmp_serde::to_vec(tasks).map_err(|err| EngineError::Encode(err.to_string()))
}

pub fn deserialize_tasks(bytes: &[u8]) -> EngineResult<Vec<PoseTask>> {
    rmp_serde::from_slice(bytes).map_err(|err| EngineError::Decode(err.to_string()))
}

/// Resets `pose` to the reference pose and runs `tasks` on it.
///
/// `inverse_world_transform` takes world space aim targets into character space.
pub fn execute_tasks(
    tasks: &[PoseTask],
    skeleton: &Skeleton,
    inverse_world_transform: RigidTransform,
    pose: &mut Pose,
) {
    pose.reset_to_reference(skeleton);

    for task in tasks {
        match task {
            PoseTask::SampleCycle { phase, sway } => sample_cycle(pose, *phase, *sway),
            PoseTask::Mirror => mirror(pose),
            PoseTask::OffsetRoot { offset } => {
                if let Some(root) = pose.bones.first_mut() {
                    root.translation += *offset;
                }
            }
            PoseTask::Aim { bone, target } => {
                aim(pose, skeleton, *bone, *target, inverse_world_transform)
            }
        }
    }

    pose.kind = PoseKind::Animated;
}

/// Post-physics step: renormalizes rotations accumulated by the task list.
pub fn finalize_pose(pose: &mut Pose) {
    for bone in &mut pose.bones {
        bone.rotation = bone.rotation.normalize();
    }
}

fn sample_cycle(pose: &mut Pose, phase: f32, sway: f32) {
    let angle = TAU * phase;
    for (index, bone) in pose.bones.iter_mut().enumerate() {
        let bone_angle = sway * (angle + index as f32 * 0.5).sin();
        bone.rotation *= Quat::from_rotation_x(bone_angle);
    }
    if let Some(root) = pose.bones.first_mut() {
        root.translation.y += 0.05 * sway * (2. * angle).cos();
    }
}

fn mirror(pose: &mut Pose) {
    for bone in &mut pose.bones {
        let r = bone.rotation;
        bone.rotation = Quat::from_xyzw(r.x, -r.y, -r.z, r.w);
        bone.translation.x = -bone.translation.x;
    }
}

fn aim(
    pose: &mut Pose,
    skeleton: &Skeleton,
    bone: usize,
    target: AimTarget,
    inverse_world_transform: RigidTransform,
) {
    let model = pose.model_space(skeleton);
    let Some(bone_model) = model.get(bone) else {
        return;
    };

    let target_position = match target {
        AimTarget::Bone(target_bone) => match model.get(target_bone) {
            Some(t) => t.translation,
            None => return,
        },
        AimTarget::WorldPoint(point) => inverse_world_transform.transform_point(point),
    };

    let forward = bone_model.rotation * Vec3::Z;
    let direction = target_position - bone_model.translation;
    if forward.length() < AIM_EPSILON || direction.length() < AIM_EPSILON {
        return;
    }

    let correction = Quat::from_rotation_arc(forward.normalize(), direction.normalize());
    let new_model_rotation = correction * bone_model.rotation;
    let parent_rotation = skeleton
        .parent(bone)
        .and_then(|parent| model.get(parent))
        .map(|parent| parent.rotation)
        .unwrap_or(Quat::IDENTITY);

    pose.bones[bone].rotation = parent_rotation.inverse() * new_model_rotation;
}
