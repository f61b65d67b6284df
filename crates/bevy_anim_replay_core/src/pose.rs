use bevy::{
    math::{Quat, Vec3},
    reflect::{Reflect, std_traits::ReflectDefault},
    transform::components::Transform,
};
use serde::{Deserialize, Serialize};

use crate::{skeleton::Skeleton, transform::RigidTransform};

/// Local (parent space) transform of a single bone.
#[derive(Reflect, Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[reflect(Default)]
#[serde(default)]
pub struct BonePose {
    pub rotation: Quat,
    pub translation: Vec3,
    pub scale: Vec3,
}

impl Default for BonePose {
    fn default() -> Self {
        Self {
            rotation: Quat::IDENTITY,
            translation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl BonePose {
    pub fn to_transform(&self) -> Transform {
        Transform {
            translation: self.translation,
            rotation: self.rotation,
            scale: self.scale,
        }
    }

    pub fn to_rigid(&self) -> RigidTransform {
        RigidTransform::new(self.rotation, self.translation)
    }
}

#[derive(Reflect, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[reflect(Default)]
pub enum PoseKind {
    /// The skeleton's bind pose, untouched by any evaluation
    #[default]
    ReferencePose,
    /// Result of evaluating a graph or executing a task list
    Animated,
}

/// Snapshot of every bone of a skeleton at one instant.
#[derive(Reflect, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[reflect(Default)]
pub struct Pose {
    pub bones: Vec<BonePose>,
    pub kind: PoseKind,
}

impl Pose {
    pub fn reference(skeleton: &Skeleton) -> Self {
        Self {
            bones: skeleton.bones().iter().map(|b| b.reference).collect(),
            kind: PoseKind::ReferencePose,
        }
    }

    pub fn is_reference_pose(&self) -> bool {
        self.kind == PoseKind::ReferencePose
    }

    /// Resets every bone to the skeleton's reference pose.
    pub fn reset_to_reference(&mut self, skeleton: &Skeleton) {
        self.bones.clear();
        self.bones
            .extend(skeleton.bones().iter().map(|b| b.reference));
        self.kind = PoseKind::ReferencePose;
    }

    /// Character (model) space transform of each bone, ignoring scale.
    pub fn model_space(&self, skeleton: &Skeleton) -> Vec<RigidTransform> {
        let mut result: Vec<RigidTransform> = Vec::with_capacity(self.bones.len());
        for (index, bone) in self.bones.iter().enumerate() {
            let local = bone.to_rigid();
            let model = match skeleton.parent(index).and_then(|p| result.get(p)) {
                Some(parent) => parent.mul_transform(&local),
                None => local,
            };
            result.push(model);
        }
        result
    }

    /// Largest per-bone translation difference and rotation angle difference between two poses.
    /// Bones missing in either pose are ignored.
    pub fn max_difference(&self, other: &Pose) -> (f32, f32) {
        self.bones
            .iter()
            .zip(&other.bones)
            .fold((0f32, 0f32), |(translation, rotation), (a, b)| {
                (
                    translation.max(a.translation.distance(b.translation)),
                    rotation.max(a.rotation.angle_between(b.rotation)),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::BoneDefinition;

    fn two_bone_skeleton() -> Skeleton {
        Skeleton::new(vec![
            BoneDefinition {
                name: "root".into(),
                parent: None,
                reference: BonePose {
                    translation: Vec3::Y,
                    ..Default::default()
                },
            },
            BoneDefinition {
                name: "child".into(),
                parent: Some(0),
                reference: BonePose {
                    translation: Vec3::Y,
                    ..Default::default()
                },
            },
        ])
        .unwrap()
    }

    #[test]
    fn reference_pose_matches_skeleton() {
        let skeleton = two_bone_skeleton();
        let pose = Pose::reference(&skeleton);
        assert!(pose.is_reference_pose());
        assert_eq!(pose.bones.len(), 2);
        assert_eq!(pose.bones[1].translation, Vec3::Y);
    }

    #[test]
    fn model_space_accumulates_parents() {
        let skeleton = two_bone_skeleton();
        let model = Pose::reference(&skeleton).model_space(&skeleton);
        assert!(model[1].translation.abs_diff_eq(Vec3::new(0., 2., 0.), 1e-6));
    }

    #[test]
    fn identical_poses_have_no_difference() {
        let skeleton = two_bone_skeleton();
        let pose = Pose::reference(&skeleton);
        assert_eq!(pose.max_difference(&pose.clone()), (0., 0.));
    }
}
