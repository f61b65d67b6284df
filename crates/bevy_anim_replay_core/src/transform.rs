use bevy::{
    math::{Quat, Vec3},
    reflect::{Reflect, std_traits::ReflectDefault},
    transform::components::Transform,
};
use serde::{Deserialize, Serialize};

/// Rotation and translation of a character in world space. Scale is never recorded.
#[derive(Reflect, Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[reflect(Default)]
pub struct RigidTransform {
    pub rotation: Quat,
    pub translation: Vec3,
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl RigidTransform {
    pub const IDENTITY: Self = Self {
        rotation: Quat::IDENTITY,
        translation: Vec3::ZERO,
    };

    pub fn new(rotation: Quat, translation: Vec3) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            rotation: Quat::IDENTITY,
            translation,
        }
    }

    pub fn inverse(&self) -> Self {
        let rotation = self.rotation.inverse();
        Self {
            rotation,
            translation: rotation * -self.translation,
        }
    }

    /// `self * other`: applies `other` first, then `self`
    pub fn mul_transform(&self, other: &RigidTransform) -> Self {
        Self {
            rotation: self.rotation * other.rotation,
            translation: self.translation + self.rotation * other.translation,
        }
    }

    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.translation + self.rotation * point
    }
}

impl From<Transform> for RigidTransform {
    fn from(value: Transform) -> Self {
        Self {
            rotation: value.rotation,
            translation: value.translation,
        }
    }
}

impl From<RigidTransform> for Transform {
    fn from(value: RigidTransform) -> Self {
        Transform {
            translation: value.translation,
            rotation: value.rotation,
            scale: Vec3::ONE,
        }
    }
}
