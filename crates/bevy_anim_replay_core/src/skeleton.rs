use bevy::{platform::collections::HashMap, reflect::Reflect};
use serde::{Deserialize, Serialize};

use crate::{errors::DefinitionError, pose::BonePose};

#[derive(Reflect, Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BoneDefinition {
    pub name: String,
    /// Index of the parent bone. Parents always come before their children.
    #[serde(default)]
    pub parent: Option<usize>,
    #[serde(default)]
    pub reference: BonePose,
}

/// Bone hierarchy of a character plus its reference (bind) pose.
#[derive(Reflect, Clone, Debug, Default, PartialEq)]
pub struct Skeleton {
    bones: Vec<BoneDefinition>,
    by_name: HashMap<String, usize>,
}

impl Skeleton {
    pub fn new(bones: Vec<BoneDefinition>) -> Result<Self, DefinitionError> {
        if bones.is_empty() {
            return Err(DefinitionError::EmptySkeleton);
        }

        for (index, bone) in bones.iter().enumerate() {
            if let Some(parent) = bone.parent
                && parent >= index
            {
                return Err(DefinitionError::InvalidParent {
                    bone: index,
                    parent,
                });
            }
        }

        let by_name = bones
            .iter()
            .enumerate()
            .map(|(index, bone)| (bone.name.clone(), index))
            .collect();

        Ok(Self { bones, by_name })
    }

    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    pub fn bones(&self) -> &[BoneDefinition] {
        &self.bones
    }

    pub fn bone_index(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn parent(&self, index: usize) -> Option<usize> {
        self.bones.get(index).and_then(|b| b.parent)
    }

    pub fn reference_bone(&self, index: usize) -> Option<&BonePose> {
        self.bones.get(index).map(|b| &b.reference)
    }
}
