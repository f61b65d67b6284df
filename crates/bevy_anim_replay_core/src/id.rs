use std::fmt;

use bevy::reflect::{Reflect, std_traits::ReflectDefault};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies the graph variation a recording was made from. Recordings are invalidated when
/// the graph with this id is reloaded.
#[derive(
    Reflect, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize,
)]
#[reflect(Default)]
#[serde(transparent)]
pub struct GraphId(Uuid);

impl GraphId {
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for GraphId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_plain_uuid() {
        let uuid = Uuid::parse_str("5b8e2f0c-94a1-4c2e-8d7b-1f3a6c9e0b42").unwrap();
        let id = GraphId::from(uuid);
        let text = ron::ser::to_string(&id).unwrap();
        assert_eq!(text, "\"5b8e2f0c-94a1-4c2e-8d7b-1f3a6c9e0b42\"");
        assert_eq!(ron::de::from_str::<GraphId>(&text).unwrap(), id);
    }
}
