//! Entity references - the owners of asset namespaces

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kinds of entity allowed to own assets
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Exploration,
    Topic,
    Skill,
    Story,
    Question,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Exploration,
        EntityKind::Topic,
        EntityKind::Skill,
        EntityKind::Story,
        EntityKind::Question,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Exploration => "exploration",
            EntityKind::Topic => "topic",
            EntityKind::Skill => "skill",
            EntityKind::Story => "story",
            EntityKind::Question => "question",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        EntityKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::InvalidConfiguration(format!("Invalid entity_name received: {}.", s)))
    }
}

/// Identifies the owner of an asset namespace.
///
/// Validated once on construction; the assets root is derived from it and
/// never changes afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EntityRef {
    kind: EntityKind,
    id: String,
    assets_root: String,
}

impl EntityRef {
    /// Create a reference for an entity of a known kind
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(Error::InvalidConfiguration("Entity id cannot be empty".into()));
        }
        // Any of these would shift the segment layout of every stored key.
        if id.contains('/') || id == "." || id == ".." {
            return Err(Error::InvalidConfiguration(format!(
                "Invalid entity_id received: {}",
                id
            )));
        }
        let assets_root = format!("{}/{}/assets", kind, id);
        Ok(EntityRef {
            kind,
            id,
            assets_root,
        })
    }

    /// Create a reference from an untyped entity name
    pub fn parse(entity_name: &str, entity_id: impl Into<String>) -> Result<Self> {
        Self::new(entity_name.parse()?, entity_id)
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// `<entity_name>/<entity_id>/assets`
    pub fn assets_root(&self) -> &str {
        &self.assets_root
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assets_root_for_every_kind() {
        for kind in EntityKind::ALL {
            let entity = EntityRef::new(kind, "entity_id").unwrap();
            assert_eq!(
                entity.assets_root(),
                format!("{}/entity_id/assets", kind.as_str())
            );
        }
    }

    #[test]
    fn test_parse_entity_name() {
        let entity = EntityRef::parse("topic", "t1").unwrap();
        assert_eq!(entity.kind(), EntityKind::Topic);
        assert_eq!(entity.assets_root(), "topic/t1/assets");
    }

    #[test]
    fn test_invalid_entity_name() {
        let err = EntityRef::parse("invalid_name", "id").unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(_)));
    }

    #[test]
    fn test_empty_entity_id() {
        let err = EntityRef::new(EntityKind::Exploration, "").unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(_)));
    }

    #[test]
    fn test_entity_id_with_slash() {
        assert!(EntityRef::new(EntityKind::Story, "a/b").is_err());
    }

    #[test]
    fn test_entity_id_dot_segments() {
        for id in [".", ".."] {
            let err = EntityRef::new(EntityKind::Exploration, id).unwrap_err();
            assert!(matches!(err, Error::InvalidConfiguration(_)), "accepted {}", id);
        }
        assert!(EntityRef::new(EntityKind::Exploration, "..a").is_ok());
    }
}
