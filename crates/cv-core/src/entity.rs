//! Entities and the universe of filterable identifiers

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

/// Canonical identifier of a filterable category value (e.g. one region).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// An entity with its optional display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub label: Option<String>,
}

impl Entity {
    pub fn new(id: impl Into<EntityId>) -> Self {
        Self {
            id: id.into(),
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Display label, falling back to the identifier.
    pub fn display(&self) -> &str {
        self.label.as_deref().unwrap_or_else(|| self.id.as_str())
    }
}

/// The set `U` of entity ids known to the loaded dataset.
///
/// Built once by the loader; selection transitions validate ids against it
/// so a stray id can never enter the committed state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityUniverse {
    ids: AHashSet<EntityId>,
}

impl EntityUniverse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: EntityId) -> bool {
        self.ids.insert(id)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityId> {
        self.ids.iter()
    }
}

impl FromIterator<EntityId> for EntityUniverse {
    fn from_iter<I: IntoIterator<Item = EntityId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_universe_membership() {
        let universe: EntityUniverse =
            ["NY", "CA", "TX"].into_iter().map(EntityId::from).collect();

        assert_eq!(universe.len(), 3);
        assert!(universe.contains(&EntityId::from("NY")));
        assert!(!universe.contains(&EntityId::from("FL")));
    }

    #[test]
    fn test_entity_display_falls_back_to_id() {
        let plain = Entity::new("NY");
        assert_eq!(plain.display(), "NY");

        let labelled = Entity::new("NY").with_label("New York");
        assert_eq!(labelled.display(), "New York");
    }
}
