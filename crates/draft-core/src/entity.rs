use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DraftError, Result};

pub type EntityData = BTreeMap<String, Value>;

/// Opaque lookup key of an entity inside an [`EntityMap`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityKey(String);

impl EntityKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityMutability {
    /// Text may be edited freely; the entity stays attached to what remains.
    Mutable,
    /// Any edit touching the entity removes it whole.
    Immutable,
    /// Removal proceeds one whitespace-delimited segment at a time.
    Segmented,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftEntityInstance {
    #[serde(rename = "type")]
    entity_type: String,
    mutability: EntityMutability,
    #[serde(default)]
    data: EntityData,
}

impl DraftEntityInstance {
    pub fn new(
        entity_type: impl Into<String>,
        mutability: EntityMutability,
        data: EntityData,
    ) -> Self {
        Self {
            entity_type: entity_type.into(),
            mutability,
            data,
        }
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn mutability(&self) -> EntityMutability {
        self.mutability
    }

    pub fn data(&self) -> &EntityData {
        &self.data
    }

    pub fn with_data(&self, data: EntityData) -> Self {
        Self {
            data,
            ..self.clone()
        }
    }
}

/// Table binding entity keys to immutable entity values.
///
/// Each document owns its own table. Cloning is O(1) and the clone evolves
/// independently, so snapshots on the undo stack keep the entities they saw.
#[derive(Debug, Clone, Default)]
pub struct EntityMap {
    instances: imbl::HashMap<EntityKey, DraftEntityInstance>,
    last_created: Option<EntityKey>,
}

impl EntityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a new entity under a fresh key. Identical data still yields a
    /// distinct key: entities are never deduplicated.
    pub fn create(
        &mut self,
        entity_type: impl Into<String>,
        mutability: EntityMutability,
        data: EntityData,
    ) -> EntityKey {
        self.add(DraftEntityInstance::new(entity_type, mutability, data))
    }

    pub fn add(&mut self, instance: DraftEntityInstance) -> EntityKey {
        let key = EntityKey::generate();
        self.instances.insert(key.clone(), instance);
        self.last_created = Some(key.clone());
        key
    }

    pub fn get(&self, key: &EntityKey) -> Result<&DraftEntityInstance> {
        self.instances
            .get(key)
            .ok_or_else(|| DraftError::UnknownEntity(key.clone()))
    }

    pub fn contains(&self, key: &EntityKey) -> bool {
        self.instances.contains_key(key)
    }

    pub fn merge_data(
        &mut self,
        key: &EntityKey,
        to_merge: EntityData,
    ) -> Result<DraftEntityInstance> {
        let instance = self.get(key)?;
        let mut data = instance.data().clone();
        data.extend(to_merge);
        let next = instance.with_data(data);
        self.instances.insert(key.clone(), next.clone());
        Ok(next)
    }

    pub fn replace_data(
        &mut self,
        key: &EntityKey,
        data: EntityData,
    ) -> Result<DraftEntityInstance> {
        let next = self.get(key)?.with_data(data);
        self.instances.insert(key.clone(), next.clone());
        Ok(next)
    }

    pub fn last_created_key(&self) -> Option<&EntityKey> {
        self.last_created.as_ref()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EntityKey, &DraftEntityInstance)> {
        self.instances.iter()
    }
}
