use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, LazyLock};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::entity::EntityKey;

/// The set of inline style names (`BOLD`, `ITALIC`, ...) carried by a character.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InlineStyle(BTreeSet<String>);

impl InlineStyle {
    pub const EMPTY: InlineStyle = InlineStyle(BTreeSet::new());

    pub fn new() -> Self {
        Self::default()
    }

    pub fn of<I, S>(styles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(styles.into_iter().map(Into::into).collect())
    }

    pub fn has(&self, style: &str) -> bool {
        self.0.contains(style)
    }

    pub fn add(&self, style: impl Into<String>) -> Self {
        let mut next = self.0.clone();
        next.insert(style.into());
        Self(next)
    }

    pub fn remove(&self, style: &str) -> Self {
        let mut next = self.0.clone();
        next.remove(style);
        Self(next)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for InlineStyle {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self::of(iter)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CharacterConfig {
    style: InlineStyle,
    entity: Option<EntityKey>,
}

static POOL: LazyLock<Mutex<HashMap<CharacterConfig, CharacterMetadata>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

static EMPTY: LazyLock<CharacterMetadata> =
    LazyLock::new(|| CharacterMetadata::create(InlineStyle::default(), None));

/// Per-character style and entity tag.
///
/// Instances are hash-consed: [`CharacterMetadata::create`] returns the same
/// shared instance for the same `(style, entity)` pair, so equality is a
/// pointer comparison. The pool is never evicted.
#[derive(Clone)]
pub struct CharacterMetadata(Arc<CharacterConfig>);

impl CharacterMetadata {
    pub fn create(style: InlineStyle, entity: Option<EntityKey>) -> Self {
        let config = CharacterConfig { style, entity };
        let mut pool = POOL.lock();
        if let Some(existing) = pool.get(&config) {
            return existing.clone();
        }
        let created = Self(Arc::new(config.clone()));
        pool.insert(config, created.clone());
        created
    }

    /// The metadata of an unstyled character outside any entity.
    pub fn empty() -> Self {
        EMPTY.clone()
    }

    pub fn style(&self) -> &InlineStyle {
        &self.0.style
    }

    pub fn entity(&self) -> Option<&EntityKey> {
        self.0.entity.as_ref()
    }

    pub fn has_style(&self, style: &str) -> bool {
        self.0.style.has(style)
    }

    pub fn apply_style(&self, style: &str) -> Self {
        if self.has_style(style) {
            return self.clone();
        }
        Self::create(self.0.style.add(style), self.0.entity.clone())
    }

    pub fn remove_style(&self, style: &str) -> Self {
        if !self.has_style(style) {
            return self.clone();
        }
        Self::create(self.0.style.remove(style), self.0.entity.clone())
    }

    pub fn apply_entity(&self, entity: Option<EntityKey>) -> Self {
        if self.0.entity == entity {
            return self.clone();
        }
        Self::create(self.0.style.clone(), entity)
    }

    pub fn pool_size() -> usize {
        POOL.lock().len()
    }
}

impl PartialEq for CharacterMetadata {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for CharacterMetadata {}

impl Hash for CharacterMetadata {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Arc::as_ptr(&self.0), state);
    }
}

impl fmt::Debug for CharacterMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CharacterMetadata")
            .field("style", &self.0.style)
            .field("entity", &self.0.entity)
            .finish()
    }
}

impl Default for CharacterMetadata {
    fn default() -> Self {
        Self::empty()
    }
}
