use std::fmt;
use std::sync::Arc;

use crate::block::{BlockKey, BlockVariant, ContentBlock, TreeLinks};
use crate::block_map::BlockMap;
use crate::config::ConvertOptions;
use crate::entity::{DraftEntityInstance, EntityData, EntityKey, EntityMap, EntityMutability};
use crate::error::{DraftError, Result};
use crate::key::generate_random_key;
use crate::selection::SelectionState;

const ZERO_WIDTH_SPACE: char = '\u{200B}';

#[derive(Clone)]
struct ContentInner {
    block_map: BlockMap,
    entity_map: EntityMap,
    selection_before: SelectionState,
    selection_after: SelectionState,
}

/// An immutable document snapshot.
///
/// Cloning shares the snapshot. Every `with_*` call produces a new snapshot
/// and leaves `self` untouched; [`ContentState::ptr_eq`] tells whether two
/// handles point at the very same snapshot.
#[derive(Clone)]
pub struct ContentState(Arc<ContentInner>);

impl ContentState {
    pub fn new(
        block_map: BlockMap,
        entity_map: EntityMap,
        selection_before: SelectionState,
        selection_after: SelectionState,
    ) -> Self {
        let block_map = non_empty(block_map);
        Self(Arc::new(ContentInner {
            block_map,
            entity_map,
            selection_before,
            selection_after,
        }))
    }

    /// A document made of `blocks` with both selections collapsed at the start
    /// of the first block. An empty list yields a single empty block.
    pub fn create_from_block_array(blocks: Vec<ContentBlock>, entity_map: EntityMap) -> Self {
        let block_map = non_empty(blocks.into_iter().collect());
        let selection = block_map
            .first()
            .map(|block| SelectionState::create_empty(block.key().clone()))
            .unwrap_or_default();
        Self::new(block_map, entity_map, selection.clone(), selection)
    }

    /// One `unstyled` block per line. Lines split on `\r\n`, `\r` or `\n`.
    pub fn create_from_text(text: &str) -> Self {
        Self::create_from_text_with(text, ConvertOptions::default())
    }

    pub fn create_from_text_with(text: &str, options: ConvertOptions) -> Self {
        let mut blocks: Vec<ContentBlock> = split_lines(text)
            .map(|line| ContentBlock::new(generate_random_key(), line))
            .collect();
        if options.tree_data_support {
            blocks = link_as_roots(blocks);
        }
        Self::create_from_block_array(blocks, EntityMap::new())
    }

    pub fn block_map(&self) -> &BlockMap {
        &self.0.block_map
    }

    pub fn entity_map(&self) -> &EntityMap {
        &self.0.entity_map
    }

    pub fn selection_before(&self) -> &SelectionState {
        &self.0.selection_before
    }

    pub fn selection_after(&self) -> &SelectionState {
        &self.0.selection_after
    }

    pub fn block_for_key(&self, key: &str) -> Option<&Arc<ContentBlock>> {
        self.0.block_map.get(key)
    }

    pub fn block(&self, key: &str) -> Result<&Arc<ContentBlock>> {
        self.block_for_key(key)
            .ok_or_else(|| DraftError::UnknownBlock(key.to_string()))
    }

    pub fn key_before(&self, key: &str) -> Option<&BlockKey> {
        self.0.block_map.key_before(key)
    }

    pub fn key_after(&self, key: &str) -> Option<&BlockKey> {
        self.0.block_map.key_after(key)
    }

    pub fn block_before(&self, key: &str) -> Option<&Arc<ContentBlock>> {
        self.key_before(key).and_then(|k| self.block_for_key(k))
    }

    pub fn block_after(&self, key: &str) -> Option<&Arc<ContentBlock>> {
        self.key_after(key).and_then(|k| self.block_for_key(k))
    }

    pub fn first_block(&self) -> &Arc<ContentBlock> {
        self.0
            .block_map
            .first()
            .expect("content state always holds at least one block")
    }

    pub fn last_block(&self) -> &Arc<ContentBlock> {
        self.0
            .block_map
            .last()
            .expect("content state always holds at least one block")
    }

    pub fn blocks_as_array(&self) -> Vec<Arc<ContentBlock>> {
        self.0.block_map.iter().cloned().collect()
    }

    pub fn is_tree(&self) -> bool {
        self.first_block().is_tree()
    }

    pub fn plain_text(&self, delimiter: Option<&str>) -> String {
        let delimiter = delimiter.unwrap_or("\n");
        self.0
            .block_map
            .iter()
            .map(|block| block.text())
            .collect::<Vec<_>>()
            .join(delimiter)
    }

    /// True unless the document is a single block holding nothing but
    /// zero-width spaces.
    pub fn has_text(&self) -> bool {
        self.0.block_map.len() > 1
            || self
                .first_block()
                .text()
                .chars()
                .any(|c| c != ZERO_WIDTH_SPACE)
    }

    pub fn entity(&self, key: &EntityKey) -> Result<&DraftEntityInstance> {
        self.0.entity_map.get(key)
    }

    /// Returns a document whose entity map holds one more entity. The new key
    /// is available through [`ContentState::last_created_entity_key`].
    pub fn create_entity(
        &self,
        entity_type: impl Into<String>,
        mutability: EntityMutability,
        data: EntityData,
    ) -> Self {
        let mut entity_map = self.0.entity_map.clone();
        entity_map.create(entity_type, mutability, data);
        self.with_entity_map(entity_map)
    }

    pub fn add_entity(&self, instance: DraftEntityInstance) -> Self {
        let mut entity_map = self.0.entity_map.clone();
        entity_map.add(instance);
        self.with_entity_map(entity_map)
    }

    pub fn merge_entity_data(&self, key: &EntityKey, to_merge: EntityData) -> Result<Self> {
        let mut entity_map = self.0.entity_map.clone();
        entity_map.merge_data(key, to_merge)?;
        Ok(self.with_entity_map(entity_map))
    }

    pub fn replace_entity_data(&self, key: &EntityKey, data: EntityData) -> Result<Self> {
        let mut entity_map = self.0.entity_map.clone();
        entity_map.replace_data(key, data)?;
        Ok(self.with_entity_map(entity_map))
    }

    pub fn last_created_entity_key(&self) -> Option<&EntityKey> {
        self.0.entity_map.last_created_key()
    }

    pub fn with_block_map(&self, block_map: BlockMap) -> Self {
        self.update(|inner| inner.block_map = non_empty(block_map))
    }

    pub fn with_entity_map(&self, entity_map: EntityMap) -> Self {
        self.update(|inner| inner.entity_map = entity_map)
    }

    pub fn with_selection_before(&self, selection: SelectionState) -> Self {
        self.update(|inner| inner.selection_before = selection)
    }

    pub fn with_selection_after(&self, selection: SelectionState) -> Self {
        self.update(|inner| inner.selection_after = selection)
    }

    pub fn ptr_eq(&self, other: &ContentState) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    fn update(&self, f: impl FnOnce(&mut ContentInner)) -> Self {
        let mut inner = (*self.0).clone();
        f(&mut inner);
        Self(Arc::new(inner))
    }
}

impl Default for ContentState {
    fn default() -> Self {
        Self::create_from_text("")
    }
}

impl fmt::Debug for ContentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentState")
            .field("blocks", &self.0.block_map)
            .field("entities", &self.0.entity_map.len())
            .field("selection_before", &self.0.selection_before)
            .field("selection_after", &self.0.selection_after)
            .finish()
    }
}

fn non_empty(block_map: BlockMap) -> BlockMap {
    if block_map.is_empty() {
        return std::iter::once(ContentBlock::new(generate_random_key(), "")).collect();
    }
    block_map
}

fn split_lines(text: &str) -> impl Iterator<Item = String> + '_ {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                lines.push(std::mem::take(&mut current));
            }
            '\n' => lines.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    lines.push(current);
    lines.into_iter()
}

/// Turns flat blocks into sibling roots of a tree document.
fn link_as_roots(blocks: Vec<ContentBlock>) -> Vec<ContentBlock> {
    let keys: Vec<BlockKey> = blocks.iter().map(|b| b.key().clone()).collect();
    blocks
        .into_iter()
        .enumerate()
        .map(|(ix, block)| {
            let links = TreeLinks {
                children: Vec::new(),
                parent: None,
                prev_sibling: ix.checked_sub(1).map(|prev| keys[prev].clone()),
                next_sibling: keys.get(ix + 1).cloned(),
            };
            block.with_variant(BlockVariant::Tree(links))
        })
        .collect()
}
