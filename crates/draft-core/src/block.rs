use std::collections::BTreeMap;

use serde_json::Value;

use crate::character::{CharacterMetadata, InlineStyle};
use crate::entity::EntityKey;
use crate::ranges::find_ranges;

pub type BlockKey = String;
pub type BlockData = BTreeMap<String, Value>;
pub type CharacterList = imbl::Vector<CharacterMetadata>;

pub const UNSTYLED: &str = "unstyled";
pub const ORDERED_LIST_ITEM: &str = "ordered-list-item";
pub const UNORDERED_LIST_ITEM: &str = "unordered-list-item";
pub const CODE_BLOCK: &str = "code-block";
pub const ATOMIC: &str = "atomic";

static EMPTY_STYLE: InlineStyle = InlineStyle::EMPTY;

pub fn is_list_type(block_type: &str) -> bool {
    block_type == ORDERED_LIST_ITEM || block_type == UNORDERED_LIST_ITEM
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeLinks {
    pub children: Vec<BlockKey>,
    pub parent: Option<BlockKey>,
    pub prev_sibling: Option<BlockKey>,
    pub next_sibling: Option<BlockKey>,
}

/// Which representation a block uses. A document never mixes the two.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BlockVariant {
    #[default]
    Flat,
    Tree(TreeLinks),
}

/// One paragraph-level unit of a document.
///
/// `characters` always holds exactly one entry per code point of `text`.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentBlock {
    key: BlockKey,
    block_type: String,
    text: String,
    characters: CharacterList,
    depth: usize,
    data: BlockData,
    variant: BlockVariant,
}

impl ContentBlock {
    /// An `unstyled` flat block whose characters carry no style or entity.
    pub fn new(key: impl Into<BlockKey>, text: impl Into<String>) -> Self {
        let text = text.into();
        let characters = empty_characters(text.chars().count());
        Self {
            key: key.into(),
            block_type: UNSTYLED.to_string(),
            text,
            characters,
            depth: 0,
            data: BlockData::new(),
            variant: BlockVariant::Flat,
        }
    }

    pub fn with_key(mut self, key: impl Into<BlockKey>) -> Self {
        self.key = key.into();
        self
    }

    pub fn with_type(mut self, block_type: impl Into<String>) -> Self {
        self.block_type = block_type.into();
        self
    }

    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_data(mut self, data: BlockData) -> Self {
        self.data = data;
        self
    }

    pub fn with_variant(mut self, variant: BlockVariant) -> Self {
        self.variant = variant;
        self
    }

    pub fn with_tree_links(self, links: TreeLinks) -> Self {
        self.with_variant(BlockVariant::Tree(links))
    }

    /// Replaces the text and its metadata together.
    ///
    /// Panics if the two disagree on length, since that would break the core
    /// invariant every other operation relies on.
    pub fn with_text_and_characters(
        mut self,
        text: impl Into<String>,
        characters: CharacterList,
    ) -> Self {
        let text = text.into();
        assert_eq!(
            text.chars().count(),
            characters.len(),
            "character list must have one entry per character of block {}",
            self.key
        );
        self.text = text;
        self.characters = characters;
        self
    }

    pub fn with_characters(self, characters: CharacterList) -> Self {
        let text = self.text.clone();
        self.with_text_and_characters(text, characters)
    }

    pub fn key(&self) -> &BlockKey {
        &self.key
    }

    pub fn block_type(&self) -> &str {
        &self.block_type
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn data(&self) -> &BlockData {
        &self.data
    }

    pub fn characters(&self) -> &CharacterList {
        &self.characters
    }

    pub fn variant(&self) -> &BlockVariant {
        &self.variant
    }

    pub fn inline_style_at(&self, offset: usize) -> &InlineStyle {
        self.characters
            .get(offset)
            .map(CharacterMetadata::style)
            .unwrap_or(&EMPTY_STYLE)
    }

    pub fn entity_at(&self, offset: usize) -> Option<&EntityKey> {
        self.characters.get(offset).and_then(CharacterMetadata::entity)
    }

    /// Calls `on_range` for every maximal run of equally styled characters
    /// accepted by `filter`.
    pub fn find_style_ranges(
        &self,
        filter: impl FnMut(&&CharacterMetadata) -> bool,
        on_range: impl FnMut(usize, usize),
    ) {
        find_ranges(self.characters.iter(), |a, b| have_equal_style(a, b), filter, on_range);
    }

    /// Calls `on_range` for every maximal run of characters sharing an entity
    /// (or sharing the absence of one) accepted by `filter`.
    pub fn find_entity_ranges(
        &self,
        filter: impl FnMut(&&CharacterMetadata) -> bool,
        on_range: impl FnMut(usize, usize),
    ) {
        find_ranges(self.characters.iter(), |a, b| a.entity() == b.entity(), filter, on_range);
    }

    pub fn is_tree(&self) -> bool {
        matches!(self.variant, BlockVariant::Tree(_))
    }

    pub fn tree_links(&self) -> Option<&TreeLinks> {
        match &self.variant {
            BlockVariant::Tree(links) => Some(links),
            BlockVariant::Flat => None,
        }
    }

    pub fn child_keys(&self) -> Option<&[BlockKey]> {
        self.tree_links().map(|links| links.children.as_slice())
    }

    pub fn has_children(&self) -> bool {
        self.child_keys().is_some_and(|children| !children.is_empty())
    }

    pub fn parent_key(&self) -> Option<&BlockKey> {
        self.tree_links().and_then(|links| links.parent.as_ref())
    }

    pub fn prev_sibling_key(&self) -> Option<&BlockKey> {
        self.tree_links().and_then(|links| links.prev_sibling.as_ref())
    }

    pub fn next_sibling_key(&self) -> Option<&BlockKey> {
        self.tree_links().and_then(|links| links.next_sibling.as_ref())
    }
}

fn have_equal_style(a: &CharacterMetadata, b: &CharacterMetadata) -> bool {
    a == b || a.style() == b.style()
}

pub(crate) fn empty_characters(len: usize) -> CharacterList {
    std::iter::repeat_n(CharacterMetadata::empty(), len).collect()
}

/// Byte index of the `char_offset`-th character, clamped to the end of `text`.
pub(crate) fn byte_offset(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map(|(ix, _)| ix)
        .unwrap_or(text.len())
}

pub(crate) fn slice_chars(text: &str, start: usize, end: usize) -> &str {
    let start_ix = byte_offset(text, start);
    let end_ix = byte_offset(text, end.max(start));
    &text[start_ix..end_ix]
}

pub(crate) fn slice_list(list: &CharacterList, start: usize, end: usize) -> CharacterList {
    let start = start.min(list.len());
    let end = end.clamp(start, list.len());
    list.skip(start).take(end - start)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_offsets_respect_multibyte_text() {
        let text = "a😀b";
        assert_eq!(byte_offset(text, 1), 1);
        assert_eq!(byte_offset(text, 2), 5);
        assert_eq!(byte_offset(text, 9), text.len());
        assert_eq!(slice_chars(text, 1, 2), "😀");
    }

    #[test]
    fn new_block_has_one_metadata_per_code_point() {
        let block = ContentBlock::new("k", "héllo😀");
        assert_eq!(block.len(), 6);
        assert_eq!(block.block_type(), UNSTYLED);
        assert!(block.inline_style_at(0).is_empty());
        assert!(block.inline_style_at(42).is_empty());
    }
}
