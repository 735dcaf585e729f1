use std::fmt;
use std::sync::Arc;

use crate::block::{BlockKey, ContentBlock};
use crate::error::{DraftError, Result};

/// Persistent, ordered map from block key to block.
///
/// Blocks are stored in document order next to a key index. Replacing a block
/// in place touches one path of the vector and shares every other block, so
/// the common single-block edit never copies the document. Structural edits
/// (insertions, removals) rebuild the index.
#[derive(Clone, Default)]
pub struct BlockMap {
    blocks: imbl::Vector<Arc<ContentBlock>>,
    index: imbl::HashMap<BlockKey, usize>,
}

impl BlockMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a map from blocks in document order. Keys must be unique; a
    /// later duplicate shadows the earlier one in the index.
    pub fn from_blocks<I>(blocks: I) -> Self
    where
        I: IntoIterator<Item = Arc<ContentBlock>>,
    {
        let blocks: imbl::Vector<_> = blocks.into_iter().collect();
        let index = build_index(&blocks);
        Self { blocks, index }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Arc<ContentBlock>> {
        let ix = *self.index.get(key)?;
        self.blocks.get(ix)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn position(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub fn get_index(&self, ix: usize) -> Option<&Arc<ContentBlock>> {
        self.blocks.get(ix)
    }

    pub fn first(&self) -> Option<&Arc<ContentBlock>> {
        self.blocks.front()
    }

    pub fn last(&self) -> Option<&Arc<ContentBlock>> {
        self.blocks.back()
    }

    pub fn key_before(&self, key: &str) -> Option<&BlockKey> {
        let ix = self.position(key)?;
        let prev = ix.checked_sub(1)?;
        self.blocks.get(prev).map(|block| block.key())
    }

    pub fn key_after(&self, key: &str) -> Option<&BlockKey> {
        let ix = self.position(key)?;
        self.blocks.get(ix + 1).map(|block| block.key())
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Arc<ContentBlock>> + '_ {
        self.blocks.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &BlockKey> + '_ {
        self.blocks.iter().map(|block| block.key())
    }

    /// Blocks from `start_key` through `end_key`, inclusive, in document order.
    pub fn range(&self, start_key: &str, end_key: &str) -> Result<Vec<Arc<ContentBlock>>> {
        let start = self.require_position(start_key)?;
        let end = self.require_position(end_key)?;
        if end < start {
            return Ok(Vec::new());
        }
        Ok(self
            .blocks
            .skip(start)
            .take(end - start + 1)
            .into_iter()
            .collect())
    }

    pub fn replace(&self, block: Arc<ContentBlock>) -> Result<Self> {
        let ix = self.require_position(block.key())?;
        let mut next = self.clone();
        next.blocks.set(ix, block);
        Ok(next)
    }

    /// Replaces the blocks at positions `[start, end)` with `blocks`.
    pub fn splice<I>(&self, start: usize, end: usize, blocks: I) -> Self
    where
        I: IntoIterator<Item = Arc<ContentBlock>>,
    {
        let start = start.min(self.blocks.len());
        let end = end.clamp(start, self.blocks.len());
        let mut head = self.blocks.take(start);
        let tail = self.blocks.skip(end);
        head.extend(blocks);
        head.append(tail);
        let index = build_index(&head);
        Self {
            blocks: head,
            index,
        }
    }

    pub fn insert_after<I>(&self, key: &str, blocks: I) -> Result<Self>
    where
        I: IntoIterator<Item = Arc<ContentBlock>>,
    {
        let ix = self.require_position(key)? + 1;
        Ok(self.splice(ix, ix, blocks))
    }

    pub fn retain(&self, mut keep: impl FnMut(&ContentBlock) -> bool) -> Self {
        Self::from_blocks(self.blocks.iter().filter(|block| keep(block)).cloned())
    }

    /// Applies `f` to every block, keeping the original `Arc` wherever `f`
    /// returns `None`.
    pub fn map_blocks(
        &self,
        mut f: impl FnMut(&Arc<ContentBlock>) -> Option<ContentBlock>,
    ) -> Self {
        let mut next = self.clone();
        for (ix, block) in self.blocks.iter().enumerate() {
            if let Some(updated) = f(block) {
                next.blocks.set(ix, Arc::new(updated));
            }
        }
        next.index = build_index(&next.blocks);
        next
    }

    /// Whether `self` and `other` store the very same block under `key`.
    pub fn shares_block(&self, other: &BlockMap, key: &str) -> bool {
        match (self.get(key), other.get(key)) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    fn require_position(&self, key: &str) -> Result<usize> {
        self.position(key)
            .ok_or_else(|| DraftError::UnknownBlock(key.to_string()))
    }
}

fn build_index(blocks: &imbl::Vector<Arc<ContentBlock>>) -> imbl::HashMap<BlockKey, usize> {
    blocks
        .iter()
        .enumerate()
        .map(|(ix, block)| (block.key().clone(), ix))
        .collect()
}

impl FromIterator<ContentBlock> for BlockMap {
    fn from_iter<T: IntoIterator<Item = ContentBlock>>(iter: T) -> Self {
        Self::from_blocks(iter.into_iter().map(Arc::new))
    }
}

impl fmt::Debug for BlockMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.blocks.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BlockMap {
        ["a", "b", "c"]
            .into_iter()
            .map(|key| ContentBlock::new(key, key.to_uppercase()))
            .collect()
    }

    #[test]
    fn replace_shares_untouched_blocks() {
        let map = sample();
        let updated = map
            .replace(Arc::new(ContentBlock::new("b", "changed")))
            .expect("replace");
        assert!(map.shares_block(&updated, "a"));
        assert!(!map.shares_block(&updated, "b"));
        assert!(map.shares_block(&updated, "c"));
        assert_eq!(updated.get("b").map(|b| b.text()), Some("changed"));
    }

    #[test]
    fn splice_reindexes() {
        let map = sample();
        let updated = map.splice(
            1,
            2,
            [
                Arc::new(ContentBlock::new("x", "")),
                Arc::new(ContentBlock::new("y", "")),
            ],
        );
        let keys: Vec<_> = updated.keys().cloned().collect();
        assert_eq!(keys, ["a", "x", "y", "c"]);
        assert_eq!(updated.position("c"), Some(3));
        assert!(!updated.contains_key("b"));
        assert_eq!(updated.key_before("x").map(String::as_str), Some("a"));
        assert_eq!(updated.key_after("c"), None);
    }

    #[test]
    fn unknown_keys_fail() {
        let map = sample();
        assert!(matches!(
            map.replace(Arc::new(ContentBlock::new("zz", ""))),
            Err(DraftError::UnknownBlock(_))
        ));
    }
}
