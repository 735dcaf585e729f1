use std::sync::Arc;

use crate::block::{BlockData, slice_chars, slice_list};
use crate::content::ContentState;
use crate::error::{DraftError, Result};
use crate::key::generate_random_key;
use crate::selection::SelectionState;
use crate::tree::relink;

/// Splits the block under the collapsed `selection` in two. The lower half
/// gets a fresh key, keeps the type and depth, and starts with empty data.
pub fn split_block_in_content(
    content: &ContentState,
    selection: &SelectionState,
) -> Result<ContentState> {
    if !selection.is_collapsed() {
        return Err(DraftError::SelectionNotCollapsed("split_block"));
    }

    let key = selection.anchor_key.clone();
    let offset = selection.anchor_offset;
    let block = content.block(&key)?;
    if block.has_children() {
        return Err(DraftError::ContainerBlock(key));
    }

    let len = block.len();
    let above = (**block).clone().with_text_and_characters(
        slice_chars(block.text(), 0, offset),
        slice_list(block.characters(), 0, offset),
    );
    let key_below = generate_random_key();
    let below = above
        .clone()
        .with_key(key_below.clone())
        .with_text_and_characters(
            slice_chars(block.text(), offset, len),
            slice_list(block.characters(), offset, len),
        )
        .with_data(BlockData::new());

    let block_map = content.block_map();
    let ix = block_map.position(&key).unwrap_or_default();
    let mut updated = block_map.splice(ix, ix + 1, [Arc::new(above), Arc::new(below)]);
    if content.is_tree() {
        updated = relink(block_map, &updated);
    }

    Ok(content
        .with_block_map(updated)
        .with_selection_before(selection.clone())
        .with_selection_after(selection.collapse_to(key_below, 0)))
}
