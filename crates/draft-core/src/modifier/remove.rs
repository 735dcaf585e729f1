use std::sync::Arc;

use crate::block::{slice_chars, slice_list};
use crate::content::ContentState;
use crate::error::Result;
use crate::selection::SelectionState;
use crate::tree::relink;

/// Deletes the characters covered by `selection`, merging the head of its
/// start block with the tail of its end block and dropping every block in
/// between. A collapsed selection returns `content` unchanged.
pub fn remove_range_from_content(
    content: &ContentState,
    selection: &SelectionState,
) -> Result<ContentState> {
    if selection.is_collapsed() {
        return Ok(content.clone());
    }

    let block_map = content.block_map();
    let start_key = selection.start_key();
    let start_offset = selection.start_offset();
    let end_key = selection.end_key();
    let end_offset = selection.end_offset();

    let start_block = content.block(start_key)?;
    let end_block = content.block(end_key)?;
    let start_ix = block_map.position(start_key).unwrap_or_default();
    let end_ix = block_map.position(end_key).unwrap_or_default().max(start_ix);

    let mut characters = slice_list(start_block.characters(), 0, start_offset);
    characters.append(slice_list(end_block.characters(), end_offset, end_block.len()));
    let mut text = slice_chars(start_block.text(), 0, start_offset).to_string();
    text.push_str(slice_chars(end_block.text(), end_offset, end_block.len()));

    let merged = (**start_block).clone().with_text_and_characters(text, characters);
    let updated = if start_ix == end_ix {
        block_map.replace(Arc::new(merged))?
    } else {
        relink(block_map, &block_map.splice(start_ix, end_ix + 1, [Arc::new(merged)]))
    };

    Ok(content
        .with_block_map(updated)
        .with_selection_before(selection.clone())
        .with_selection_after(selection.collapse_to(start_key.clone(), start_offset)))
}
