use std::sync::Arc;

use crate::block::ContentBlock;
use crate::character::CharacterMetadata;
use crate::content::ContentState;
use crate::entity::EntityKey;
use crate::error::Result;
use crate::selection::SelectionState;

/// Rewrites every block touched by `selection` with `f` and records the
/// selection on the result.
pub fn modify_block_for_content(
    content: &ContentState,
    selection: &SelectionState,
    mut f: impl FnMut(&ContentBlock) -> ContentBlock,
) -> Result<ContentState> {
    let blocks = content
        .block_map()
        .range(selection.start_key(), selection.end_key())?;
    let mut block_map = content.block_map().clone();
    for block in blocks {
        block_map = block_map.replace(Arc::new(f(block.as_ref())))?;
    }
    Ok(content
        .with_block_map(block_map)
        .with_selection_before(selection.clone())
        .with_selection_after(selection.clone()))
}

/// Rewrites the characters covered by `selection`, block by block.
pub fn modify_characters_for_content(
    content: &ContentState,
    selection: &SelectionState,
    mut f: impl FnMut(&CharacterMetadata) -> CharacterMetadata,
) -> Result<ContentState> {
    let start_key = selection.start_key();
    let end_key = selection.end_key();
    let start_offset = selection.start_offset();
    let end_offset = selection.end_offset();

    modify_block_for_content(content, selection, |block| {
        let (start, end) = if start_key == end_key {
            (start_offset, end_offset)
        } else {
            (
                if block.key() == start_key { start_offset } else { 0 },
                if block.key() == end_key { end_offset } else { block.len() },
            )
        };
        let end = end.min(block.len());
        let mut characters = block.characters().clone();
        for ix in start..end {
            let next = f(&characters[ix]);
            characters.set(ix, next);
        }
        block.clone().with_characters(characters)
    })
}

pub fn add_inline_style(
    content: &ContentState,
    selection: &SelectionState,
    style: &str,
) -> Result<ContentState> {
    modify_characters_for_content(content, selection, |c| c.apply_style(style))
}

pub fn remove_inline_style(
    content: &ContentState,
    selection: &SelectionState,
    style: &str,
) -> Result<ContentState> {
    modify_characters_for_content(content, selection, |c| c.remove_style(style))
}

pub fn apply_entity_to_content(
    content: &ContentState,
    selection: &SelectionState,
    entity_key: Option<&EntityKey>,
) -> Result<ContentState> {
    modify_characters_for_content(content, selection, |c| c.apply_entity(entity_key.cloned()))
}

/// Shifts the depth of every selected block by `adjustment`, clamped to
/// `[0, max_depth]`.
pub fn adjust_block_depth_for_content(
    content: &ContentState,
    selection: &SelectionState,
    adjustment: isize,
    max_depth: usize,
) -> Result<ContentState> {
    modify_block_for_content(content, selection, |block| {
        let depth = block.depth().saturating_add_signed(adjustment).min(max_depth);
        block.clone().with_depth(depth)
    })
}
