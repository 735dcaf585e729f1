use std::sync::Arc;

use crate::block::{CharacterList, ContentBlock};
use crate::content::ContentState;
use crate::entity::{EntityKey, EntityMap, EntityMutability};
use crate::error::{DraftError, Result};
use crate::selection::SelectionState;

/// Detaches non-mutable entities that straddle either edge of `selection`, so
/// an edit at that edge never leaves a partial immutable entity behind.
///
/// The returned content has `selection_after` set to `selection`.
pub fn remove_entities_at_edges(
    content: &ContentState,
    selection: &SelectionState,
) -> Result<ContentState> {
    let entity_map = content.entity_map();
    let mut block_map = content.block_map().clone();
    let mut changed = false;

    let start_key = selection.start_key();
    let start_block = content.block(start_key)?;
    let updated_start = remove_for_block(entity_map, start_block, selection.start_offset())?;
    if let Some(block) = &updated_start {
        block_map = block_map.replace(block.clone())?;
        changed = true;
    }

    let end_key = selection.end_key();
    let end_block = match &updated_start {
        Some(block) if end_key == start_key => block,
        _ => content.block(end_key)?,
    };
    if let Some(block) = remove_for_block(entity_map, end_block, selection.end_offset())? {
        block_map = block_map.replace(block)?;
        changed = true;
    }

    let content = if changed {
        content.with_block_map(block_map)
    } else {
        content.clone()
    };
    Ok(content.with_selection_after(selection.clone()))
}

/// Strips the entity under `offset` when the cursor sits strictly inside a
/// non-mutable entity. `None` means the block is unchanged.
fn remove_for_block(
    entity_map: &EntityMap,
    block: &Arc<ContentBlock>,
    offset: usize,
) -> Result<Option<Arc<ContentBlock>>> {
    let before = offset.checked_sub(1).and_then(|ix| block.entity_at(ix));
    let after = block.entity_at(offset);
    let Some(entity_key) = after.filter(|key| Some(*key) == before) else {
        return Ok(None);
    };
    if entity_map.get(entity_key)?.mutability() == EntityMutability::Mutable {
        return Ok(None);
    }

    let (start, end) = removal_range(block.characters(), entity_key, offset)?;
    let mut characters = block.characters().clone();
    for ix in start..end {
        let stripped = characters[ix].apply_entity(None);
        characters.set(ix, stripped);
    }
    Ok(Some(Arc::new((**block).clone().with_characters(characters))))
}

/// The run of `entity_key` that contains `offset`.
pub(crate) fn removal_range(
    characters: &CharacterList,
    entity_key: &EntityKey,
    offset: usize,
) -> Result<(usize, usize)> {
    let mut found = None;
    crate::ranges::find_ranges(
        characters.iter(),
        |a, b| a.entity() == b.entity(),
        |c| c.entity() == Some(entity_key),
        |start, end| {
            if start <= offset && end >= offset {
                found = Some((start, end));
            }
        },
    );
    found.ok_or_else(|| DraftError::MissingEntityRange(entity_key.clone()))
}
