use std::sync::Arc;

use crate::block::{CharacterList, byte_offset, slice_list};
use crate::character::CharacterMetadata;
use crate::content::ContentState;
use crate::error::{DraftError, Result};
use crate::selection::SelectionState;

/// Inserts `text` at the collapsed `selection`, every new character carrying
/// `character`.
pub fn insert_text_into_content(
    content: &ContentState,
    selection: &SelectionState,
    text: &str,
    character: &CharacterMetadata,
) -> Result<ContentState> {
    if !selection.is_collapsed() {
        return Err(DraftError::SelectionNotCollapsed("insert_text"));
    }
    let len = text.chars().count();
    if len == 0 {
        return Ok(content.clone());
    }

    let key = selection.start_key();
    let offset = selection.start_offset();
    let block = content.block(key)?;
    if block.has_children() {
        return Err(DraftError::ContainerBlock(key.clone()));
    }

    let inserted: CharacterList = std::iter::repeat_n(character.clone(), len).collect();
    let characters = insert_into_list(block.characters(), inserted, offset);
    let mut next_text = block.text().to_string();
    next_text.insert_str(byte_offset(block.text(), offset), text);

    let updated = (**block).clone().with_text_and_characters(next_text, characters);
    let new_offset = offset + len;
    Ok(content
        .with_block_map(content.block_map().replace(Arc::new(updated))?)
        .with_selection_after(SelectionState {
            anchor_offset: new_offset,
            focus_offset: new_offset,
            ..selection.clone()
        }))
}

pub(crate) fn insert_into_list(
    list: &CharacterList,
    inserted: CharacterList,
    offset: usize,
) -> CharacterList {
    let mut head = slice_list(list, 0, offset);
    head.append(inserted);
    head.append(slice_list(list, offset, list.len()));
    head
}
