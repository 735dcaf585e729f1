//! Pure document transforms.
//!
//! Every function takes a content and a selection and returns a new content
//! whose `selection_after` is where the cursor lands. Inputs are never
//! modified; on error the caller keeps the content it started from.

mod block_ops;
mod edges;
mod fragment;
mod insert;
mod removal_range;
mod remove;
mod split;

use crate::block::BlockData;
use crate::block_map::BlockMap;
use crate::change::RemovalDirection;
use crate::character::{CharacterMetadata, InlineStyle};
use crate::content::ContentState;
use crate::entity::EntityKey;
use crate::error::{DraftError, Result};
use crate::selection::SelectionState;

pub use block_ops::{modify_block_for_content, modify_characters_for_content};
pub use edges::remove_entities_at_edges;
pub use fragment::{BlockDataMergeBehavior, get_content_fragment, insert_fragment_into_content};
pub use insert::insert_text_into_content;
pub use removal_range::character_removal_range;
pub use remove::remove_range_from_content;
pub use split::split_block_in_content;

fn check_entity(content: &ContentState, entity_key: Option<&EntityKey>) -> Result<()> {
    match entity_key {
        Some(key) => content.entity(key).map(|_| ()),
        None => Ok(()),
    }
}

/// Replaces the text covered by `range` with `text`, styled with `style` and
/// attached to `entity_key`.
pub fn replace_text(
    content: &ContentState,
    range: &SelectionState,
    text: &str,
    style: Option<&InlineStyle>,
    entity_key: Option<&EntityKey>,
) -> Result<ContentState> {
    check_entity(content, entity_key)?;
    let without_entities = remove_entities_at_edges(content, range)?;
    let without_text = remove_range_from_content(&without_entities, range)?;
    let character =
        CharacterMetadata::create(style.cloned().unwrap_or_default(), entity_key.cloned());
    let target = without_text.selection_after().clone();
    insert_text_into_content(&without_text, &target, text, &character)
}

/// Like [`replace_text`] for a collapsed `range`.
pub fn insert_text(
    content: &ContentState,
    range: &SelectionState,
    text: &str,
    style: Option<&InlineStyle>,
    entity_key: Option<&EntityKey>,
) -> Result<ContentState> {
    if !range.is_collapsed() {
        return Err(DraftError::SelectionNotCollapsed("insert_text"));
    }
    replace_text(content, range, text, style, entity_key)
}

/// Cuts the fragment at `removal_range` and pastes it at `target_range`.
pub fn move_text(
    content: &ContentState,
    removal_range: &SelectionState,
    target_range: &SelectionState,
) -> Result<ContentState> {
    let moved = get_content_fragment(content, removal_range)?;
    let after_removal = remove_range(content, removal_range, RemovalDirection::Backward)?;
    replace_with_fragment(
        &after_removal,
        target_range,
        &moved,
        BlockDataMergeBehavior::default(),
    )
}

pub fn replace_with_fragment(
    content: &ContentState,
    range: &SelectionState,
    fragment: &BlockMap,
    merge_block_data: BlockDataMergeBehavior,
) -> Result<ContentState> {
    let without_entities = remove_entities_at_edges(content, range)?;
    let without_text = remove_range_from_content(&without_entities, range)?;
    let target = without_text.selection_after().clone();
    insert_fragment_into_content(&without_text, &target, fragment, merge_block_data)
}

/// Deletes `range`, honoring the mutability of an entity that covers both of
/// its ends inside one block. A collapsed range returns `content` itself.
pub fn remove_range(
    content: &ContentState,
    range: &SelectionState,
    direction: RemovalDirection,
) -> Result<ContentState> {
    if range.is_collapsed() {
        return Ok(content.clone());
    }
    let range = range.to_forward();
    let start_block = content.block(&range.anchor_key)?;
    let end_block = content.block(&range.focus_key)?;
    let start_entity = start_block.entity_at(range.start_offset());
    let end_entity = range
        .end_offset()
        .checked_sub(1)
        .and_then(|ix| end_block.entity_at(ix));

    if range.anchor_key == range.focus_key && start_entity.is_some() && start_entity == end_entity {
        let adjusted = character_removal_range(
            content.entity_map(),
            start_block,
            end_block,
            &range,
            direction,
        )?;
        return remove_range_from_content(content, &adjusted);
    }

    let without_entities = remove_entities_at_edges(content, &range)?;
    remove_range_from_content(&without_entities, &range)
}

pub fn split_block(content: &ContentState, selection: &SelectionState) -> Result<ContentState> {
    let without_entities = remove_entities_at_edges(content, selection)?;
    let without_text = remove_range_from_content(&without_entities, selection)?;
    let target = without_text.selection_after().clone();
    split_block_in_content(&without_text, &target)
}

pub fn apply_inline_style(
    content: &ContentState,
    selection: &SelectionState,
    style: &str,
) -> Result<ContentState> {
    block_ops::add_inline_style(content, selection, style)
}

pub fn remove_inline_style(
    content: &ContentState,
    selection: &SelectionState,
    style: &str,
) -> Result<ContentState> {
    block_ops::remove_inline_style(content, selection, style)
}

/// Changes the type of every selected block. List nesting does not carry
/// over to the new type, so depth resets to 0.
pub fn set_block_type(
    content: &ContentState,
    selection: &SelectionState,
    block_type: &str,
) -> Result<ContentState> {
    modify_block_for_content(content, selection, |block| {
        block.clone().with_type(block_type).with_depth(0)
    })
}

pub fn set_block_data(
    content: &ContentState,
    selection: &SelectionState,
    data: &BlockData,
) -> Result<ContentState> {
    modify_block_for_content(content, selection, |block| block.clone().with_data(data.clone()))
}

pub fn merge_block_data(
    content: &ContentState,
    selection: &SelectionState,
    data: &BlockData,
) -> Result<ContentState> {
    modify_block_for_content(content, selection, |block| {
        let mut merged = block.data().clone();
        merged.extend(data.clone());
        block.clone().with_data(merged)
    })
}

/// Attaches `entity_key` to the selected characters, or detaches whatever
/// entity they carry when it is `None`.
pub fn apply_entity(
    content: &ContentState,
    selection: &SelectionState,
    entity_key: Option<&EntityKey>,
) -> Result<ContentState> {
    check_entity(content, entity_key)?;
    let without_entities = remove_entities_at_edges(content, selection)?;
    block_ops::apply_entity_to_content(&without_entities, selection, entity_key)
}

pub fn adjust_block_depth(
    content: &ContentState,
    selection: &SelectionState,
    adjustment: isize,
    max_depth: usize,
) -> Result<ContentState> {
    block_ops::adjust_block_depth_for_content(content, selection, adjustment, max_depth)
}

pub fn get_fragment(content: &ContentState, selection: &SelectionState) -> Result<BlockMap> {
    get_content_fragment(content, selection)
}
