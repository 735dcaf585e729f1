//! Editing behaviour of a typical rich-text host built on the modifier and
//! the editor state: toggles, key commands and atomic block handling.
//!
//! Functions returning `Option` yield `None` when the host should fall back
//! to its default handling.

use serde_json::Value;

use crate::block::{ATOMIC, CODE_BLOCK, UNSTYLED, is_list_type};
use crate::change::{ChangeType, RemovalDirection};
use crate::content::ContentState;
use crate::editor_state::EditorState;
use crate::entity::{EntityData, EntityKey};
use crate::error::Result;
use crate::modifier;
use crate::selection::SelectionState;
use crate::tree;

pub const LINK: &str = "LINK";
pub const BOLD: &str = "BOLD";
pub const ITALIC: &str = "ITALIC";
pub const UNDERLINE: &str = "UNDERLINE";
pub const CODE: &str = "CODE";

pub fn current_block_type(state: &EditorState) -> &str {
    state
        .current_content()
        .block_for_key(state.selection().start_key())
        .map_or(UNSTYLED, |block| block.block_type())
}

/// Whether any selected character of the anchor block belongs to a `LINK`
/// entity.
pub fn current_block_contains_link(state: &EditorState) -> bool {
    let selection = state.selection();
    let content = state.current_content();
    let Some(block) = content.block_for_key(&selection.anchor_key) else {
        return false;
    };
    let end = selection.end_offset().min(block.len());
    (selection.start_offset()..end).any(|ix| {
        block
            .entity_at(ix)
            .and_then(|key| content.entity(key).ok())
            .is_some_and(|entity| entity.entity_type() == LINK)
    })
}

pub fn link_data_for_url(url: &str) -> EntityData {
    EntityData::from([("url".to_string(), Value::String(url.to_string()))])
}

/// Handles the named key command, or returns `None` for commands this module
/// does not know or that need no change.
pub fn handle_key_command(state: &EditorState, command: &str) -> Result<Option<EditorState>> {
    match command {
        "bold" => toggle_inline_style(state, BOLD).map(Some),
        "italic" => toggle_inline_style(state, ITALIC).map(Some),
        "underline" => toggle_inline_style(state, UNDERLINE).map(Some),
        "code" => toggle_code(state).map(Some),
        "backspace" | "backspace-word" | "backspace-to-start-of-line" => on_backspace(state),
        "delete" | "delete-word" | "delete-to-end-of-block" => on_delete(state),
        _ => Ok(None),
    }
}

/// Inserts a line break inside the current block.
pub fn insert_soft_newline(state: &EditorState) -> Result<EditorState> {
    let style = state.current_inline_style();
    let content = modifier::insert_text(
        state.current_content(),
        state.selection(),
        "\n",
        Some(&style),
        None,
    )?;
    let selection = content.selection_after().clone();
    Ok(state
        .push(content, ChangeType::InsertCharacters, false)
        .force_selection(selection))
}

/// Backspace at the start of a block: removes a preceding atomic block, or
/// else resets the block's own style.
pub fn on_backspace(state: &EditorState) -> Result<Option<EditorState>> {
    let selection = state.selection();
    if !selection.is_collapsed() || selection.anchor_offset != 0 || selection.focus_offset != 0 {
        return Ok(None);
    }

    let content = state.current_content();
    let start_key = selection.start_key();
    if let Some(before) = content.block_before(start_key).filter(|b| b.block_type() == ATOMIC) {
        let atomic_key = before.key().clone();
        let block_map = content.block_map().retain(|block| *block.key() != atomic_key);
        let block_map = tree::relink(content.block_map(), &block_map);
        let without_atomic = content
            .with_block_map(block_map)
            .with_selection_after(selection.clone());
        return Ok(Some(state.push(without_atomic, ChangeType::RemoveRange, false)));
    }

    Ok(try_to_remove_block_style(state)?
        .map(|content| state.push(content, ChangeType::ChangeBlockType, false)))
}

/// Delete at the end of a block followed by an atomic block removes it.
pub fn on_delete(state: &EditorState) -> Result<Option<EditorState>> {
    let selection = state.selection();
    if !selection.is_collapsed() {
        return Ok(None);
    }

    let content = state.current_content();
    let start_key = selection.start_key();
    let block = content.block(start_key)?;
    if selection.start_offset() < block.len() {
        return Ok(None);
    }
    let Some(after) = content.block_after(start_key).filter(|b| b.block_type() == ATOMIC) else {
        return Ok(None);
    };

    let target = selection.clone().with_focus(after.key().clone(), after.len());
    let without_atomic = modifier::remove_range(content, &target, RemovalDirection::Forward)?;
    if without_atomic.ptr_eq(content) {
        return Ok(None);
    }
    Ok(Some(state.push(without_atomic, ChangeType::RemoveRange, false)))
}

/// Indents (or with `shift`, outdents) a list item, up to `max_depth`.
/// Anything other than a single list block is left unchanged.
pub fn on_tab(state: &EditorState, shift: bool, max_depth: usize) -> Result<EditorState> {
    let selection = state.selection();
    if selection.anchor_key != selection.focus_key {
        return Ok(state.clone());
    }
    let content = state.current_content();
    let block = content.block(&selection.anchor_key)?;
    if !is_list_type(block.block_type()) {
        return Ok(state.clone());
    }
    if !shift && block.depth() == max_depth {
        return Ok(state.clone());
    }

    let adjustment = if shift { -1 } else { 1 };
    let adjusted = modifier::adjust_block_depth(content, selection, adjustment, max_depth)?;
    Ok(state.push(adjusted, ChangeType::AdjustDepth, false))
}

/// Sets `block_type` on the selected blocks, or resets them to `unstyled`
/// when the first one already has it. Selections touching an atomic block
/// are ignored.
pub fn toggle_block_type(state: &EditorState, block_type: &str) -> Result<EditorState> {
    let selection = state.selection();
    let content = state.current_content();
    let start_key = selection.start_key();
    let mut end_key = selection.end_key().clone();
    let mut target = selection.clone();

    // A triple click selects up to offset 0 of the following block, which
    // must keep its type.
    if *start_key != end_key && selection.end_offset() == 0 {
        if let Some(before) = content.key_before(&end_key) {
            end_key = before.clone();
            let end_len = content.block(&end_key)?.len();
            target = SelectionState::range(
                start_key.clone(),
                selection.start_offset(),
                end_key.clone(),
                end_len,
            );
        }
    }

    let has_atomic = content
        .block_map()
        .range(start_key, &end_key)?
        .iter()
        .any(|block| block.block_type() == ATOMIC);
    if has_atomic {
        return Ok(state.clone());
    }

    let type_to_set = if content.block(start_key)?.block_type() == block_type {
        UNSTYLED
    } else {
        block_type
    };
    let next = modifier::set_block_type(content, &target, type_to_set)?;
    Ok(state.push(next, ChangeType::ChangeBlockType, false))
}

/// `CODE` style inside one block, a code block otherwise.
pub fn toggle_code(state: &EditorState) -> Result<EditorState> {
    let selection = state.selection();
    if selection.is_collapsed() || selection.anchor_key != selection.focus_key {
        return toggle_block_type(state, CODE_BLOCK);
    }
    toggle_inline_style(state, CODE)
}

/// Toggles `style` on the selected text. With a collapsed selection the
/// toggle becomes the style override for the next typed character.
pub fn toggle_inline_style(state: &EditorState, style: &str) -> Result<EditorState> {
    let selection = state.selection();
    let current = state.current_inline_style();

    if selection.is_collapsed() {
        let next = if current.has(style) {
            current.remove(style)
        } else {
            current.add(style)
        };
        return Ok(state.set_inline_style_override(Some(next)));
    }

    let content = state.current_content();
    let next = if current.has(style) {
        modifier::remove_inline_style(content, selection, style)?
    } else {
        modifier::apply_inline_style(content, selection, style)?
    };
    Ok(state.push(next, ChangeType::ChangeInlineStyle, false))
}

/// Attaches `entity_key` to `target`, or removes links from it when `None`.
pub fn toggle_link(
    state: &EditorState,
    target: &SelectionState,
    entity_key: Option<&EntityKey>,
) -> Result<EditorState> {
    let next = modifier::apply_entity(state.current_content(), target, entity_key)?;
    Ok(state.push(next, ChangeType::ApplyEntity, false))
}

/// With the cursor at the start of a styled block, the content with that
/// block reset to `unstyled`. A code block directly below a non-empty code
/// block keeps its type so the two stay one listing.
pub fn try_to_remove_block_style(state: &EditorState) -> Result<Option<ContentState>> {
    let selection = state.selection();
    if !selection.is_collapsed() || selection.anchor_offset != 0 {
        return Ok(None);
    }

    let content = state.current_content();
    let key = &selection.anchor_key;
    let block = content.block(key)?;
    let block_type = block.block_type();
    let continues_code = content
        .block_before(key)
        .is_some_and(|before| before.block_type() == CODE_BLOCK && !before.is_empty());
    if block_type == CODE_BLOCK && continues_code {
        return Ok(None);
    }
    if block_type == UNSTYLED {
        return Ok(None);
    }
    modifier::set_block_type(content, selection, UNSTYLED).map(Some)
}
