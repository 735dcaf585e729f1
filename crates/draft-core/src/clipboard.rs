use crate::block_map::BlockMap;
use crate::change::{ChangeType, RemovalDirection};
use crate::editor_state::EditorState;
use crate::error::Result;
use crate::modifier::{self, BlockDataMergeBehavior};

/// An editor-local cut buffer for kill/yank style commands (Ctrl+K and
/// Ctrl+Y), independent of the system clipboard.
#[derive(Debug, Clone, Default)]
pub struct SecondaryClipboard {
    clipboard: Option<BlockMap>,
}

impl SecondaryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Option<&BlockMap> {
        self.clipboard.as_ref()
    }

    /// Cuts the selection into the buffer. A collapsed cursor cuts to the end
    /// of its block, or joins the next block when already at the end. At the
    /// end of the last block nothing happens.
    pub fn cut(&mut self, state: &EditorState) -> Result<EditorState> {
        let content = state.current_content();
        let selection = state.selection();

        let target = if selection.is_collapsed() {
            let anchor_key = &selection.anchor_key;
            let block_end = content.block(anchor_key)?.len();
            if selection.anchor_offset == block_end {
                let Some(key_after) = content.key_after(anchor_key) else {
                    return Ok(state.clone());
                };
                selection.clone().with_focus(key_after.clone(), 0)
            } else {
                selection.clone().with_focus(anchor_key.clone(), block_end)
            }
        } else {
            selection.clone()
        };

        self.clipboard = Some(modifier::get_fragment(content, &target)?);

        let after_removal = modifier::remove_range(content, &target, RemovalDirection::Forward)?;
        if after_removal.ptr_eq(content) {
            return Ok(state.clone());
        }
        tracing::trace!(range = %target.describe(), "secondary cut");
        Ok(state.push(after_removal, ChangeType::RemoveRange, false))
    }

    /// Pastes the buffer over the current selection. An empty buffer leaves
    /// the state unchanged.
    pub fn paste(&self, state: &EditorState) -> Result<EditorState> {
        let Some(fragment) = &self.clipboard else {
            return Ok(state.clone());
        };
        let next = modifier::replace_with_fragment(
            state.current_content(),
            state.selection(),
            fragment,
            BlockDataMergeBehavior::default(),
        )?;
        Ok(state.push(next, ChangeType::InsertFragment, false))
    }

    pub fn clear(&mut self) {
        self.clipboard = None;
    }
}
