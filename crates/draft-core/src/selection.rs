use serde::{Deserialize, Serialize};

use crate::block::BlockKey;

/// Anchor/focus range over the blocks of a document.
///
/// Offsets are character (code point) offsets inside the keyed block. Start
/// and end are derived from `is_backward` rather than stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionState {
    pub anchor_key: BlockKey,
    pub anchor_offset: usize,
    pub focus_key: BlockKey,
    pub focus_offset: usize,
    #[serde(default)]
    pub is_backward: bool,
    #[serde(default)]
    pub has_focus: bool,
}

impl SelectionState {
    pub fn create_empty(key: impl Into<BlockKey>) -> Self {
        let key = key.into();
        Self::collapsed(key, 0)
    }

    pub fn collapsed(key: impl Into<BlockKey>, offset: usize) -> Self {
        let key = key.into();
        Self {
            anchor_key: key.clone(),
            anchor_offset: offset,
            focus_key: key,
            focus_offset: offset,
            is_backward: false,
            has_focus: false,
        }
    }

    /// A forward range from `(start_key, start_offset)` to `(end_key, end_offset)`.
    pub fn range(
        start_key: impl Into<BlockKey>,
        start_offset: usize,
        end_key: impl Into<BlockKey>,
        end_offset: usize,
    ) -> Self {
        Self {
            anchor_key: start_key.into(),
            anchor_offset: start_offset,
            focus_key: end_key.into(),
            focus_offset: end_offset,
            is_backward: false,
            has_focus: false,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor_key == self.focus_key && self.anchor_offset == self.focus_offset
    }

    pub fn start_key(&self) -> &BlockKey {
        if self.is_backward {
            &self.focus_key
        } else {
            &self.anchor_key
        }
    }

    pub fn start_offset(&self) -> usize {
        if self.is_backward {
            self.focus_offset
        } else {
            self.anchor_offset
        }
    }

    pub fn end_key(&self) -> &BlockKey {
        if self.is_backward {
            &self.anchor_key
        } else {
            &self.focus_key
        }
    }

    pub fn end_offset(&self) -> usize {
        if self.is_backward {
            self.anchor_offset
        } else {
            self.focus_offset
        }
    }

    /// Whether an edge of the selection falls inside `[start, end]` of `block_key`.
    pub fn has_edge_within(&self, block_key: &str, start: usize, end: usize) -> bool {
        let within = |offset: usize| start <= offset && offset <= end;

        if self.anchor_key == self.focus_key && self.anchor_key == block_key {
            return within(self.start_offset()) || within(self.end_offset());
        }

        if block_key != self.anchor_key && block_key != self.focus_key {
            return false;
        }

        let offset = if block_key == self.anchor_key {
            self.anchor_offset
        } else {
            self.focus_offset
        };
        within(offset)
    }

    /// The same range expressed with the anchor at the start.
    pub fn to_forward(&self) -> Self {
        if !self.is_backward {
            return self.clone();
        }
        Self {
            anchor_key: self.focus_key.clone(),
            anchor_offset: self.focus_offset,
            focus_key: self.anchor_key.clone(),
            focus_offset: self.anchor_offset,
            is_backward: false,
            has_focus: self.has_focus,
        }
    }

    /// Collapses onto `(key, offset)`, keeping `has_focus`.
    pub fn collapse_to(&self, key: impl Into<BlockKey>, offset: usize) -> Self {
        let key = key.into();
        Self {
            anchor_key: key.clone(),
            anchor_offset: offset,
            focus_key: key,
            focus_offset: offset,
            is_backward: false,
            has_focus: self.has_focus,
        }
    }

    pub fn with_anchor(mut self, key: impl Into<BlockKey>, offset: usize) -> Self {
        self.anchor_key = key.into();
        self.anchor_offset = offset;
        self
    }

    pub fn with_focus(mut self, key: impl Into<BlockKey>, offset: usize) -> Self {
        self.focus_key = key.into();
        self.focus_offset = offset;
        self
    }

    pub fn with_is_backward(mut self, is_backward: bool) -> Self {
        self.is_backward = is_backward;
        self
    }

    pub fn with_has_focus(mut self, has_focus: bool) -> Self {
        self.has_focus = has_focus;
        self
    }

    pub fn describe(&self) -> String {
        format!(
            "Anchor: {}:{}, Focus: {}:{}, Is Backward: {}, Has Focus: {}",
            self.anchor_key,
            self.anchor_offset,
            self.focus_key,
            self.focus_offset,
            self.is_backward,
            self.has_focus
        )
    }
}
