use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of edit that produced a new content, as recorded by
/// [`crate::EditorState::push`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeType {
    AdjustDepth,
    ApplyEntity,
    BackspaceCharacter,
    ChangeBlockData,
    ChangeBlockType,
    ChangeInlineStyle,
    MoveBlock,
    DeleteCharacter,
    InsertCharacters,
    InsertFragment,
    Redo,
    RemoveRange,
    SpellcheckChange,
    SplitBlock,
    Undo,
}

impl ChangeType {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeType::AdjustDepth => "adjust-depth",
            ChangeType::ApplyEntity => "apply-entity",
            ChangeType::BackspaceCharacter => "backspace-character",
            ChangeType::ChangeBlockData => "change-block-data",
            ChangeType::ChangeBlockType => "change-block-type",
            ChangeType::ChangeInlineStyle => "change-inline-style",
            ChangeType::MoveBlock => "move-block",
            ChangeType::DeleteCharacter => "delete-character",
            ChangeType::InsertCharacters => "insert-characters",
            ChangeType::InsertFragment => "insert-fragment",
            ChangeType::Redo => "redo",
            ChangeType::RemoveRange => "remove-range",
            ChangeType::SpellcheckChange => "spellcheck-change",
            ChangeType::SplitBlock => "split-block",
            ChangeType::Undo => "undo",
        }
    }

    /// Typing edits that extend the previous undo entry when repeated.
    pub fn is_typing_continuation(self) -> bool {
        matches!(
            self,
            ChangeType::InsertCharacters
                | ChangeType::BackspaceCharacter
                | ChangeType::DeleteCharacter
        )
    }

    /// Edits that keep a pending inline style override alive.
    pub fn keeps_style_override(self) -> bool {
        matches!(
            self,
            ChangeType::AdjustDepth | ChangeType::ChangeBlockType | ChangeType::SplitBlock
        )
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which way a removal proceeds from the selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemovalDirection {
    Backward,
    #[default]
    Forward,
}
