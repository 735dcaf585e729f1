use std::fmt;
use std::sync::Arc;

use crate::bidi::{BidiService, DirectionMap, FirstStrongBidi, direction_map, update_direction_map};
use crate::change::ChangeType;
use crate::character::InlineStyle;
use crate::config::EditorConfig;
use crate::content::ContentState;
use crate::decorator::{
    BlockTree, Decorator, TreeMap, generate_tree_map, regenerate_tree_for_new_blocks,
    regenerate_tree_for_new_decorator,
};
use crate::selection::SelectionState;

/// A document snapshot together with its undo history, derived render data
/// and transient editing flags.
///
/// Transitions return a new state; the receiver is left untouched. Contents
/// on the stacks are shared with `current_content`, never copied.
#[derive(Clone)]
pub struct EditorState {
    current_content: ContentState,
    selection: SelectionState,
    decorator: Option<Arc<dyn Decorator>>,
    bidi: Arc<dyn BidiService>,
    allow_undo: bool,
    max_undo: Option<usize>,
    /// Most recent entry at the back.
    undo_stack: imbl::Vector<ContentState>,
    redo_stack: imbl::Vector<ContentState>,
    tree_map: TreeMap,
    direction_map: DirectionMap,
    in_composition_mode: bool,
    force_selection: bool,
    inline_style_override: Option<InlineStyle>,
    last_change_type: Option<ChangeType>,
}

impl EditorState {
    pub fn create_empty(decorator: Option<Arc<dyn Decorator>>) -> Self {
        Self::create_with_text("", decorator)
    }

    pub fn create_with_text(text: &str, decorator: Option<Arc<dyn Decorator>>) -> Self {
        Self::create_with_content(ContentState::create_from_text(text), decorator)
    }

    /// Starts an editor on `content` with the cursor at the start of its
    /// first block and empty history.
    pub fn create_with_content(
        content: ContentState,
        decorator: Option<Arc<dyn Decorator>>,
    ) -> Self {
        let selection = SelectionState::create_empty(content.first_block().key().clone());
        let bidi: Arc<dyn BidiService> = Arc::new(FirstStrongBidi);
        let tree_map = generate_tree_map(&content, decorator.as_deref());
        let direction_map = direction_map(bidi.as_ref(), &content);
        Self {
            current_content: content,
            selection,
            decorator,
            bidi,
            allow_undo: true,
            max_undo: None,
            undo_stack: imbl::Vector::new(),
            redo_stack: imbl::Vector::new(),
            tree_map,
            direction_map,
            in_composition_mode: false,
            force_selection: false,
            inline_style_override: None,
            last_change_type: None,
        }
    }

    pub fn with_config(mut self, config: &EditorConfig) -> Self {
        let config = config.clone().with_defaults();
        self.allow_undo = config.allow_undo;
        self.max_undo = config.max_undo;
        self.undo_stack = trim_history(self.undo_stack, self.max_undo);
        self
    }

    /// Replaces the direction provider and recomputes every block direction.
    pub fn with_bidi_service(mut self, bidi: Arc<dyn BidiService>) -> Self {
        self.direction_map = direction_map(bidi.as_ref(), &self.current_content);
        self.bidi = bidi;
        self
    }

    pub fn current_content(&self) -> &ContentState {
        &self.current_content
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn decorator(&self) -> Option<&Arc<dyn Decorator>> {
        self.decorator.as_ref()
    }

    pub fn allow_undo(&self) -> bool {
        self.allow_undo
    }

    pub fn undo_stack(&self) -> &imbl::Vector<ContentState> {
        &self.undo_stack
    }

    pub fn redo_stack(&self) -> &imbl::Vector<ContentState> {
        &self.redo_stack
    }

    pub fn can_undo(&self) -> bool {
        self.allow_undo && !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        self.allow_undo && !self.redo_stack.is_empty()
    }

    pub fn tree_map(&self) -> &TreeMap {
        &self.tree_map
    }

    pub fn block_tree(&self, key: &str) -> Option<&BlockTree> {
        self.tree_map.get(key)
    }

    pub fn direction_map(&self) -> &DirectionMap {
        &self.direction_map
    }

    pub fn is_in_composition_mode(&self) -> bool {
        self.in_composition_mode
    }

    pub fn must_force_selection(&self) -> bool {
        self.force_selection
    }

    pub fn inline_style_override(&self) -> Option<&InlineStyle> {
        self.inline_style_override.as_ref()
    }

    pub fn last_change_type(&self) -> Option<ChangeType> {
        self.last_change_type
    }

    pub fn set_allow_undo(&self, allow_undo: bool) -> Self {
        Self {
            allow_undo,
            ..self.clone()
        }
    }

    pub fn set_in_composition_mode(&self, in_composition_mode: bool) -> Self {
        Self {
            in_composition_mode,
            ..self.clone()
        }
    }

    pub fn set_inline_style_override(&self, inline_style_override: Option<InlineStyle>) -> Self {
        Self {
            inline_style_override,
            ..self.clone()
        }
    }

    /// Swaps the decorator. When both the old and the new decorator exist,
    /// only blocks whose decorations changed identity get a new tree.
    pub fn set_decorator(&self, decorator: Option<Arc<dyn Decorator>>) -> Self {
        let same = match (&self.decorator, &decorator) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        if same {
            return self.clone();
        }

        let tree_map = match (&decorator, &self.decorator) {
            (Some(next), Some(existing)) => regenerate_tree_for_new_decorator(
                &self.current_content,
                &self.tree_map,
                next.as_ref(),
                existing.as_ref(),
            ),
            _ => generate_tree_map(&self.current_content, decorator.as_deref()),
        };
        tracing::debug!(has_decorator = decorator.is_some(), "decorator swapped");
        Self {
            decorator,
            tree_map,
            ..self.clone()
        }
    }

    /// Installs `content` as the current content.
    ///
    /// Consecutive typing edits of one kind with no independent selection
    /// move in between extend the same undo entry; anything else starts a new
    /// one. Pushing the current content itself is a no-op.
    pub fn push(
        &self,
        content: ContentState,
        change_type: ChangeType,
        force_selection: bool,
    ) -> Self {
        if content.ptr_eq(&self.current_content) {
            return self.clone();
        }

        let direction_map = update_direction_map(
            self.bidi.as_ref(),
            &self.current_content,
            &self.direction_map,
            &content,
        );
        let selection = content.selection_after().clone();

        if !self.allow_undo {
            tracing::trace!(%change_type, "push without history");
            let tree_map = self.regenerate_for(&content);
            return Self {
                current_content: content,
                selection,
                tree_map,
                direction_map,
                last_change_type: Some(change_type),
                force_selection,
                inline_style_override: None,
                ..self.clone()
            };
        }

        let current = &self.current_content;
        let mut undo_stack = self.undo_stack.clone();
        let new_content = if self.selection != *current.selection_after()
            || self.must_become_boundary(change_type)
        {
            tracing::debug!(%change_type, depth = undo_stack.len() + 1, "undo boundary");
            undo_stack.push_back(current.clone());
            undo_stack = trim_history(undo_stack, self.max_undo);
            content.with_selection_before(self.selection.clone())
        } else if change_type.is_typing_continuation() {
            tracing::trace!(%change_type, "continuing undo entry");
            content.with_selection_before(current.selection_before().clone())
        } else {
            content
        };

        let inline_style_override = if change_type.keeps_style_override() {
            self.inline_style_override.clone()
        } else {
            None
        };

        let tree_map = self.regenerate_for(&new_content);
        Self {
            current_content: new_content,
            selection,
            undo_stack,
            redo_stack: imbl::Vector::new(),
            tree_map,
            direction_map,
            last_change_type: Some(change_type),
            force_selection,
            inline_style_override,
            ..self.clone()
        }
    }

    /// Restores the most recent undo entry, with the selection the undone
    /// edit started from.
    pub fn undo(&self) -> Self {
        if !self.allow_undo {
            return self.clone();
        }
        let mut undo_stack = self.undo_stack.clone();
        let Some(previous) = undo_stack.pop_back() else {
            return self.clone();
        };
        let current = &self.current_content;
        let mut redo_stack = self.redo_stack.clone();
        redo_stack.push_back(current.clone());
        tracing::debug!(remaining = undo_stack.len(), "undo");

        self.restore(
            previous,
            current.selection_before().clone(),
            undo_stack,
            redo_stack,
            ChangeType::Undo,
        )
    }

    pub fn redo(&self) -> Self {
        if !self.allow_undo {
            return self.clone();
        }
        let mut redo_stack = self.redo_stack.clone();
        let Some(next) = redo_stack.pop_back() else {
            return self.clone();
        };
        let mut undo_stack = self.undo_stack.clone();
        undo_stack.push_back(self.current_content.clone());
        let undo_stack = trim_history(undo_stack, self.max_undo);
        tracing::debug!(remaining = redo_stack.len(), "redo");

        let selection = next.selection_after().clone();
        self.restore(next, selection, undo_stack, redo_stack, ChangeType::Redo)
    }

    fn restore(
        &self,
        content: ContentState,
        selection: SelectionState,
        undo_stack: imbl::Vector<ContentState>,
        redo_stack: imbl::Vector<ContentState>,
        change_type: ChangeType,
    ) -> Self {
        let direction_map = update_direction_map(
            self.bidi.as_ref(),
            &self.current_content,
            &self.direction_map,
            &content,
        );
        let tree_map = self.regenerate_for(&content);
        Self {
            current_content: content,
            selection,
            undo_stack,
            redo_stack,
            tree_map,
            direction_map,
            force_selection: true,
            inline_style_override: None,
            last_change_type: Some(change_type),
            ..self.clone()
        }
    }

    /// Takes a selection reported by the host without forcing it back.
    pub fn accept_selection(&self, selection: SelectionState) -> Self {
        self.update_selection(selection, false)
    }

    /// Sets a selection the host must render, focusing the editor.
    pub fn force_selection(&self, selection: SelectionState) -> Self {
        self.update_selection(selection.with_has_focus(true), true)
    }

    fn update_selection(&self, selection: SelectionState, force_selection: bool) -> Self {
        Self {
            selection,
            force_selection,
            inline_style_override: None,
            ..self.clone()
        }
    }

    pub fn move_selection_to_end(&self) -> Self {
        let last = self.current_content.last_block();
        self.accept_selection(SelectionState::collapsed(last.key().clone(), last.len()))
    }

    pub fn move_focus_to_end(&self) -> Self {
        let moved = self.move_selection_to_end();
        let selection = moved.selection.clone();
        moved.force_selection(selection)
    }

    /// The style the next typed character would get: the override when set,
    /// otherwise the style found around the selection start.
    pub fn current_inline_style(&self) -> InlineStyle {
        if let Some(style) = &self.inline_style_override {
            return style.clone();
        }
        let content = &self.current_content;
        let start_key = self.selection.start_key();
        let start_offset = self.selection.start_offset();
        let Some(block) = content.block_for_key(start_key) else {
            return InlineStyle::new();
        };

        if self.selection.is_collapsed() {
            if start_offset > 0 {
                return block.inline_style_at(start_offset - 1).clone();
            }
            if !block.is_empty() {
                return block.inline_style_at(0).clone();
            }
        } else {
            if start_offset < block.len() {
                return block.inline_style_at(start_offset).clone();
            }
            if start_offset > 0 {
                return block.inline_style_at(start_offset - 1).clone();
            }
        }
        look_upward_for_inline_style(content, start_key)
    }

    pub fn is_selection_at_start_of_content(&self) -> bool {
        let first = self.current_content.first_block();
        self.selection.has_edge_within(first.key(), 0, 0)
    }

    pub fn is_selection_at_end_of_content(&self) -> bool {
        let last = self.current_content.last_block();
        let end = last.len();
        self.selection.has_edge_within(last.key(), end, end)
    }

    fn must_become_boundary(&self, change_type: ChangeType) -> bool {
        self.last_change_type != Some(change_type) || !change_type.is_typing_continuation()
    }

    fn regenerate_for(&self, content: &ContentState) -> TreeMap {
        regenerate_tree_for_new_blocks(
            &self.current_content,
            &self.tree_map,
            content,
            self.decorator.as_deref(),
        )
    }
}

fn trim_history(
    mut stack: imbl::Vector<ContentState>,
    max_undo: Option<usize>,
) -> imbl::Vector<ContentState> {
    if let Some(max) = max_undo {
        while stack.len() > max {
            stack.pop_front();
        }
    }
    stack
}

fn look_upward_for_inline_style(content: &ContentState, from_key: &str) -> InlineStyle {
    let mut key = content.key_before(from_key);
    while let Some(current) = key {
        if let Some(block) = content.block_for_key(current).filter(|b| !b.is_empty()) {
            return block.inline_style_at(block.len() - 1).clone();
        }
        key = content.key_before(current);
    }
    InlineStyle::new()
}

impl fmt::Debug for EditorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorState")
            .field("current_content", &self.current_content)
            .field("selection", &self.selection)
            .field("has_decorator", &self.decorator.is_some())
            .field("allow_undo", &self.allow_undo)
            .field("undo_depth", &self.undo_stack.len())
            .field("redo_depth", &self.redo_stack.len())
            .field("in_composition_mode", &self.in_composition_mode)
            .field("force_selection", &self.force_selection)
            .field("inline_style_override", &self.inline_style_override)
            .field("last_change_type", &self.last_change_type)
            .finish_non_exhaustive()
    }
}
