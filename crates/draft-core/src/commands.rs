use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::block::UNSTYLED;
use crate::change::ChangeType;
use crate::editor_state::EditorState;
use crate::entity::EntityMutability;
use crate::error::DraftError;
use crate::modifier;
use crate::rich_text;

pub const DEFAULT_MAX_DEPTH: usize = 4;

#[derive(Debug, Clone)]
pub struct CommandError {
    message: String,
}

impl CommandError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<DraftError> for CommandError {
    fn from(err: DraftError) -> Self {
        Self::new(err.to_string())
    }
}

pub type CommandHandler =
    Arc<dyn Fn(&EditorState, Option<Value>) -> Result<EditorState, CommandError> + Send + Sync>;

#[derive(Clone)]
pub struct CommandSpec {
    pub id: String,
    pub label: String,
    pub description: Option<String>,
    pub keywords: Vec<String>,
    pub args_example: Option<Value>,
    pub handler: CommandHandler,
}

impl CommandSpec {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        handler: impl Fn(&EditorState, Option<Value>) -> Result<EditorState, CommandError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            description: None,
            keywords: Vec::new(),
            args_example: None,
            handler: Arc::new(handler),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn args_example(mut self, args_example: Value) -> Self {
        self.args_example = Some(args_example);
        self
    }

    /// Case-insensitive match against the id, label, description and keywords.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        std::iter::once(self.id.as_str())
            .chain(std::iter::once(self.label.as_str()))
            .chain(self.description.as_deref())
            .chain(self.keywords.iter().map(String::as_str))
            .any(|field| field.to_lowercase().contains(&query))
    }
}

#[derive(Clone, Default)]
pub struct CommandRegistry {
    commands: HashMap<String, CommandSpec>,
}

impl CommandRegistry {
    pub fn new(commands: impl IntoIterator<Item = CommandSpec>) -> Result<Self, CommandError> {
        let mut registry = Self::default();
        for command in commands {
            registry.register(command)?;
        }
        Ok(registry)
    }

    /// The built-in editing commands.
    pub fn core() -> Self {
        Self::new(core_commands()).expect("core command ids must be unique")
    }

    pub fn register(&mut self, command: CommandSpec) -> Result<(), CommandError> {
        if self.commands.contains_key(&command.id) {
            return Err(CommandError::new(format!(
                "Command already registered: {}",
                command.id
            )));
        }
        self.commands.insert(command.id.clone(), command);
        Ok(())
    }

    pub fn commands(&self) -> &HashMap<String, CommandSpec> {
        &self.commands
    }

    pub fn command(&self, id: &str) -> Option<CommandSpec> {
        self.commands.get(id).cloned()
    }

    /// Commands matching `query`, sorted by id, for palettes and menus.
    pub fn search(&self, query: &str) -> Vec<&CommandSpec> {
        let mut found: Vec<&CommandSpec> = self
            .commands
            .values()
            .filter(|command| command.matches(query))
            .collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        found
    }

    pub fn run(
        &self,
        state: &EditorState,
        id: &str,
        args: Option<Value>,
    ) -> Result<EditorState, CommandError> {
        let Some(command) = self.commands.get(id) else {
            return Err(CommandError::new(format!("Unknown command: {id}")));
        };
        tracing::trace!(command = id, "running command");
        (command.handler)(state, args)
    }
}

fn string_arg<'a>(args: &'a Option<Value>, name: &str) -> Result<&'a str, CommandError> {
    args.as_ref()
        .and_then(|args| args.get(name))
        .and_then(Value::as_str)
        .ok_or_else(|| CommandError::new(format!("Missing string argument: {name}")))
}

fn max_depth_arg(args: &Option<Value>) -> usize {
    args.as_ref()
        .and_then(|args| args.get("maxDepth"))
        .and_then(Value::as_u64)
        .map_or(DEFAULT_MAX_DEPTH, |depth| depth as usize)
}

/// Runs a key command, leaving the state as is when it does not apply.
fn key_command(id: &'static str, label: &'static str) -> CommandSpec {
    CommandSpec::new(id, label, move |state, _args| {
        Ok(rich_text::handle_key_command(state, id)?.unwrap_or_else(|| state.clone()))
    })
}

fn core_commands() -> Vec<CommandSpec> {
    vec![
        key_command("bold", "Toggle bold")
            .description("Toggle bold on the selection, or for the next typed text.")
            .keywords(["bold", "strong", "style"]),
        key_command("italic", "Toggle italic")
            .description("Toggle italic on the selection, or for the next typed text.")
            .keywords(["italic", "emphasis", "style"]),
        key_command("underline", "Toggle underline").keywords(["underline", "style"]),
        key_command("code", "Toggle code")
            .description("Toggle inline code, or a code block for multi-block selections.")
            .keywords(["code", "monospace"]),
        key_command("backspace", "Backspace").keywords(["backspace", "atomic"]),
        key_command("delete", "Delete").keywords(["delete", "atomic"]),
        CommandSpec::new("undo", "Undo", |state, _args| Ok(state.undo()))
            .keywords(["undo", "history"]),
        CommandSpec::new("redo", "Redo", |state, _args| Ok(state.redo()))
            .keywords(["redo", "history"]),
        CommandSpec::new("split-block", "Split block", |state, _args| {
            let content = modifier::split_block(state.current_content(), state.selection())?;
            Ok(state.push(content, ChangeType::SplitBlock, false))
        })
        .description("Split the current block at the selection.")
        .keywords(["enter", "newline", "paragraph"]),
        CommandSpec::new("insert-soft-newline", "Insert soft newline", |state, _args| {
            Ok(rich_text::insert_soft_newline(state)?)
        })
        .keywords(["newline", "line break"]),
        CommandSpec::new("insert-text", "Insert text", |state, args| {
            let text = string_arg(&args, "text")?;
            let style = state.current_inline_style();
            let content = modifier::replace_text(
                state.current_content(),
                state.selection(),
                text,
                Some(&style),
                None,
            )?;
            Ok(state.push(content, ChangeType::InsertCharacters, false))
        })
        .args_example(serde_json::json!({ "text": "hello" }))
        .keywords(["type", "text"]),
        CommandSpec::new("toggle-block-type", "Toggle block type", |state, args| {
            let block_type = string_arg(&args, "blockType").unwrap_or(UNSTYLED);
            Ok(rich_text::toggle_block_type(state, block_type)?)
        })
        .description("Toggle the type of the selected blocks.")
        .args_example(serde_json::json!({ "blockType": "header-one" }))
        .keywords(["heading", "list", "quote", "block"]),
        CommandSpec::new("indent", "Indent list item", |state, args| {
            Ok(rich_text::on_tab(state, false, max_depth_arg(&args))?)
        })
        .args_example(serde_json::json!({ "maxDepth": DEFAULT_MAX_DEPTH }))
        .keywords(["tab", "indent", "list"]),
        CommandSpec::new("outdent", "Outdent list item", |state, args| {
            Ok(rich_text::on_tab(state, true, max_depth_arg(&args))?)
        })
        .keywords(["shift tab", "outdent", "list"]),
        CommandSpec::new("link", "Link selection", |state, args| {
            let url = string_arg(&args, "url")?;
            let selection = state.selection();
            if selection.is_collapsed() {
                return Ok(state.clone());
            }
            let content = state.current_content().create_entity(
                rich_text::LINK,
                EntityMutability::Mutable,
                rich_text::link_data_for_url(url),
            );
            let key = content.last_created_entity_key().cloned();
            let linked = modifier::apply_entity(&content, selection, key.as_ref())?;
            Ok(state.push(linked, ChangeType::ApplyEntity, false))
        })
        .description("Attach a link to the selected text.")
        .args_example(serde_json::json!({ "url": "https://example.com" }))
        .keywords(["link", "url", "anchor"]),
        CommandSpec::new("unlink", "Remove link", |state, _args| {
            Ok(rich_text::toggle_link(state, state.selection(), None)?)
        })
        .keywords(["link", "unlink"]),
    ]
}
