mod bidi;
mod block;
mod block_map;
mod change;
mod character;
mod clipboard;
mod commands;
mod config;
mod content;
mod convert;
mod decorator;
mod editor_state;
mod entity;
mod error;
mod key;
mod ranges;
mod raw;
mod selection;

pub mod modifier;
pub mod rich_text;
pub mod tree;
pub mod tree_adapter;

pub use crate::bidi::*;
pub use crate::block::*;
pub use crate::block_map::*;
pub use crate::change::*;
pub use crate::character::*;
pub use crate::clipboard::*;
pub use crate::commands::*;
pub use crate::config::*;
pub use crate::content::*;
pub use crate::convert::*;
pub use crate::decorator::*;
pub use crate::editor_state::*;
pub use crate::entity::*;
pub use crate::error::*;
pub use crate::key::*;
pub use crate::ranges::*;
pub use crate::raw::*;
pub use crate::selection::*;
