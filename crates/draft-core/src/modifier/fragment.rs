use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::block::{
    BlockKey, BlockVariant, ContentBlock, TreeLinks, UNSTYLED, slice_chars, slice_list,
};
use crate::block_map::BlockMap;
use crate::content::ContentState;
use crate::error::{DraftError, Result};
use crate::key::generate_random_key;
use crate::selection::SelectionState;
use crate::tree::relink;

use super::edges::remove_entities_at_edges;
use super::insert::insert_into_list;

/// How the data of the block receiving a pasted fragment is combined with the
/// data of the fragment block landing in it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockDataMergeBehavior {
    #[default]
    ReplaceWithNewData,
    /// Keep both; on a key clash the receiving block wins.
    MergeOldDataToNew,
}

/// Copies the blocks covered by `selection`, trimmed to its edges, under
/// fresh keys. Non-mutable entities cut by either edge are detached first.
pub fn get_content_fragment(
    content: &ContentState,
    selection: &SelectionState,
) -> Result<BlockMap> {
    let start_key = selection.start_key();
    let start_offset = selection.start_offset();
    let end_key = selection.end_key();
    let end_offset = selection.end_offset();

    let stripped = remove_entities_at_edges(content, selection)?;
    let blocks = stripped.block_map().range(start_key, end_key)?;

    let trimmed = blocks.into_iter().map(|block| {
        let key = block.key();
        let len = block.len();
        let (start, end) = if start_key == end_key {
            (start_offset, end_offset)
        } else if key == start_key {
            (start_offset, len)
        } else if key == end_key {
            (0, end_offset)
        } else {
            return block;
        };
        Arc::new((*block).clone().with_text_and_characters(
            slice_chars(block.text(), start, end),
            slice_list(block.characters(), start, end),
        ))
    });

    Ok(randomize_keys(trimmed))
}

/// Re-keys a run of blocks, rewriting tree links that point inside the run
/// and dropping the ones that point outside it.
pub(crate) fn randomize_keys(blocks: impl IntoIterator<Item = Arc<ContentBlock>>) -> BlockMap {
    let blocks: Vec<Arc<ContentBlock>> = blocks.into_iter().collect();
    let keys: HashMap<BlockKey, BlockKey> = blocks
        .iter()
        .map(|block| (block.key().clone(), generate_random_key()))
        .collect();
    let remap = |key: Option<&BlockKey>| key.and_then(|key| keys.get(key).cloned());

    BlockMap::from_blocks(blocks.iter().map(|block| {
        let key = keys[block.key()].clone();
        let variant = match block.tree_links() {
            None => BlockVariant::Flat,
            Some(links) => BlockVariant::Tree(TreeLinks {
                children: links
                    .children
                    .iter()
                    .filter_map(|child| keys.get(child).cloned())
                    .collect(),
                parent: remap(links.parent.as_ref()),
                prev_sibling: remap(links.prev_sibling.as_ref()),
                next_sibling: remap(links.next_sibling.as_ref()),
            }),
        };
        Arc::new((**block).clone().with_key(key).with_variant(variant))
    }))
}

/// Splices `fragment` into the document at the collapsed `selection`.
///
/// A one-block fragment is merged into the receiving block. Longer fragments
/// split the receiving block: its head takes the first fragment block's text,
/// the last fragment block takes its tail, and the blocks in between are
/// inserted as they are. Fragment blocks are re-keyed and converted to the
/// document's block variant.
pub fn insert_fragment_into_content(
    content: &ContentState,
    selection: &SelectionState,
    fragment: &BlockMap,
    merge_block_data: BlockDataMergeBehavior,
) -> Result<ContentState> {
    if !selection.is_collapsed() {
        return Err(DraftError::SelectionNotCollapsed("insert_fragment"));
    }
    if fragment.is_empty() {
        return Ok(content.clone());
    }

    let target_key = selection.start_key();
    let target_offset = selection.start_offset();
    let target = content.block(target_key)?;
    if target.has_children() {
        return Err(DraftError::ContainerBlock(target_key.clone()));
    }

    let fragment: Vec<Arc<ContentBlock>> = randomize_keys(fragment.iter().cloned())
        .iter()
        .map(|block| Arc::new(adopt_variant(block, target)))
        .collect();

    match fragment.as_slice() {
        [single] => update_existing_block(content, selection, target, single, merge_block_data),
        [first, .., last] => insert_blocks(
            content,
            selection,
            target,
            first,
            last,
            &fragment,
            merge_block_data,
        ),
        [] => Ok(content.clone()),
    }
}

/// Makes a fragment block match the variant of the block it is pasted next
/// to. Tree blocks land as siblings of the target and are relinked later.
fn adopt_variant(block: &ContentBlock, target: &ContentBlock) -> ContentBlock {
    let variant = match target.tree_links() {
        None => BlockVariant::Flat,
        Some(links) => BlockVariant::Tree(TreeLinks {
            parent: links.parent.clone(),
            ..TreeLinks::default()
        }),
    };
    block.clone().with_variant(variant)
}

fn merged_data(
    target: &ContentBlock,
    fragment_block: &ContentBlock,
    behavior: BlockDataMergeBehavior,
) -> crate::block::BlockData {
    match behavior {
        BlockDataMergeBehavior::ReplaceWithNewData => fragment_block.data().clone(),
        BlockDataMergeBehavior::MergeOldDataToNew => {
            let mut data = fragment_block.data().clone();
            data.extend(target.data().clone());
            data
        }
    }
}

fn update_existing_block(
    content: &ContentState,
    selection: &SelectionState,
    target: &ContentBlock,
    fragment_block: &ContentBlock,
    behavior: BlockDataMergeBehavior,
) -> Result<ContentState> {
    let len = target.len();
    let mut text = slice_chars(target.text(), 0, selection.start_offset()).to_string();
    text.push_str(fragment_block.text());
    text.push_str(slice_chars(target.text(), selection.start_offset(), len));
    let characters = insert_into_list(
        target.characters(),
        fragment_block.characters().clone(),
        selection.start_offset(),
    );

    let block_type = if target.is_empty() && target.block_type() == UNSTYLED {
        fragment_block.block_type()
    } else {
        target.block_type()
    };
    let updated = target
        .clone()
        .with_text_and_characters(text, characters)
        .with_type(block_type)
        .with_data(merged_data(target, fragment_block, behavior));

    let final_offset = selection.start_offset() + fragment_block.len();
    Ok(content
        .with_block_map(content.block_map().replace(Arc::new(updated))?)
        .with_selection_before(selection.clone())
        .with_selection_after(selection.collapse_to(target.key().clone(), final_offset)))
}

fn insert_blocks(
    content: &ContentState,
    selection: &SelectionState,
    target: &ContentBlock,
    head: &ContentBlock,
    tail: &ContentBlock,
    fragment: &[Arc<ContentBlock>],
    behavior: BlockDataMergeBehavior,
) -> Result<ContentState> {
    let offset = selection.start_offset();
    let len = target.len();

    let head_text = slice_chars(target.text(), 0, offset);
    let block_type = if head_text.is_empty() {
        head.block_type()
    } else {
        target.block_type()
    };
    let mut head_characters = slice_list(target.characters(), 0, offset);
    head_characters.append(head.characters().clone());
    let updated_head = target
        .clone()
        .with_text_and_characters(format!("{head_text}{}", head.text()), head_characters)
        .with_type(block_type)
        .with_data(merged_data(target, head, behavior));

    let mut tail_characters = tail.characters().clone();
    tail_characters.append(slice_list(target.characters(), offset, len));
    let updated_tail = tail.clone().with_text_and_characters(
        format!("{}{}", tail.text(), slice_chars(target.text(), offset, len)),
        tail_characters,
    );

    let middle = &fragment[1..fragment.len() - 1];
    let replacement = std::iter::once(Arc::new(updated_head))
        .chain(middle.iter().cloned())
        .chain(std::iter::once(Arc::new(updated_tail)));

    let block_map = content.block_map();
    let ix = block_map
        .position(target.key())
        .ok_or_else(|| DraftError::UnknownBlock(target.key().clone()))?;
    let mut updated = block_map.splice(ix, ix + 1, replacement);
    if target.is_tree() {
        updated = relink(block_map, &updated);
    }

    Ok(content
        .with_block_map(updated)
        .with_selection_before(selection.clone())
        .with_selection_after(selection.collapse_to(tail.key().clone(), tail.len())))
}
