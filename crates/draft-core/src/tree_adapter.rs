use crate::block::is_list_type;
use crate::error::{DraftError, Result};
use crate::key::generate_random_key;
use crate::raw::{RawDraftContentBlock, RawDraftContentState};

fn is_list_block(block: &RawDraftContentBlock) -> bool {
    block.block_type.as_deref().is_some_and(is_list_type)
}

fn key_of(block: &RawDraftContentBlock) -> String {
    block.key.clone().unwrap_or_default()
}

/// Flattens a nested raw state in pre-order.
///
/// List items pass their depth plus one to same-type children and are
/// dropped once they have children, since their content lives on the leaves.
/// Other blocks that only group children (no text of their own) are dropped
/// too. Every node must carry a `children` list.
pub fn from_raw_tree_state_to_raw_state(
    state: &RawDraftContentState,
) -> Result<RawDraftContentState> {
    let mut flat = Vec::with_capacity(state.blocks.len());
    let mut stack: Vec<RawDraftContentBlock> = state.blocks.iter().rev().cloned().collect();

    while let Some(mut block) = stack.pop() {
        let Some(mut children) = block.children.take() else {
            return Err(DraftError::InvalidTreeBlock(key_of(&block)));
        };

        let is_list = is_list_block(&block);
        if is_list {
            for child in children.iter_mut() {
                if child.block_type == block.block_type {
                    child.depth = block.depth + 1;
                }
            }
        }

        let is_container = !children.is_empty() && (is_list || block.text.is_empty());
        stack.extend(children.into_iter().rev());
        if !is_container {
            flat.push(block);
        }
    }

    Ok(RawDraftContentState {
        blocks: flat,
        entity_map: state.entity_map.clone(),
    })
}

/// Nests a flat raw state by list depth. A list item one level deeper than
/// the open parent hangs under it; when that level is missing, an empty
/// parent of the same type is synthesized at `depth - 1`. Other blocks stay
/// at the root and close every open parent.
pub fn from_raw_state_to_raw_tree_state(state: &RawDraftContentState) -> RawDraftContentState {
    let mut roots: Vec<RawDraftContentBlock> = Vec::new();
    // Open parents, innermost last; each entry is the index path to the node.
    let mut parents: Vec<(Vec<usize>, usize)> = Vec::new();

    for block in &state.blocks {
        let depth = block.depth;
        let mut tree_block = block.clone();
        tree_block.children = Some(Vec::new());

        if !is_list_block(block) {
            parents.clear();
            roots.push(tree_block);
            continue;
        }

        let last_depth = parents.last().map(|(_, depth)| *depth);
        match last_depth {
            None if depth == 0 => roots.push(tree_block),
            None => {
                let parent = synthetic_parent(block, depth);
                roots.push(parent);
                let path = vec![roots.len() - 1];
                push_child(&mut roots, &path, tree_block);
                parents.push((path, depth - 1));
            }
            Some(parent_depth) if parent_depth + 1 < depth => {
                let parent = synthetic_parent(block, depth);
                let (parent_path, _) = parents.last().cloned().unwrap_or_default();
                let path = push_child(&mut roots, &parent_path, parent);
                push_child(&mut roots, &path, tree_block);
                parents.push((path, depth - 1));
            }
            Some(parent_depth) if parent_depth + 1 == depth => {
                let (parent_path, _) = parents.last().cloned().unwrap_or_default();
                push_child(&mut roots, &parent_path, tree_block);
            }
            Some(_) => {
                while parents.last().is_some_and(|(_, d)| *d >= depth) {
                    parents.pop();
                }
                match parents.last().cloned() {
                    Some((parent_path, _)) if depth > 0 => {
                        push_child(&mut roots, &parent_path, tree_block);
                    }
                    _ => roots.push(tree_block),
                }
            }
        }
    }

    RawDraftContentState {
        blocks: roots,
        entity_map: state.entity_map.clone(),
    }
}

fn synthetic_parent(child: &RawDraftContentBlock, child_depth: usize) -> RawDraftContentBlock {
    RawDraftContentBlock {
        key: Some(generate_random_key()),
        block_type: child.block_type.clone(),
        depth: child_depth - 1,
        children: Some(Vec::new()),
        ..RawDraftContentBlock::default()
    }
}

/// Appends `child` under the node at `path` and returns the child's path.
fn push_child(
    roots: &mut [RawDraftContentBlock],
    path: &[usize],
    child: RawDraftContentBlock,
) -> Vec<usize> {
    let Some((first, rest)) = path.split_first() else {
        return Vec::new();
    };
    let mut node = &mut roots[*first];
    for ix in rest {
        node = &mut node.children.get_or_insert_with(Vec::new)[*ix];
    }
    let children = node.children.get_or_insert_with(Vec::new);
    children.push(child);
    let mut child_path = path.to_vec();
    child_path.push(children.len() - 1);
    child_path
}
