use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::block::{BlockKey, BlockVariant, ContentBlock, TreeLinks};
use crate::block_map::BlockMap;
use crate::error::{DraftError, Result};

/// Key of the block that follows `block` once all of its descendants are
/// skipped, or `None` for flat blocks and for the last subtree.
pub fn next_delimiter_block_key(block: &ContentBlock, block_map: &BlockMap) -> Option<BlockKey> {
    if !block.is_tree() {
        return None;
    }
    if let Some(next) = block.next_sibling_key() {
        return Some(next.clone());
    }
    let mut ancestor = block.parent_key().and_then(|key| block_map.get(key));
    while let Some(current) = ancestor {
        if let Some(next) = current.next_sibling_key() {
            return Some(next.clone());
        }
        ancestor = current.parent_key().and_then(|key| block_map.get(key));
    }
    None
}

pub fn is_valid_tree(block_map: &BlockMap) -> bool {
    validate_tree(block_map).is_ok()
}

/// Checks that the tree blocks of `block_map` form a multi-root forest whose
/// pre-order walk visits every block exactly once, in document order.
pub fn validate_tree(block_map: &BlockMap) -> Result<()> {
    let Some(first) = block_map.first() else {
        return Ok(());
    };
    if block_map.iter().any(|block| !block.is_tree()) {
        return Err(DraftError::InvalidTree("flat and tree blocks are mixed".into()));
    }
    if first.parent_key().is_some() || first.prev_sibling_key().is_some() {
        return Err(DraftError::InvalidTree(format!(
            "first block {} is not the first root",
            first.key()
        )));
    }

    for block in block_map.iter() {
        validate_links(block, block_map)?;
    }

    let mut visited = HashSet::new();
    let mut order = Vec::with_capacity(block_map.len());
    let mut root = Some(first.key().clone());
    while let Some(key) = root {
        let block = lookup(block_map, &key)?;
        walk(block, block_map, &mut visited, &mut order)?;
        root = block.next_sibling_key().cloned();
    }

    if order.len() != block_map.len() {
        return Err(DraftError::InvalidTree(format!(
            "{} of {} blocks are reachable from the roots",
            order.len(),
            block_map.len()
        )));
    }
    if !order.iter().eq(block_map.keys()) {
        return Err(DraftError::InvalidTree(
            "document order is not a pre-order walk of the forest".into(),
        ));
    }
    Ok(())
}

fn lookup<'a>(block_map: &'a BlockMap, key: &str) -> Result<&'a Arc<ContentBlock>> {
    block_map
        .get(key)
        .ok_or_else(|| DraftError::InvalidTree(format!("dangling reference to {key}")))
}

fn validate_links(block: &ContentBlock, block_map: &BlockMap) -> Result<()> {
    let key = block.key();
    let invalid = |reason: &str| DraftError::InvalidTree(format!("block {key}: {reason}"));

    if let Some(parent_key) = block.parent_key() {
        let parent = lookup(block_map, parent_key)?;
        if !parent.child_keys().unwrap_or_default().contains(key) {
            return Err(invalid("parent does not list it as a child"));
        }
    }

    let children = block.child_keys().unwrap_or_default();
    for (ix, child_key) in children.iter().enumerate() {
        let child = lookup(block_map, child_key)?;
        if child.parent_key() != Some(key) {
            return Err(invalid("child points at another parent"));
        }
        let expected_prev = ix.checked_sub(1).map(|prev| &children[prev]);
        let expected_next = children.get(ix + 1);
        if child.prev_sibling_key() != expected_prev || child.next_sibling_key() != expected_next {
            return Err(invalid("sibling links disagree with child order"));
        }
    }

    if let Some(prev_key) = block.prev_sibling_key() {
        let prev = lookup(block_map, prev_key)?;
        if prev.next_sibling_key() != Some(key) || prev.parent_key() != block.parent_key() {
            return Err(invalid("previous sibling does not link back"));
        }
    }
    if let Some(next_key) = block.next_sibling_key() {
        let next = lookup(block_map, next_key)?;
        if next.prev_sibling_key() != Some(key) || next.parent_key() != block.parent_key() {
            return Err(invalid("next sibling does not link back"));
        }
    }
    Ok(())
}

fn walk(
    block: &ContentBlock,
    block_map: &BlockMap,
    visited: &mut HashSet<BlockKey>,
    order: &mut Vec<BlockKey>,
) -> Result<()> {
    if !visited.insert(block.key().clone()) {
        return Err(DraftError::InvalidTree(format!(
            "block {} is reachable twice",
            block.key()
        )));
    }
    order.push(block.key().clone());
    for child_key in block.child_keys().unwrap_or_default() {
        walk(lookup(block_map, child_key)?, block_map, visited, order)?;
    }
    Ok(())
}

/// Recomputes parent, child and sibling links after blocks were inserted into
/// or dropped from a tree document.
///
/// A block whose parent disappeared is attached to its nearest surviving
/// ancestor, found by walking parent links through `previous` (the map the
/// edit started from). Children and siblings follow document order. Blocks
/// whose links are unchanged keep their identity.
pub fn relink(previous: &BlockMap, next: &BlockMap) -> BlockMap {
    if next.first().is_none_or(|block| !block.is_tree()) {
        return next.clone();
    }

    let mut parents: HashMap<BlockKey, Option<BlockKey>> = HashMap::new();
    let mut children: HashMap<Option<BlockKey>, Vec<BlockKey>> = HashMap::new();
    let mut seen: HashSet<&BlockKey> = HashSet::new();

    for block in next.iter() {
        let mut parent = block.parent_key().cloned();
        // Bounded so a cyclic parent chain in a malformed document ends as a root.
        let mut budget = previous.len() + next.len();
        while let Some(candidate) = parent.take() {
            if seen.contains(&candidate) {
                parent = Some(candidate);
                break;
            }
            if budget == 0 {
                break;
            }
            budget -= 1;
            parent = previous
                .get(&candidate)
                .or_else(|| next.get(&candidate))
                .and_then(|ancestor| ancestor.parent_key().cloned());
        }
        seen.insert(block.key());
        parents.insert(block.key().clone(), parent.clone());
        children.entry(parent).or_default().push(block.key().clone());
    }

    let mut repaired = 0usize;
    let map = next.map_blocks(|block| {
        let parent = parents.get(block.key()).cloned().flatten();
        let siblings = children.get(&parent).map(Vec::as_slice).unwrap_or_default();
        let position = siblings.iter().position(|key| key == block.key());
        let links = TreeLinks {
            children: children
                .get(&Some(block.key().clone()))
                .cloned()
                .unwrap_or_default(),
            parent,
            prev_sibling: position
                .and_then(|ix| ix.checked_sub(1))
                .map(|ix| siblings[ix].clone()),
            next_sibling: position.and_then(|ix| siblings.get(ix + 1)).cloned(),
        };
        if block.tree_links() == Some(&links) {
            return None;
        }
        repaired += 1;
        Some((**block).clone().with_variant(BlockVariant::Tree(links)))
    });
    if repaired > 0 {
        tracing::trace!(repaired, "relinked tree blocks");
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(
        key: &str,
        parent: Option<&str>,
        children: &[&str],
        prev: Option<&str>,
        next: Option<&str>,
    ) -> ContentBlock {
        ContentBlock::new(key, "").with_tree_links(TreeLinks {
            children: children.iter().map(|s| s.to_string()).collect(),
            parent: parent.map(str::to_string),
            prev_sibling: prev.map(str::to_string),
            next_sibling: next.map(str::to_string),
        })
    }

    fn forest() -> BlockMap {
        [
            node("a", None, &["b", "c"], None, Some("d")),
            node("b", Some("a"), &[], None, Some("c")),
            node("c", Some("a"), &[], Some("b"), None),
            node("d", None, &[], Some("a"), None),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn valid_forest_passes() {
        assert!(is_valid_tree(&forest()));
    }

    #[test]
    fn broken_back_reference_fails() {
        let map = forest()
            .replace(Arc::new(node("c", Some("d"), &[], Some("b"), None)))
            .expect("replace");
        assert!(!is_valid_tree(&map));
    }

    #[test]
    fn delimiter_skips_descendants() {
        let map = forest();
        let c = map.get("c").expect("c");
        assert_eq!(next_delimiter_block_key(c, &map), Some("d".to_string()));
        let d = map.get("d").expect("d");
        assert_eq!(next_delimiter_block_key(d, &map), None);
    }

    #[test]
    fn relink_attaches_orphans_to_surviving_ancestor() {
        let previous = forest();
        let next = previous.retain(|block| block.key() != "b");
        let repaired = relink(&previous, &next);
        assert!(is_valid_tree(&repaired));
        assert!(previous.shares_block(&repaired, "d"));
        let a = repaired.get("a").expect("a");
        assert_eq!(a.child_keys(), Some(&["c".to_string()][..]));
    }
}
