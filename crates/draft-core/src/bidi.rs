use serde::{Deserialize, Serialize};

use crate::block::BlockKey;
use crate::content::ContentState;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
}

/// Resolves the base direction of a block's text.
pub trait BidiService: Send + Sync {
    fn direction(&self, text: &str) -> Direction;
}

/// Picks the direction of the first strongly directional character. Text
/// without one is left-to-right.
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstStrongBidi;

impl BidiService for FirstStrongBidi {
    fn direction(&self, text: &str) -> Direction {
        text.chars()
            .find_map(strong_direction)
            .unwrap_or_default()
    }
}

fn strong_direction(c: char) -> Option<Direction> {
    if is_rtl(c) {
        return Some(Direction::Rtl);
    }
    c.is_alphabetic().then_some(Direction::Ltr)
}

fn is_rtl(c: char) -> bool {
    matches!(
        c as u32,
        0x0590..=0x08FF | 0xFB1D..=0xFDFF | 0xFE70..=0xFEFF | 0x10800..=0x10FFF | 0x1E800..=0x1EFFF
    )
}

pub type DirectionMap = imbl::HashMap<BlockKey, Direction>;

pub fn direction_map(service: &dyn BidiService, content: &ContentState) -> DirectionMap {
    content
        .block_map()
        .iter()
        .map(|block| (block.key().clone(), service.direction(block.text())))
        .collect()
}

/// Recomputes directions only for blocks that changed identity since
/// `previous`, dropping entries of removed blocks.
pub fn update_direction_map(
    service: &dyn BidiService,
    previous: &ContentState,
    map: &DirectionMap,
    next: &ContentState,
) -> DirectionMap {
    let mut updated = map.clone();
    for block in next.block_map().iter() {
        if previous.block_map().shares_block(next.block_map(), block.key())
            && updated.contains_key(block.key())
        {
            continue;
        }
        updated.insert(block.key().clone(), service.direction(block.text()));
    }
    if updated.len() != next.block_map().len() {
        updated.retain(|key, _| next.block_map().contains_key(key));
    }
    updated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_strong_character_wins() {
        let bidi = FirstStrongBidi;
        assert_eq!(bidi.direction("hello"), Direction::Ltr);
        assert_eq!(bidi.direction("123 שלום hello"), Direction::Rtl);
        assert_eq!(bidi.direction("  مرحبا"), Direction::Rtl);
        assert_eq!(bidi.direction("42 !"), Direction::Ltr);
    }
}
