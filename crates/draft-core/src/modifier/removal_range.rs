use crate::block::{ContentBlock, slice_chars};
use crate::change::RemovalDirection;
use crate::entity::{EntityKey, EntityMap, EntityMutability};
use crate::error::{DraftError, Result};
use crate::selection::SelectionState;

/// Widens or narrows `selection` according to the mutability of the entities
/// found at its edges.
///
/// Immutable entities are removed whole. Segmented entities lose the
/// whitespace-delimited segments the selection overlaps, taking the
/// separating space in `direction`. Mutable entities leave the range as is.
pub fn character_removal_range(
    entity_map: &EntityMap,
    start_block: &ContentBlock,
    end_block: &ContentBlock,
    selection: &SelectionState,
    direction: RemovalDirection,
) -> Result<SelectionState> {
    let start = selection.start_offset();
    let end = selection.end_offset();
    let start_entity = start_block.entity_at(start);
    let end_entity = end.checked_sub(1).and_then(|ix| end_block.entity_at(ix));

    let forward = selection.to_forward();
    match (start_entity, end_entity) {
        (None, None) => Ok(selection.clone()),
        (Some(s), Some(e)) if s == e => entity_removal_range(
            entity_map,
            start_block,
            &forward,
            direction,
            s,
            EntityEdge::Both,
        ),
        (Some(s), Some(e)) => {
            let from_start = entity_removal_range(
                entity_map,
                start_block,
                &forward,
                direction,
                s,
                EntityEdge::Start,
            )?;
            let from_end = entity_removal_range(
                entity_map,
                end_block,
                &forward,
                direction,
                e,
                EntityEdge::End,
            )?;
            Ok(SelectionState {
                anchor_offset: from_start.anchor_offset,
                focus_offset: from_end.focus_offset,
                is_backward: false,
                ..forward
            })
        }
        (Some(s), None) => {
            let from_start = entity_removal_range(
                entity_map,
                start_block,
                &forward,
                direction,
                s,
                EntityEdge::Start,
            )?;
            Ok(SelectionState {
                anchor_offset: from_start.start_offset(),
                is_backward: false,
                ..forward
            })
        }
        (None, Some(e)) => {
            let from_end = entity_removal_range(
                entity_map,
                end_block,
                &forward,
                direction,
                e,
                EntityEdge::End,
            )?;
            Ok(SelectionState {
                focus_offset: from_end.end_offset(),
                is_backward: false,
                ..forward
            })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntityEdge {
    /// The whole selection lies inside the entity.
    Both,
    Start,
    End,
}

fn entity_removal_range(
    entity_map: &EntityMap,
    block: &ContentBlock,
    selection: &SelectionState,
    direction: RemovalDirection,
    entity_key: &EntityKey,
    edge: EntityEdge,
) -> Result<SelectionState> {
    let mut start = selection.start_offset();
    let mut end = selection.end_offset();
    let mutability = entity_map.get(entity_key)?.mutability();
    if mutability == EntityMutability::Mutable {
        return Ok(selection.clone());
    }

    let side = if edge == EntityEdge::End { end } else { start };
    let ranges: Vec<(usize, usize)> = ranges_for_entity(block, entity_key)
        .into_iter()
        .filter(|&(range_start, range_end)| side <= range_end && side >= range_start)
        .collect();
    let &[(entity_start, entity_end)] = ranges.as_slice() else {
        return Err(DraftError::AmbiguousEntityRange {
            entity: entity_key.clone(),
            offset: side,
            found: ranges.len(),
        });
    };

    if mutability == EntityMutability::Immutable {
        return Ok(SelectionState {
            anchor_offset: entity_start,
            focus_offset: entity_end,
            is_backward: false,
            ..selection.clone()
        });
    }

    match edge {
        EntityEdge::Both => {}
        EntityEdge::Start => end = entity_end,
        EntityEdge::End => start = entity_start,
    }
    let text = slice_chars(block.text(), entity_start, entity_end);
    let (removal_start, removal_end) =
        segment_removal_range(start, end, text, entity_start, direction);
    Ok(SelectionState {
        anchor_offset: removal_start,
        focus_offset: removal_end,
        is_backward: false,
        ..selection.clone()
    })
}

fn ranges_for_entity(block: &ContentBlock, entity_key: &EntityKey) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    block.find_entity_ranges(
        |c| c.entity() == Some(entity_key),
        |start, end| ranges.push((start, end)),
    );
    ranges
}

/// Range to delete inside a segmented entity whose text is `text` and which
/// starts at `entity_start`.
///
/// The entity is split on spaces; each space sticks to the segment on the
/// side the removal moves towards. Every segment the selection overlaps is
/// removed. When that leaves the entity half gone, the separating space is
/// taken too so no dangling space remains.
pub(crate) fn segment_removal_range(
    selection_start: usize,
    selection_end: usize,
    text: &str,
    entity_start: usize,
    direction: RemovalDirection,
) -> (usize, usize) {
    let pieces: Vec<&str> = text.split(' ').collect();
    let last = pieces.len().saturating_sub(1);
    let lengths = pieces.iter().enumerate().map(|(ix, piece)| {
        let len = piece.chars().count();
        let with_space = match direction {
            RemovalDirection::Forward => ix > 0,
            RemovalDirection::Backward => ix < last,
        };
        len + usize::from(with_space)
    });

    let mut segment_start = entity_start;
    let mut removal: Option<(usize, usize)> = None;
    for len in lengths {
        let segment_end = segment_start + len;
        if selection_start < segment_end && segment_start < selection_end {
            removal = Some(match removal {
                Some((start, _)) => (start, segment_end),
                None => (segment_start, segment_end),
            });
        } else if removal.is_some() {
            break;
        }
        segment_start = segment_end;
    }

    let Some((mut removal_start, mut removal_end)) = removal else {
        return (selection_start, selection_end);
    };
    let entity_end = entity_start + text.chars().count();
    let at_start = removal_start == entity_start;
    let at_end = removal_end == entity_end;
    if at_start != at_end {
        match direction {
            RemovalDirection::Forward if removal_end != entity_end => removal_end += 1,
            RemovalDirection::Backward if removal_start != entity_start => removal_start -= 1,
            _ => {}
        }
    }
    (removal_start, removal_end)
}
