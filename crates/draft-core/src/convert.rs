use std::collections::{BTreeSet, HashMap, HashSet};

use crate::block::{BlockKey, CharacterList, ContentBlock, TreeLinks, UNSTYLED};
use crate::block_map::BlockMap;
use crate::character::{CharacterMetadata, InlineStyle};
use crate::config::ConvertOptions;
use crate::content::ContentState;
use crate::entity::{EntityKey, EntityMap};
use crate::error::{DraftError, Result};
use crate::key::generate_random_key;
use crate::ranges::find_ranges;
use crate::raw::{
    RawDraftContentBlock, RawDraftContentState, RawDraftEntity, RawEntityRange, RawInlineStyleRange,
};
use crate::tree::validate_tree;
use crate::tree_adapter::{from_raw_state_to_raw_tree_state, from_raw_tree_state_to_raw_state};

/// Encodes `content`. Entities get sequential storage indices in the order
/// they are first referenced; tree documents nest children under parents.
pub fn convert_to_raw(content: &ContentState) -> Result<RawDraftContentState> {
    let mut storage: HashMap<EntityKey, usize> = HashMap::new();
    let mut ordered: Vec<EntityKey> = Vec::new();
    for block in content.block_map().iter() {
        block.find_entity_ranges(
            |c| c.entity().is_some(),
            |start, _| {
                let Some(key) = block.entity_at(start) else {
                    return;
                };
                if !storage.contains_key(key) {
                    storage.insert(key.clone(), ordered.len());
                    ordered.push(key.clone());
                }
            },
        );
    }

    let blocks = if content.is_tree() {
        let block_map = content.block_map();
        let mut roots = Vec::new();
        let mut root = Some(content.first_block().key().clone());
        while let Some(key) = root {
            let block = content.block(&key)?;
            roots.push(encode_node(block, block_map, &storage)?);
            root = block.next_sibling_key().cloned();
        }
        roots
    } else {
        content
            .block_map()
            .iter()
            .map(|block| encode_block(block, &storage))
            .collect()
    };

    let mut entity_map = std::collections::BTreeMap::new();
    for (index, key) in ordered.iter().enumerate() {
        let entity = content.entity(key)?;
        entity_map.insert(
            index.to_string(),
            RawDraftEntity {
                entity_type: entity.entity_type().to_string(),
                mutability: entity.mutability(),
                data: entity.data().clone(),
            },
        );
    }

    Ok(RawDraftContentState { blocks, entity_map })
}

fn encode_node(
    block: &ContentBlock,
    block_map: &BlockMap,
    storage: &HashMap<EntityKey, usize>,
) -> Result<RawDraftContentBlock> {
    let children = block
        .child_keys()
        .unwrap_or_default()
        .iter()
        .map(|key| {
            let child = block_map
                .get(key)
                .ok_or_else(|| DraftError::UnknownBlock(key.clone()))?;
            encode_node(child, block_map, storage)
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(encode_block(block, storage).with_children(children))
}

fn encode_block(block: &ContentBlock, storage: &HashMap<EntityKey, usize>) -> RawDraftContentBlock {
    let mut entity_ranges = Vec::new();
    block.find_entity_ranges(
        |c| c.entity().is_some(),
        |start, end| {
            if let Some(&key) = block.entity_at(start).and_then(|k| storage.get(k)) {
                entity_ranges.push(RawEntityRange {
                    offset: start,
                    length: end - start,
                    key,
                });
            }
        },
    );

    RawDraftContentBlock {
        key: Some(block.key().clone()),
        block_type: Some(block.block_type().to_string()),
        text: block.text().to_string(),
        depth: block.depth(),
        inline_style_ranges: encode_inline_style_ranges(block.characters()),
        entity_ranges,
        data: block.data().clone(),
        children: None,
    }
}

/// One run per style and maximal stretch, styles in order of first use.
fn encode_inline_style_ranges(characters: &CharacterList) -> Vec<RawInlineStyleRange> {
    let mut seen = HashSet::new();
    let mut styles: Vec<&str> = Vec::new();
    for character in characters.iter() {
        for style in character.style().iter() {
            if seen.insert(style) {
                styles.push(style);
            }
        }
    }

    let mut ranges = Vec::new();
    for style in styles {
        find_ranges(
            characters.iter().map(|c| c.has_style(style)),
            |a, b| a == b,
            |has| *has,
            |start, end| {
                ranges.push(RawInlineStyleRange {
                    offset: start,
                    length: end - start,
                    style: style.to_string(),
                })
            },
        );
    }
    ranges
}

pub fn convert_from_raw(raw: &RawDraftContentState) -> Result<ContentState> {
    convert_from_raw_with(raw, ConvertOptions::default())
}

/// Decodes `raw`. Entities are created first under fresh keys, then blocks
/// are decoded with entity indices translated through those keys. With tree
/// support the document is made of tree blocks and must form a valid forest;
/// without it nested input is flattened.
pub fn convert_from_raw_with(
    raw: &RawDraftContentState,
    options: ConvertOptions,
) -> Result<ContentState> {
    let mut entity_map = EntityMap::new();
    let mut entity_keys: HashMap<usize, EntityKey> = HashMap::new();
    for (raw_key, entity) in &raw.entity_map {
        let index = raw_key.parse::<usize>().map_err(|_| {
            DraftError::InvalidRawState(format!("entity map key {raw_key:?} is not an index"))
        })?;
        let key = entity_map.create(
            entity.entity_type.clone(),
            entity.mutability,
            entity.data.clone(),
        );
        entity_keys.insert(index, key);
    }

    let is_tree_raw = raw.is_tree();
    let blocks = if options.tree_data_support {
        let mut nodes = if is_tree_raw {
            raw.blocks.clone()
        } else {
            from_raw_state_to_raw_tree_state(raw).blocks
        };
        fill_missing_keys(&mut nodes);
        let mut out = Vec::new();
        decode_nodes(&nodes, None, &entity_keys, &mut out)?;
        if out.is_empty() {
            let root = ContentBlock::new(generate_random_key(), "");
            out.push(root.with_tree_links(TreeLinks::default()));
        }
        out
    } else {
        let flat = if is_tree_raw {
            from_raw_tree_state_to_raw_state(raw)?.blocks
        } else {
            raw.blocks.clone()
        };
        flat.iter()
            .map(|block| {
                let key = block.key.clone().unwrap_or_else(generate_random_key);
                decode_block(block, key, &entity_keys)
            })
            .collect()
    };

    let mut keys = HashSet::new();
    if let Some(duplicate) = blocks.iter().find(|block| !keys.insert(block.key().clone())) {
        return Err(DraftError::InvalidRawState(format!(
            "duplicate block key {}",
            duplicate.key()
        )));
    }

    tracing::debug!(
        blocks = blocks.len(),
        entities = entity_map.len(),
        tree = options.tree_data_support,
        "decoded raw content"
    );
    let content = ContentState::create_from_block_array(blocks, entity_map);
    if options.tree_data_support {
        validate_tree(content.block_map())?;
    }
    Ok(content)
}

fn fill_missing_keys(blocks: &mut [RawDraftContentBlock]) {
    for block in blocks {
        if block.key.is_none() {
            block.key = Some(generate_random_key());
        }
        if let Some(children) = block.children.as_mut() {
            fill_missing_keys(children);
        }
    }
}

fn decode_nodes(
    blocks: &[RawDraftContentBlock],
    parent: Option<&BlockKey>,
    entity_keys: &HashMap<usize, EntityKey>,
    out: &mut Vec<ContentBlock>,
) -> Result<()> {
    let keys: Vec<BlockKey> = blocks.iter().map(|b| b.key.clone().unwrap_or_default()).collect();
    for (ix, block) in blocks.iter().enumerate() {
        let key = keys[ix].clone();
        let Some(children) = block.children.as_ref() else {
            return Err(DraftError::InvalidTreeBlock(key));
        };
        let links = TreeLinks {
            children: children.iter().map(|c| c.key.clone().unwrap_or_default()).collect(),
            parent: parent.cloned(),
            prev_sibling: ix.checked_sub(1).map(|prev| keys[prev].clone()),
            next_sibling: keys.get(ix + 1).cloned(),
        };
        out.push(decode_block(block, key.clone(), entity_keys).with_tree_links(links));
        decode_nodes(children, Some(&key), entity_keys, out)?;
    }
    Ok(())
}

fn decode_block(
    block: &RawDraftContentBlock,
    key: BlockKey,
    entity_keys: &HashMap<usize, EntityKey>,
) -> ContentBlock {
    let block_type = block
        .block_type
        .as_deref()
        .filter(|t| !t.is_empty())
        .unwrap_or(UNSTYLED);
    let characters = decode_character_list(block, entity_keys);
    ContentBlock::new(key, block.text.clone())
        .with_type(block_type)
        .with_depth(block.depth)
        .with_data(block.data.clone())
        .with_characters(characters)
}

fn decode_character_list(
    block: &RawDraftContentBlock,
    entity_keys: &HashMap<usize, EntityKey>,
) -> CharacterList {
    let len = block.text.chars().count();
    let mut styles: Vec<BTreeSet<&str>> = vec![BTreeSet::new(); len];
    let mut entities: Vec<Option<&EntityKey>> = vec![None; len];

    for range in &block.inline_style_ranges {
        let end = range.offset.saturating_add(range.length).min(len);
        for slot in styles.iter_mut().take(end).skip(range.offset) {
            slot.insert(range.style.as_str());
        }
    }
    for range in &block.entity_ranges {
        let Some(key) = entity_keys.get(&range.key) else {
            continue;
        };
        let end = range.offset.saturating_add(range.length).min(len);
        for slot in entities.iter_mut().take(end).skip(range.offset) {
            *slot = Some(key);
        }
    }

    let mut previous: Option<(&BTreeSet<&str>, Option<&EntityKey>, CharacterMetadata)> = None;
    let mut characters = CharacterList::new();
    for (style, entity) in styles.iter().zip(entities.iter().copied()) {
        let metadata = match &previous {
            Some((prev_style, prev_entity, metadata))
                if *prev_style == style && *prev_entity == entity =>
            {
                metadata.clone()
            }
            _ => CharacterMetadata::create(InlineStyle::of(style.iter().copied()), entity.cloned()),
        };
        characters.push_back(metadata.clone());
        previous = Some((style, entity, metadata));
    }
    characters
}
