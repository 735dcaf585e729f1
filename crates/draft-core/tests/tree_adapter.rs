use draft_core::tree::{is_valid_tree, next_delimiter_block_key};
use draft_core::tree_adapter::{from_raw_state_to_raw_tree_state, from_raw_tree_state_to_raw_state};
use draft_core::{
    ConvertOptions, DraftError, RawDraftContentState, convert_from_raw, convert_from_raw_with,
};
use serde_json::json;

fn tree_document() -> RawDraftContentState {
    serde_json::from_value(json!({
        "blocks": [{
            "key": "A",
            "type": "unstyled",
            "text": "",
            "children": [
                {
                    "key": "B",
                    "type": "unstyled",
                    "text": "",
                    "children": [
                        { "key": "C", "type": "unstyled", "text": "left block", "children": [] },
                        { "key": "D", "type": "unstyled", "text": "right block", "children": [] }
                    ]
                },
                {
                    "key": "E",
                    "type": "header-one",
                    "text": "This is a tree based document!",
                    "children": []
                }
            ]
        }],
        "entityMap": {}
    }))
    .expect("raw tree")
}

fn ordered_list(depths: &[usize]) -> RawDraftContentState {
    let blocks: Vec<_> = depths
        .iter()
        .enumerate()
        .map(|(ix, depth)| {
            json!({
                "key": format!("L{ix}"),
                "type": "ordered-list-item",
                "text": format!("item {ix}"),
                "depth": depth
            })
        })
        .collect();
    serde_json::from_value(json!({ "blocks": blocks, "entityMap": {} })).expect("raw list")
}

#[test]
fn flattening_keeps_only_leaf_blocks_in_order() {
    let flat = from_raw_tree_state_to_raw_state(&tree_document()).expect("flatten");
    let texts: Vec<&str> = flat.blocks.iter().map(|b| b.text.as_str()).collect();
    assert_eq!(texts, ["left block", "right block", "This is a tree based document!"]);
    assert!(flat.blocks.iter().all(|b| b.depth == 0));
}

#[test]
fn tree_input_without_tree_support_decodes_flat() {
    let content = convert_from_raw(&tree_document()).expect("decode");
    assert!(!content.is_tree());
    let keys: Vec<&str> = content.block_map().keys().map(String::as_str).collect();
    assert_eq!(keys, ["C", "D", "E"]);
    assert_eq!(content.last_block().block_type(), "header-one");
}

#[test]
fn flattening_list_nesting_becomes_depth() {
    let raw: RawDraftContentState = serde_json::from_value(json!({
        "blocks": [{
            "key": "P",
            "type": "unordered-list-item",
            "text": "",
            "children": [
                { "key": "Q", "type": "unordered-list-item", "text": "one", "children": [] },
                { "key": "R", "type": "unstyled", "text": "two", "children": [] }
            ]
        }],
        "entityMap": {}
    }))
    .expect("raw");
    let flat = from_raw_tree_state_to_raw_state(&raw).expect("flatten");
    let shape: Vec<(&str, usize)> = flat
        .blocks
        .iter()
        .map(|b| (b.key.as_deref().unwrap_or_default(), b.depth))
        .collect();
    assert_eq!(shape, [("Q", 1), ("R", 0)]);
}

#[test]
fn tree_nodes_need_a_children_list() {
    let raw: RawDraftContentState = serde_json::from_value(json!({
        "blocks": [{
            "key": "A",
            "text": "",
            "children": [{ "key": "B", "text": "leaf" }]
        }],
        "entityMap": {}
    }))
    .expect("raw");
    assert!(matches!(
        from_raw_tree_state_to_raw_state(&raw),
        Err(DraftError::InvalidTreeBlock(key)) if key == "B"
    ));
    assert!(matches!(
        convert_from_raw_with(&raw, ConvertOptions { tree_data_support: true }),
        Err(DraftError::InvalidTreeBlock(key)) if key == "B"
    ));
}

#[test]
fn list_depths_nest_under_synthetic_parents() {
    let tree = from_raw_state_to_raw_tree_state(&ordered_list(&[0, 1, 2]));
    assert_eq!(tree.blocks.len(), 2);
    assert_eq!(tree.blocks[0].key.as_deref(), Some("L0"));

    let outer = &tree.blocks[1];
    assert_eq!(outer.block_type.as_deref(), Some("ordered-list-item"));
    assert_eq!(outer.depth, 0);
    assert!(outer.text.is_empty());
    let outer_children = outer.children.as_ref().expect("children");
    assert_eq!(outer_children.len(), 2);
    assert_eq!(outer_children[0].key.as_deref(), Some("L1"));

    let inner = &outer_children[1];
    assert_eq!(inner.block_type.as_deref(), Some("ordered-list-item"));
    assert_eq!(inner.depth, 1);
    let inner_children = inner.children.as_ref().expect("children");
    assert_eq!(inner_children.len(), 1);
    assert_eq!(inner_children[0].key.as_deref(), Some("L2"));
    assert_eq!(inner_children[0].depth, 2);
}

#[test]
fn shallower_items_return_to_their_level() {
    let tree = from_raw_state_to_raw_tree_state(&ordered_list(&[0, 1, 1, 0]));
    let roots: Vec<Option<&str>> = tree.blocks.iter().map(|b| b.key.as_deref()).collect();
    assert_eq!(roots.len(), 3);
    assert_eq!(roots[0], Some("L0"));
    assert_eq!(roots[2], Some("L3"));
    let children = tree.blocks[1].children.as_ref().expect("children");
    let child_keys: Vec<Option<&str>> = children.iter().map(|b| b.key.as_deref()).collect();
    assert_eq!(child_keys, [Some("L1"), Some("L2")]);
}

#[test]
fn flat_lists_decode_into_a_valid_forest() {
    let options = ConvertOptions { tree_data_support: true };
    let content = convert_from_raw_with(&ordered_list(&[0, 1, 2]), options).expect("decode");
    assert!(content.is_tree());
    assert!(is_valid_tree(content.block_map()));
    assert_eq!(content.block_map().len(), 5);

    let leaf = content.block("L2").expect("leaf");
    let parent = content.block(leaf.parent_key().expect("parent")).expect("parent block");
    assert_eq!(parent.block_type(), "ordered-list-item");
    assert_eq!(parent.depth(), 1);
    let grandparent =
        content.block(parent.parent_key().expect("grandparent")).expect("grandparent block");
    assert_eq!(grandparent.depth(), 0);
    assert_eq!(grandparent.parent_key(), None);
    assert_eq!(grandparent.prev_sibling_key().map(String::as_str), Some("L0"));

    assert_eq!(
        next_delimiter_block_key(content.block("L2").expect("L2"), content.block_map()),
        None
    );
}

#[test]
fn next_delimiter_skips_descendants() {
    let options = ConvertOptions { tree_data_support: true };
    let content = convert_from_raw_with(&tree_document(), options).expect("decode");
    let block_map = content.block_map();
    assert_eq!(
        next_delimiter_block_key(content.block("B").expect("B"), block_map).as_deref(),
        Some("E")
    );
    assert_eq!(
        next_delimiter_block_key(content.block("D").expect("D"), block_map).as_deref(),
        Some("E")
    );
    assert_eq!(next_delimiter_block_key(content.block("A").expect("A"), block_map), None);
}
