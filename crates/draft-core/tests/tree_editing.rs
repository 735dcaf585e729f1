use draft_core::modifier::{self, BlockDataMergeBehavior};
use draft_core::tree::is_valid_tree;
use draft_core::{
    ContentState, ConvertOptions, RawDraftContentState, RemovalDirection,
    SelectionState, convert_from_raw_with,
};
use serde_json::json;

fn forest() -> ContentState {
    let raw: RawDraftContentState = serde_json::from_value(json!({
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
                { "key": "E", "type": "header-one", "text": "tree doc", "children": [] }
            ]
        }],
        "entityMap": {}
    }))
    .expect("raw tree");
    convert_from_raw_with(&raw, ConvertOptions { tree_data_support: true }).expect("decode")
}

fn shape(content: &ContentState) -> Vec<(String, String, Option<String>)> {
    content
        .block_map()
        .iter()
        .map(|b| (b.key().clone(), b.text().to_string(), b.parent_key().cloned()))
        .collect()
}

#[test]
fn split_leaf_becomes_a_sibling() {
    let content = forest();
    let split = modifier::split_block(&content, &SelectionState::collapsed("C", 4)).expect("split");
    assert!(is_valid_tree(split.block_map()));

    let new_key = split.selection_after().anchor_key.clone();
    let b = split.block("B").expect("B");
    assert_eq!(
        b.child_keys(),
        Some(&["C".to_string(), new_key.clone(), "D".to_string()][..])
    );
    let lower = split.block(&new_key).expect("lower half");
    assert_eq!(lower.text(), " block");
    assert_eq!(lower.parent_key().map(String::as_str), Some("B"));
    assert_eq!(split.block("C").expect("C").text(), "left");
}

#[test]
fn removal_across_subtrees_keeps_the_forest_valid() {
    let content = forest();
    let removed = modifier::remove_range(
        &content,
        &SelectionState::range("C", 4, "E", 4),
        RemovalDirection::Backward,
    )
    .expect("remove");
    assert!(is_valid_tree(removed.block_map()));
    assert_eq!(
        shape(&removed),
        [
            ("A".to_string(), String::new(), None),
            ("B".to_string(), String::new(), Some("A".to_string())),
            ("C".to_string(), "left doc".to_string(), Some("B".to_string())),
        ]
    );
    assert_eq!(removed.block("A").expect("A").child_keys(), Some(&["B".to_string()][..]));
    assert_eq!(removed.block("C").expect("C").next_sibling_key(), None);
}

#[test]
fn removing_a_subtree_leaves_a_splittable_leaf() {
    let content = forest();
    let removed = modifier::remove_range(
        &content,
        &SelectionState::range("B", 0, "D", 11),
        RemovalDirection::Backward,
    )
    .expect("remove");
    assert!(is_valid_tree(removed.block_map()));

    let key = removed.selection_after().anchor_key.clone();
    let split = modifier::split_block(&removed, &SelectionState::collapsed(key.clone(), 0))
        .expect("split");
    assert!(is_valid_tree(split.block_map()));
    let lower = split.selection_after().anchor_key.clone();
    assert_eq!(
        split.block(&lower).expect("lower").parent_key(),
        split.block(&key).expect("upper").parent_key()
    );
}

#[test]
fn multi_block_paste_lands_beside_the_target() {
    let content = forest();
    let fragment = modifier::get_fragment(&content, &SelectionState::range("C", 5, "D", 5))
        .expect("fragment");
    assert_eq!(fragment.len(), 2);

    let pasted = modifier::replace_with_fragment(
        &content,
        &SelectionState::collapsed("E", 0),
        &fragment,
        BlockDataMergeBehavior::ReplaceWithNewData,
    )
    .expect("paste");
    assert!(is_valid_tree(pasted.block_map()));

    let tail_key = pasted.selection_after().anchor_key.clone();
    let a_children = pasted.block("A").expect("A").child_keys().expect("children").to_vec();
    assert_eq!(a_children, ["B".to_string(), "E".to_string(), tail_key.clone()]);
    assert_eq!(pasted.block("E").expect("E").text(), "block");
    let tail = pasted.block(&tail_key).expect("tail");
    assert_eq!(tail.text(), "righttree doc");
    assert_eq!(tail.parent_key().map(String::as_str), Some("A"));
    assert_eq!(pasted.selection_after().anchor_offset, 5);
}
