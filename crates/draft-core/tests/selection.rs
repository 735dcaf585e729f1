use draft_core::SelectionState;

#[test]
fn edges_inside_a_single_block() {
    let selection = SelectionState::range("a", 2, "a", 6);
    assert!(selection.has_edge_within("a", 0, 2));
    assert!(selection.has_edge_within("a", 5, 9));
    assert!(!selection.has_edge_within("a", 3, 5));
    assert!(!selection.has_edge_within("b", 0, 10));
}

#[test]
fn only_the_endpoint_in_the_block_counts() {
    let selection = SelectionState::range("a", 3, "c", 1);
    assert!(selection.has_edge_within("a", 3, 3));
    assert!(!selection.has_edge_within("a", 0, 2));
    assert!(selection.has_edge_within("c", 0, 1));
    assert!(!selection.has_edge_within("c", 2, 8));
}

#[test]
fn blocks_strictly_between_the_edges_have_none() {
    let selection = SelectionState::range("a", 3, "c", 1);
    assert!(!selection.has_edge_within("b", 0, 100));
}

#[test]
fn backward_selections_check_the_same_edges() {
    let selection = SelectionState::range("c", 1, "a", 3).with_is_backward(true);
    assert_eq!(selection.start_key(), "a");
    assert!(selection.has_edge_within("a", 3, 4));
    assert!(selection.has_edge_within("c", 1, 1));
    assert!(!selection.has_edge_within("c", 2, 4));
}
