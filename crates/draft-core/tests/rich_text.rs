use draft_core::modifier;
use draft_core::rich_text;
use draft_core::{ChangeType, ContentState, EditorState, EntityMutability, SelectionState};

fn state_with_types(text: &str, types: &[&str]) -> EditorState {
    let mut content = ContentState::create_from_text(text);
    let keys: Vec<String> = content.block_map().keys().cloned().collect();
    for (key, block_type) in keys.iter().zip(types) {
        let cursor = SelectionState::collapsed(key.clone(), 0);
        content = modifier::set_block_type(&content, &cursor, block_type).expect("type");
    }
    EditorState::create_with_content(content, None)
}

fn keys(state: &EditorState) -> Vec<String> {
    state.current_content().block_map().keys().cloned().collect()
}

#[test]
fn collapsed_toggle_sets_the_style_override() {
    let state = EditorState::create_with_text("abc", None);
    let bold = rich_text::toggle_inline_style(&state, "BOLD").expect("toggle");
    assert!(bold.current_inline_style().has("BOLD"));
    assert!(bold.current_content().ptr_eq(state.current_content()));

    let plain = rich_text::toggle_inline_style(&bold, "BOLD").expect("toggle");
    assert!(!plain.current_inline_style().has("BOLD"));
}

#[test]
fn ranged_toggle_applies_then_removes() {
    let state = EditorState::create_with_text("abc", None);
    let key = keys(&state)[0].clone();
    let state = state.force_selection(SelectionState::range(key.clone(), 0, key.clone(), 2));

    let styled = rich_text::toggle_inline_style(&state, "ITALIC").expect("apply");
    assert!(styled.current_content().first_block().inline_style_at(1).has("ITALIC"));
    assert_eq!(styled.last_change_type(), Some(ChangeType::ChangeInlineStyle));

    let unstyled = rich_text::toggle_inline_style(&styled, "ITALIC").expect("remove");
    assert!(!unstyled.current_content().first_block().inline_style_at(1).has("ITALIC"));
}

#[test]
fn block_type_toggles_back_to_unstyled() {
    let state = EditorState::create_with_text("title", None);
    let header = rich_text::toggle_block_type(&state, "header-one").expect("header");
    assert_eq!(rich_text::current_block_type(&header), "header-one");
    let back = rich_text::toggle_block_type(&header, "header-one").expect("unstyled");
    assert_eq!(rich_text::current_block_type(&back), "unstyled");
}

#[test]
fn triple_click_selection_spares_the_next_block() {
    let state = EditorState::create_with_text("one\ntwo", None);
    let k = keys(&state);
    let state = state.force_selection(SelectionState::range(k[0].clone(), 0, k[1].clone(), 0));
    let next = rich_text::toggle_block_type(&state, "blockquote").expect("toggle");
    let content = next.current_content();
    assert_eq!(content.first_block().block_type(), "blockquote");
    assert_eq!(content.last_block().block_type(), "unstyled");
}

#[test]
fn atomic_blocks_block_type_toggles() {
    let state = state_with_types("one\ntwo", &["unstyled", "atomic"]);
    let k = keys(&state);
    let state = state.force_selection(SelectionState::range(k[0].clone(), 0, k[1].clone(), 2));
    let next = rich_text::toggle_block_type(&state, "blockquote").expect("toggle");
    assert!(next.current_content().ptr_eq(state.current_content()));
}

#[test]
fn toggle_code_depends_on_the_selection() {
    let state = EditorState::create_with_text("let x", None);
    let key = keys(&state)[0].clone();

    let block = rich_text::toggle_code(&state).expect("code block");
    assert_eq!(rich_text::current_block_type(&block), "code-block");

    let ranged = state.force_selection(SelectionState::range(key.clone(), 0, key, 3));
    let inline = rich_text::toggle_code(&ranged).expect("inline code");
    assert!(inline.current_content().first_block().inline_style_at(0).has("CODE"));
    assert_eq!(rich_text::current_block_type(&inline), "unstyled");
}

#[test]
fn backspace_at_block_start_resets_its_style() {
    let state = state_with_types("item", &["unordered-list-item"]);
    let next = rich_text::on_backspace(&state).expect("backspace").expect("handled");
    assert_eq!(rich_text::current_block_type(&next), "unstyled");
    assert_eq!(next.last_change_type(), Some(ChangeType::ChangeBlockType));

    let plain = EditorState::create_with_text("plain", None);
    assert!(rich_text::on_backspace(&plain).expect("backspace").is_none());
}

#[test]
fn backspace_keeps_code_listings_together() {
    let state = state_with_types("a\nb", &["code-block", "code-block"]);
    let k = keys(&state);
    let state = state.force_selection(SelectionState::collapsed(k[1].clone(), 0));
    assert!(rich_text::try_to_remove_block_style(&state).expect("try").is_none());
}

#[test]
fn backspace_removes_a_preceding_atomic_block() {
    let state = state_with_types("media\ntext", &["atomic", "unstyled"]);
    let k = keys(&state);
    let state = state.force_selection(SelectionState::collapsed(k[1].clone(), 0));
    let next = rich_text::on_backspace(&state).expect("backspace").expect("handled");
    assert_eq!(keys(&next), [k[1].clone()]);
    assert_eq!(next.current_content().plain_text(None), "text");
}

#[test]
fn delete_removes_a_following_atomic_block() {
    let state = state_with_types("text\nmedia", &["unstyled", "atomic"]);
    let k = keys(&state);
    let state = state.force_selection(SelectionState::collapsed(k[0].clone(), 4));
    let next = rich_text::on_delete(&state).expect("delete").expect("handled");
    assert_eq!(next.current_content().plain_text(None), "text");
    assert_eq!(next.current_content().block_map().len(), 1);

    let mid_text = state.force_selection(SelectionState::collapsed(k[0].clone(), 2));
    assert!(rich_text::on_delete(&mid_text).expect("delete").is_none());
}

#[test]
fn tab_adjusts_list_depth_within_bounds() {
    let state = state_with_types("item", &["ordered-list-item"]);
    let deeper = rich_text::on_tab(&state, false, 1).expect("tab");
    assert_eq!(deeper.current_content().first_block().depth(), 1);

    let capped = rich_text::on_tab(&deeper, false, 1).expect("tab");
    assert!(capped.current_content().ptr_eq(deeper.current_content()));

    let shallower = rich_text::on_tab(&deeper, true, 1).expect("shift tab");
    assert_eq!(shallower.current_content().first_block().depth(), 0);

    let plain = EditorState::create_with_text("plain", None);
    let unchanged = rich_text::on_tab(&plain, false, 4).expect("tab");
    assert!(unchanged.current_content().ptr_eq(plain.current_content()));
}

#[test]
fn links_are_detected_in_the_selection() {
    let state = EditorState::create_with_text("see docs here", None);
    let key = keys(&state)[0].clone();
    let content = state.current_content().create_entity(
        rich_text::LINK,
        EntityMutability::Mutable,
        rich_text::link_data_for_url("https://docs.example"),
    );
    let entity = content.last_created_entity_key().cloned().expect("entity");
    let state = state.push(content, ChangeType::ApplyEntity, false);
    let word = SelectionState::range(key.clone(), 4, key.clone(), 8);
    let linked = rich_text::toggle_link(&state, &word, Some(&entity)).expect("link");

    let over_link = linked.force_selection(SelectionState::range(key.clone(), 3, key.clone(), 5));
    assert!(rich_text::current_block_contains_link(&over_link));
    let outside = linked.force_selection(SelectionState::range(key.clone(), 9, key.clone(), 12));
    assert!(!rich_text::current_block_contains_link(&outside));

    let whole = SelectionState::range(key.clone(), 0, key, 13);
    let unlinked = rich_text::toggle_link(&linked, &whole, None).expect("unlink");
    assert!(!rich_text::current_block_contains_link(&unlinked.force_selection(whole)));
}

#[test]
fn soft_newline_stays_in_the_block() {
    let state = EditorState::create_with_text("ab", None);
    let key = keys(&state)[0].clone();
    let state = state.force_selection(SelectionState::collapsed(key.clone(), 1));
    let next = rich_text::insert_soft_newline(&state).expect("newline");
    assert_eq!(next.current_content().block_map().len(), 1);
    assert_eq!(next.current_content().first_block().text(), "a\nb");
    assert_eq!(next.selection().anchor_offset, 2);
    assert!(next.must_force_selection());
}

#[test]
fn key_commands_dispatch_by_name() {
    let state = EditorState::create_with_text("abc", None);
    let bold = rich_text::handle_key_command(&state, "bold").expect("bold").expect("handled");
    assert!(bold.current_inline_style().has("BOLD"));
    assert!(rich_text::handle_key_command(&state, "backspace").expect("backspace").is_none());
    assert!(rich_text::handle_key_command(&state, "nonsense").expect("unknown").is_none());
}
