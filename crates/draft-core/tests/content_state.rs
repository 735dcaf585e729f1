use draft_core::{
    CharacterMetadata, ContentState, EntityMap, EntityMutability, InlineStyle, SelectionState,
    collect_ranges,
};
use serde_json::json;

#[test]
fn text_is_split_into_unstyled_blocks() {
    let content = ContentState::create_from_text("one\r\ntwo\rthree\nfour");
    let texts: Vec<String> = content
        .blocks_as_array()
        .iter()
        .map(|b| b.text().to_string())
        .collect();
    assert_eq!(texts, ["one", "two", "three", "four"]);
    assert!(content.blocks_as_array().iter().all(|b| b.block_type() == "unstyled"));
    assert_eq!(content.plain_text(None), "one\ntwo\nthree\nfour");
    assert_eq!(content.plain_text(Some("|")), "one|two|three|four");
}

#[test]
fn empty_document_has_one_empty_block() {
    let content = ContentState::create_from_text("");
    assert_eq!(content.block_map().len(), 1);
    assert!(content.first_block().is_empty());
    assert!(!content.has_text());

    let zero_width = ContentState::create_from_text("\u{200B}\u{200B}");
    assert!(!zero_width.has_text());
    assert!(ContentState::create_from_text("a").has_text());
}

#[test]
fn neighbours_follow_document_order() {
    let content = ContentState::create_from_text("a\nb\nc");
    let keys: Vec<String> = content.block_map().keys().cloned().collect();
    assert_eq!(content.key_before(&keys[1]), Some(&keys[0]));
    assert_eq!(content.key_after(&keys[1]), Some(&keys[2]));
    assert_eq!(content.key_before(&keys[0]), None);
    assert_eq!(content.block_after(&keys[2]).map(|b| b.text()), None);
    assert_eq!(content.last_block().text(), "c");
    assert!(content.block("missing").is_err());
}

#[test]
fn selections_start_at_first_block() {
    let content = ContentState::create_from_text("a\nb");
    let expected = SelectionState::create_empty(content.first_block().key().clone());
    assert_eq!(content.selection_before(), &expected);
    assert_eq!(content.selection_after(), &expected);
}

#[test]
fn with_calls_leave_the_original_untouched() {
    let content = ContentState::create_from_text("a");
    let moved = content.with_selection_after(SelectionState::collapsed(
        content.first_block().key().clone(),
        1,
    ));
    assert!(!moved.ptr_eq(&content));
    assert_eq!(content.selection_after().anchor_offset, 0);
    assert_eq!(moved.selection_after().anchor_offset, 1);
    assert!(content.clone().ptr_eq(&content));
}

#[test]
fn entity_helpers_are_per_document() {
    let content = ContentState::create_from_text("link");
    let with_entity = content.create_entity(
        "LINK",
        EntityMutability::Mutable,
        [("url".to_string(), json!("https://a.example"))].into(),
    );
    let key = with_entity.last_created_entity_key().cloned().expect("created");
    assert!(content.entity(&key).is_err());
    assert_eq!(with_entity.entity(&key).expect("entity").entity_type(), "LINK");

    let merged = with_entity
        .merge_entity_data(&key, [("title".to_string(), json!("A"))].into())
        .expect("merge");
    let data = merged.entity(&key).expect("entity").data();
    assert_eq!(data["url"], "https://a.example");
    assert_eq!(data["title"], "A");

    let replaced = merged
        .replace_entity_data(&key, [("url".to_string(), json!("https://b.example"))].into())
        .expect("replace");
    let data = replaced.entity(&key).expect("entity").data();
    assert_eq!(data.len(), 1);
    assert_eq!(data["url"], "https://b.example");
}

#[test]
fn entity_map_never_deduplicates() {
    let mut map = EntityMap::new();
    let a = map.create("LINK", EntityMutability::Mutable, Default::default());
    let b = map.create("LINK", EntityMutability::Mutable, Default::default());
    assert_ne!(a, b);
    assert_eq!(map.len(), 2);
    assert_eq!(map.last_created_key(), Some(&b));
}

#[test]
fn character_metadata_is_interned() {
    let bold = InlineStyle::of(["BOLD"]);
    let a = CharacterMetadata::create(bold.clone(), None);
    let b = CharacterMetadata::create(bold, None);
    assert_eq!(a, b);
    assert_eq!(CharacterMetadata::empty().apply_style("BOLD"), a);
    assert_eq!(a.remove_style("BOLD"), CharacterMetadata::empty());
    assert_ne!(a, CharacterMetadata::create(InlineStyle::of(["ITALIC"]), None));
}

#[test]
fn find_ranges_reports_filtered_runs() {
    let ranges = collect_ranges("aabccc".chars(), |a, b| a == b, |c| *c != 'b');
    assert_eq!(ranges, [(0, 2), (3, 6)]);
    assert!(collect_ranges(Vec::<u8>::new(), |a, b| a == b, |_| true).is_empty());
}

quickcheck::quickcheck! {
    fn runs_cover_the_sequence(items: Vec<u8>) -> bool {
        let ranges = collect_ranges(items.iter(), |a, b| a == b, |_| true);
        let contiguous = ranges.windows(2).all(|w| w[0].1 == w[1].0);
        let starts_at_zero = ranges.first().map(|r| r.0) == Some(0);
        let ends_at_len = ranges.last().map(|r| r.1) == Some(items.len());
        let covers = items.is_empty() && ranges.is_empty() || starts_at_zero && ends_at_len;
        let uniform = ranges.iter().all(|&(s, e)| items[s..e].iter().all(|x| *x == items[s]));
        let maximal = ranges.windows(2).all(|w| items[w[0].0] != items[w[1].0]);
        contiguous && covers && uniform && maximal
    }

    fn rescanning_a_run_is_stable(items: Vec<bool>) -> bool {
        let ranges = collect_ranges(items.iter(), |a, b| a == b, |x| **x);
        ranges.iter().all(|&(s, e)| {
            collect_ranges(items[s..e].iter(), |a, b| a == b, |x| **x) == [(0, e - s)]
        })
    }
}
