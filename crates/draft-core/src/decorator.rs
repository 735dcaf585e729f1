use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::block::{BlockKey, ContentBlock};
use crate::character::CharacterMetadata;
use crate::content::ContentState;
use crate::ranges::find_ranges;

pub type DecorationKey = Arc<str>;

/// One entry per character of a block, `None` where undecorated.
pub type Decorations = Arc<[Option<DecorationKey>]>;

/// Assigns decoration keys to the characters of a block.
///
/// Implementations should return the same `Arc` for a block whose
/// decorations did not change: swapping decorators only regenerates the
/// blocks whose returned sequence differs by identity.
pub trait Decorator: Send + Sync {
    fn decorations(&self, block: &ContentBlock, content: &ContentState) -> Decorations;

    fn component_for_key(&self, key: &str) -> Option<&str>;

    fn props_for_key(&self, key: &str) -> Option<Value>;
}

pub type StrategyFn =
    dyn Fn(&ContentBlock, &mut dyn FnMut(usize, usize), &ContentState) + Send + Sync;

/// A strategy finds ranges in a block; every range it reports is decorated
/// with `component`.
pub struct DecoratorStrategy {
    strategy: Box<StrategyFn>,
    component: String,
    props: Option<Value>,
}

impl DecoratorStrategy {
    pub fn new<F>(component: impl Into<String>, strategy: F) -> Self
    where
        F: Fn(&ContentBlock, &mut dyn FnMut(usize, usize), &ContentState) + Send + Sync + 'static,
    {
        Self {
            strategy: Box::new(strategy),
            component: component.into(),
            props: None,
        }
    }

    pub fn with_props(mut self, props: Value) -> Self {
        self.props = Some(props);
        self
    }
}

impl fmt::Debug for DecoratorStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoratorStrategy")
            .field("component", &self.component)
            .field("props", &self.props)
            .finish_non_exhaustive()
    }
}

/// Runs a list of strategies in order. A range is only decorated when none
/// of its characters was claimed by an earlier strategy (or an earlier range
/// of the same one). Keys read `"<strategy index>.<occurrence>"`.
#[derive(Debug, Default)]
pub struct CompositeDecorator {
    strategies: Vec<DecoratorStrategy>,
}

impl CompositeDecorator {
    pub fn new(strategies: Vec<DecoratorStrategy>) -> Self {
        Self { strategies }
    }

    fn strategy_for_key(&self, key: &str) -> Option<&DecoratorStrategy> {
        let (index, _) = key.split_once('.')?;
        self.strategies.get(index.parse::<usize>().ok()?)
    }
}

impl Decorator for CompositeDecorator {
    fn decorations(&self, block: &ContentBlock, content: &ContentState) -> Decorations {
        let mut decorations: Vec<Option<DecorationKey>> = vec![None; block.len()];

        for (ix, strategy) in self.strategies.iter().enumerate() {
            let mut occurrence = 0usize;
            let mut claim = |start: usize, end: usize| {
                let end = end.min(decorations.len());
                if start >= end || decorations[start..end].iter().any(Option::is_some) {
                    return;
                }
                let key: DecorationKey = Arc::from(format!("{ix}.{occurrence}"));
                for slot in &mut decorations[start..end] {
                    *slot = Some(key.clone());
                }
                occurrence += 1;
            };
            (strategy.strategy)(block, &mut claim, content);
        }

        decorations.into()
    }

    fn component_for_key(&self, key: &str) -> Option<&str> {
        self.strategy_for_key(key).map(|s| s.component.as_str())
    }

    fn props_for_key(&self, key: &str) -> Option<Value> {
        self.strategy_for_key(key).and_then(|s| s.props.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeafRange {
    pub start: usize,
    pub end: usize,
}

/// A run of characters sharing one decoration, split into leaves of equal
/// inline style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoratorRange {
    pub start: usize,
    pub end: usize,
    pub decorator_key: Option<DecorationKey>,
    pub leaves: Vec<LeafRange>,
}

pub type BlockTree = Arc<[DecoratorRange]>;
pub type TreeMap = imbl::HashMap<BlockKey, BlockTree>;

pub fn generate_block_tree(
    content: &ContentState,
    block: &ContentBlock,
    decorator: Option<&dyn Decorator>,
) -> BlockTree {
    let len = block.len();
    if len == 0 {
        return Arc::from([DecoratorRange {
            start: 0,
            end: 0,
            decorator_key: None,
            leaves: vec![LeafRange { start: 0, end: 0 }],
        }]);
    }

    let decorations: Decorations = match decorator {
        Some(decorator) => decorator.decorations(block, content),
        None => vec![None; len].into(),
    };

    let characters: Vec<&CharacterMetadata> = block.characters().iter().collect();
    let mut ranges = Vec::new();
    find_ranges(
        decorations.iter(),
        |a, b| a == b,
        |_| true,
        |start, end| {
            ranges.push(DecoratorRange {
                start,
                end,
                decorator_key: decorations.get(start).cloned().flatten(),
                leaves: generate_leaves(&characters[start..end.min(characters.len())], start),
            });
        },
    );
    ranges.into()
}

fn generate_leaves(characters: &[&CharacterMetadata], offset: usize) -> Vec<LeafRange> {
    let mut leaves = Vec::new();
    find_ranges(
        characters.iter(),
        |a, b| a == b || a.style() == b.style(),
        |_| true,
        |start, end| {
            leaves.push(LeafRange {
                start: start + offset,
                end: end + offset,
            })
        },
    );
    leaves
}

pub fn generate_tree_map(content: &ContentState, decorator: Option<&dyn Decorator>) -> TreeMap {
    content
        .block_map()
        .iter()
        .map(|block| {
            (
                block.key().clone(),
                generate_block_tree(content, block, decorator),
            )
        })
        .collect()
}

/// Regenerates trees only for blocks whose value changed by identity between
/// `previous` and `next`. Trees of blocks that no longer exist are dropped.
pub fn regenerate_tree_for_new_blocks(
    previous: &ContentState,
    tree_map: &TreeMap,
    next: &ContentState,
    decorator: Option<&dyn Decorator>,
) -> TreeMap {
    let mut updated = tree_map.clone();
    let mut regenerated = 0usize;
    for block in next.block_map().iter() {
        if previous.block_map().shares_block(next.block_map(), block.key())
            && updated.contains_key(block.key())
        {
            continue;
        }
        updated.insert(
            block.key().clone(),
            generate_block_tree(next, block, decorator),
        );
        regenerated += 1;
    }
    if updated.len() != next.block_map().len() {
        updated.retain(|key, _| next.block_map().contains_key(key));
    }
    tracing::trace!(regenerated, "regenerated block trees for new content");
    updated
}

/// Regenerates trees only for blocks whose decorations differ, by identity,
/// between `existing` and `decorator`.
pub fn regenerate_tree_for_new_decorator(
    content: &ContentState,
    tree_map: &TreeMap,
    decorator: &dyn Decorator,
    existing: &dyn Decorator,
) -> TreeMap {
    let mut updated = tree_map.clone();
    let mut regenerated = 0usize;
    for block in content.block_map().iter() {
        let next = decorator.decorations(block, content);
        let prev = existing.decorations(block, content);
        if Arc::ptr_eq(&next, &prev) && updated.contains_key(block.key()) {
            continue;
        }
        updated.insert(
            block.key().clone(),
            generate_block_tree(content, block, Some(decorator)),
        );
        regenerated += 1;
    }
    tracing::trace!(regenerated, "regenerated block trees for new decorator");
    updated
}
