use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::{EntityData, EntityMutability};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawInlineStyleRange {
    pub offset: usize,
    pub length: usize,
    pub style: String,
}

/// `key` indexes the `entityMap` of the enclosing raw state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEntityRange {
    pub offset: usize,
    pub length: usize,
    pub key: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDraftEntity {
    #[serde(rename = "type")]
    pub entity_type: String,
    pub mutability: EntityMutability,
    #[serde(default)]
    pub data: EntityData,
}

/// One block. Offsets and lengths count code points of `text`.
///
/// A missing or `null` type reads as `None`, which decodes to `unstyled`.
/// `children` is only present in the nested (tree) shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDraftContentBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(rename = "type", default)]
    pub block_type: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub depth: usize,
    #[serde(default)]
    pub inline_style_ranges: Vec<RawInlineStyleRange>,
    #[serde(default)]
    pub entity_ranges: Vec<RawEntityRange>,
    #[serde(default)]
    pub data: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<RawDraftContentBlock>>,
}

impl RawDraftContentBlock {
    pub fn new(
        key: impl Into<String>,
        block_type: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            key: Some(key.into()),
            block_type: Some(block_type.into()),
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_children(mut self, children: Vec<RawDraftContentBlock>) -> Self {
        self.children = Some(children);
        self
    }

    pub fn has_children(&self) -> bool {
        self.children.as_ref().is_some_and(|children| !children.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDraftContentState {
    pub blocks: Vec<RawDraftContentBlock>,
    #[serde(default)]
    pub entity_map: BTreeMap<String, RawDraftEntity>,
}

impl RawDraftContentState {
    /// Whether any block nests children, i.e. the state uses the tree shape.
    pub fn is_tree(&self) -> bool {
        self.blocks.iter().any(RawDraftContentBlock::has_children)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_and_missing_types_read_as_none() {
        let raw = RawDraftContentState::from_json_str(
            r#"{"blocks":[{"key":"A","text":"a"},{"key":"B","text":"b","type":null}],"entityMap":{}}"#,
        )
        .expect("parse");
        assert!(raw.blocks.iter().all(|b| b.block_type.is_none()));
        assert!(!raw.is_tree());
    }

    #[test]
    fn field_names_are_camel_case() {
        let raw = RawDraftContentState {
            blocks: vec![RawDraftContentBlock::new("k", "unstyled", "x")],
            entity_map: BTreeMap::new(),
        };
        let json = serde_json::to_value(&raw).expect("serialize");
        assert!(json.get("entityMap").is_some());
        assert!(json["blocks"][0].get("inlineStyleRanges").is_some());
        assert_eq!(json["blocks"][0]["type"], "unstyled");
    }
}
