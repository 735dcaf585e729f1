use serde::{Deserialize, Serialize};

fn default_allow_undo() -> bool {
    true
}

/// Host-level knobs for an [`crate::EditorState`] and for raw decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorConfig {
    #[serde(default = "default_allow_undo")]
    pub allow_undo: bool,
    /// Upper bound for the undo stack. `None` keeps every boundary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_undo: Option<usize>,
    /// Decode raw content into tree blocks instead of flat blocks.
    #[serde(default)]
    pub tree_data_support: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            allow_undo: default_allow_undo(),
            max_undo: None,
            tree_data_support: false,
        }
    }
}

impl EditorConfig {
    pub fn with_defaults(mut self) -> Self {
        if self.max_undo == Some(0) {
            self.max_undo = None;
        }
        self
    }

    pub fn convert_options(&self) -> ConvertOptions {
        ConvertOptions {
            tree_data_support: self.tree_data_support,
        }
    }

    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Self>(s).map(Self::with_defaults)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    pub tree_data_support: bool,
}
