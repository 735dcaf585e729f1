use thiserror::Error;

use crate::block::BlockKey;
use crate::entity::EntityKey;

pub type Result<T, E = DraftError> = std::result::Result<T, E>;

/// Invariant violations raised by the document model.
///
/// None of these are recoverable: once an operation fails the caller must
/// discard the attempted edit and keep using the content it started from.
#[derive(Debug, Error)]
pub enum DraftError {
    #[error("unknown entity key: {0}")]
    UnknownEntity(EntityKey),
    #[error("unknown block key: {0}")]
    UnknownBlock(BlockKey),
    #[error("target range must be collapsed for `{0}`")]
    SelectionNotCollapsed(&'static str),
    #[error("removal range must exist within character list for entity {0}")]
    MissingEntityRange(EntityKey),
    #[error("expected exactly one range of entity {entity} around offset {offset}, found {found}")]
    AmbiguousEntityRange {
        entity: EntityKey,
        offset: usize,
        found: usize,
    },
    #[error("container block {0} can not be edited as a leaf")]
    ContainerBlock(BlockKey),
    #[error("invalid raw content state: {0}")]
    InvalidRawState(String),
    #[error("invalid raw tree block {0}: missing `children`")]
    InvalidTreeBlock(BlockKey),
    #[error("invalid block tree: {0}")]
    InvalidTree(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
