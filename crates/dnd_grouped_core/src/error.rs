use std::path::PathBuf;

use crate::model::{GroupId, ItemId, RowKey};

/// Violations of the collection invariants (unique ids, single ownership).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("group id {0} appears more than once")]
    DuplicateGroup(GroupId),

    #[error("item id {0} appears more than once")]
    DuplicateItem(ItemId),
}

/// Why an optimistic move could not be resolved against the current snapshot.
///
/// Every variant means the view is out of sync with the collection it renders; the move is
/// dropped and the collection is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("dragged row {0:?} is not in the current snapshot")]
    StaleDragged(RowKey),

    #[error("target row {0:?} is not in the current snapshot")]
    StaleTarget(RowKey),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Group matching provided id not found: {0}")]
    GroupNotFound(GroupId),

    #[error("Link matching provided id not found: {0}")]
    ItemNotFound(ItemId),

    #[error("position {position} is out of range (len {len})")]
    PositionOutOfRange { position: usize, len: usize },

    #[error("store lock poisoned")]
    Poisoned,
}

/// Failure reported by an ordering authority for a submitted move.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthorityError {
    #[error("move rejected: {0}")]
    Rejected(String),

    #[error("ordering authority unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for AuthorityError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Poisoned => AuthorityError::Unavailable(value.to_string()),
            other => AuthorityError::Rejected(other.to_string()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
