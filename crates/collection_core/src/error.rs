//! Errors surfaced by the collection controller and its store client.

use std::time::Duration;

use shared::{
    domain::{CollectionKind, ItemId},
    error::StoreError,
};
use thiserror::Error;

pub type Result<T, E = CollectionError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum CollectionError {
    /// An event or call named an item that is not in the collection.
    #[error("no item '{id}' in the {kind} collection")]
    NotFound { kind: CollectionKind, id: ItemId },
    #[error("the {0} collection is already loaded")]
    AlreadyLoaded(CollectionKind),
    #[error("the {0} collection has not been loaded")]
    NotLoaded(CollectionKind),
    #[error("details entry '{key}' carries metadata id '{metadata_id}'")]
    MismatchedId { key: ItemId, metadata_id: ItemId },
    #[error("store request {channel} failed: {source}")]
    Store {
        channel: String,
        #[source]
        source: StoreError,
    },
    #[error("store request {channel} answered with unexpected '{response}' response")]
    UnexpectedResponse {
        channel: String,
        response: &'static str,
    },
    #[error("store request {channel} timed out after {timeout:?}")]
    Timeout { channel: String, timeout: Duration },
}

impl CollectionError {
    /// Text shown to the user when an operation fails. Store failures are
    /// passed through verbatim.
    pub fn user_reason(&self) -> String {
        match self {
            Self::Store { source, .. } => source.message.clone(),
            other => other.to_string(),
        }
    }
}
