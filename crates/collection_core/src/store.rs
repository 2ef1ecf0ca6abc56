//! Typed access to the backing store for one collection kind.

use std::{path::PathBuf, sync::Arc, time::Duration};

use async_trait::async_trait;
use shared::{
    domain::{CollectionKind, ItemId},
    error::StoreError,
    protocol::{DetailsMap, EnabledMap, StoreOperation, StoreRequest, StoreResponse},
};

use crate::error::{CollectionError, Result};

#[async_trait]
pub trait BackingStore: Send + Sync {
    async fn send(&self, request: StoreRequest) -> Result<StoreResponse, StoreError>;
}

#[derive(Clone)]
pub struct StoreClient {
    store: Arc<dyn BackingStore>,
    kind: CollectionKind,
    timeout: Duration,
}

impl StoreClient {
    pub fn new(store: Arc<dyn BackingStore>, kind: CollectionKind, timeout: Duration) -> Self {
        Self {
            store,
            kind,
            timeout,
        }
    }

    pub async fn get_details(&self) -> Result<DetailsMap> {
        match self.call(StoreOperation::GetDetails).await? {
            (_, StoreResponse::Details(details)) => Ok(details),
            (channel, other) => Err(unexpected(channel, &other)),
        }
    }

    /// Packages an item into a temporary artifact and returns the file
    /// name the store suggests for it.
    pub async fn package(&self, id: &ItemId) -> Result<String> {
        match self.call(StoreOperation::Package { id: id.clone() }).await? {
            (_, StoreResponse::Packaged { file_name }) => Ok(file_name),
            (channel, other) => Err(unexpected(channel, &other)),
        }
    }

    pub async fn remove(&self, id: &ItemId) -> Result<()> {
        self.expect_ack(StoreOperation::Remove { id: id.clone() })
            .await
    }

    /// Copies the artifact produced by [`StoreClient::package`] to `destination`.
    pub async fn export(&self, id: &ItemId, destination: PathBuf) -> Result<()> {
        self.expect_ack(StoreOperation::Export {
            id: id.clone(),
            destination,
        })
        .await
    }

    pub async fn persist(&self, enabled: EnabledMap) -> Result<()> {
        self.expect_ack(StoreOperation::Persist { enabled }).await
    }

    async fn expect_ack(&self, operation: StoreOperation) -> Result<()> {
        match self.call(operation).await? {
            (_, StoreResponse::Ack) => Ok(()),
            (channel, other) => Err(unexpected(channel, &other)),
        }
    }

    async fn call(&self, operation: StoreOperation) -> Result<(String, StoreResponse)> {
        let request = StoreRequest::new(self.kind, operation);
        let channel = request.channel();
        tracing::debug!(
            channel = %channel,
            id = request.operation.item_id().map(ItemId::as_str),
            "sending store request"
        );

        let response = match tokio::time::timeout(self.timeout, self.store.send(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(source)) => return Err(CollectionError::Store { channel, source }),
            Err(_) => {
                return Err(CollectionError::Timeout {
                    channel,
                    timeout: self.timeout,
                })
            }
        };

        match response {
            StoreResponse::Failed(failure) => Err(CollectionError::Store {
                channel,
                source: failure.into(),
            }),
            response => Ok((channel, response)),
        }
    }
}

fn unexpected(channel: String, response: &StoreResponse) -> CollectionError {
    CollectionError::UnexpectedResponse {
        channel,
        response: response.name(),
    }
}
