//! Queued bridge between controllers and a backing store.
//!
//! Every request goes through one FIFO queue drained by a single worker
//! task, so requests are applied in the order they were issued. A remove
//! sent after a persist for the same item is never applied before it.

use std::sync::Arc;

use async_trait::async_trait;
use shared::{
    error::StoreError,
    protocol::{StoreRequest, StoreResponse},
};
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};

use crate::store::BackingStore;

pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

struct QueuedRequest {
    request: StoreRequest,
    reply: oneshot::Sender<Result<StoreResponse, StoreError>>,
}

#[derive(Clone)]
pub struct StoreBridge {
    queue: mpsc::Sender<QueuedRequest>,
}

impl StoreBridge {
    /// Starts the worker on the current tokio runtime. The worker exits once
    /// every bridge handle has been dropped.
    pub fn spawn(inner: Arc<dyn BackingStore>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (queue, rx) = mpsc::channel(capacity.max(1));
        let worker = tokio::spawn(run_worker(inner, rx));
        (Self { queue }, worker)
    }
}

async fn run_worker(inner: Arc<dyn BackingStore>, mut rx: mpsc::Receiver<QueuedRequest>) {
    tracing::debug!("store bridge worker started");
    while let Some(QueuedRequest { request, reply }) = rx.recv().await {
        let channel = request.channel();
        let result = inner.send(request).await;
        match &result {
            Ok(response) => {
                tracing::debug!(channel = %channel, response = response.name(), "store request forwarded")
            }
            Err(err) => tracing::warn!(channel = %channel, "store request failed: {err}"),
        }
        if reply.send(result).is_err() {
            tracing::debug!(channel = %channel, "caller went away before the store replied");
        }
    }
    tracing::debug!("store bridge worker stopped");
}

#[async_trait]
impl BackingStore for StoreBridge {
    async fn send(&self, request: StoreRequest) -> Result<StoreResponse, StoreError> {
        let (reply, response) = oneshot::channel();
        self.queue
            .send(QueuedRequest { request, reply })
            .await
            .map_err(|_| StoreError::transport("store bridge worker is not running"))?;
        response
            .await
            .map_err(|_| StoreError::transport("store bridge worker dropped the request"))?
    }
}

#[cfg(test)]
#[path = "tests/bridge_tests.rs"]
mod tests;
