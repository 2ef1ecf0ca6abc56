//! Backing store kept in a single JSON snapshot file.
//!
//! Layout: `{ "<kind>": { "<id>": { "metadata": {...}, "enabled": bool } } }`.
//! Packaged artifacts are written to a scratch directory as `<id>.<ext>`.

use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use collection_core::BackingStore;
use indexmap::IndexMap;
use shared::{
    domain::{CollectionKind, ItemId},
    error::{ErrorCode, StoreError, StoreFailure},
    protocol::{DetailsMap, StoreOperation, StoreRequest, StoreResponse},
};
use tokio::sync::Mutex;

type Snapshot = IndexMap<String, DetailsMap>;

pub struct SnapshotStore {
    path: PathBuf,
    artifact_dir: PathBuf,
    snapshot: Mutex<Snapshot>,
}

impl SnapshotStore {
    /// Opens `path`, starting from an empty snapshot when it does not exist yet.
    pub async fn open(path: &Path, artifact_dir: PathBuf) -> anyhow::Result<Self> {
        let snapshot = match tokio::fs::read(path).await {
            Ok(raw) => serde_json::from_slice(&raw)
                .with_context(|| format!("failed to parse snapshot '{}'", path.display()))?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "snapshot not found; starting empty");
                Snapshot::new()
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read snapshot '{}'", path.display()))
            }
        };
        tokio::fs::create_dir_all(&artifact_dir)
            .await
            .with_context(|| {
                format!(
                    "failed to create artifact directory '{}'",
                    artifact_dir.display()
                )
            })?;
        Ok(Self {
            path: path.to_path_buf(),
            artifact_dir,
            snapshot: Mutex::new(snapshot),
        })
    }

    fn artifact_path(&self, kind: CollectionKind, id: &ItemId) -> PathBuf {
        self.artifact_dir.join(artifact_name(kind, id))
    }

    async fn write(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let raw = serde_json::to_vec_pretty(snapshot)
            .map_err(|err| StoreError::new(ErrorCode::Internal, err.to_string()))?;
        tokio::fs::write(&self.path, raw).await?;
        Ok(())
    }
}

fn artifact_name(kind: CollectionKind, id: &ItemId) -> String {
    format!("{id}.{}", kind.export_descriptor().file_extension)
}

fn missing(kind: CollectionKind, id: &ItemId) -> StoreResponse {
    StoreResponse::Failed(StoreFailure::new(
        ErrorCode::NotFound,
        format!("no {kind} named '{id}'"),
    ))
}

fn io_failure(err: std::io::Error) -> StoreResponse {
    StoreResponse::Failed(StoreError::from(err).into())
}

#[async_trait]
impl BackingStore for SnapshotStore {
    async fn send(&self, request: StoreRequest) -> Result<StoreResponse, StoreError> {
        let kind = request.kind;
        let mut snapshot = self.snapshot.lock().await;

        match request.operation {
            StoreOperation::GetDetails => Ok(StoreResponse::Details(
                snapshot.get(kind.as_str()).cloned().unwrap_or_default(),
            )),
            StoreOperation::Package { id } => {
                let Some(details) = snapshot.get(kind.as_str()).and_then(|items| items.get(&id))
                else {
                    return Ok(missing(kind, &id));
                };
                let raw = serde_json::to_vec_pretty(details)
                    .map_err(|err| StoreError::new(ErrorCode::Internal, err.to_string()))?;
                if let Err(err) = tokio::fs::write(self.artifact_path(kind, &id), raw).await {
                    return Ok(io_failure(err));
                }
                Ok(StoreResponse::Packaged {
                    file_name: artifact_name(kind, &id),
                })
            }
            StoreOperation::Export { id, destination } => {
                let artifact = self.artifact_path(kind, &id);
                if !artifact.exists() {
                    return Ok(StoreResponse::Failed(StoreFailure::new(
                        ErrorCode::NotFound,
                        format!("'{id}' has not been packaged"),
                    )));
                }
                match tokio::fs::copy(&artifact, &destination).await {
                    Ok(_) => Ok(StoreResponse::Ack),
                    Err(err) => Ok(io_failure(err)),
                }
            }
            StoreOperation::Remove { id } => {
                let mut next = snapshot.clone();
                let removed = next
                    .get_mut(kind.as_str())
                    .and_then(|items| items.shift_remove(&id));
                if removed.is_none() {
                    return Ok(missing(kind, &id));
                }
                self.write(&next).await?;
                *snapshot = next;
                Ok(StoreResponse::Ack)
            }
            StoreOperation::Persist { enabled } => {
                let mut next = snapshot.clone();
                let items = next.entry(kind.as_str().to_string()).or_default();
                for (id, flag) in enabled {
                    match items.get_mut(&id) {
                        Some(details) => details.enabled = flag,
                        None => tracing::warn!(kind = %kind, id = %id, "ignoring flag for unknown item"),
                    }
                }
                self.write(&next).await?;
                *snapshot = next;
                Ok(StoreResponse::Ack)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use serde_json::json;
    use shared::protocol::EnabledMap;

    use super::*;

    fn temp_root(label: &str) -> PathBuf {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let root = std::env::temp_dir().join(format!("cardctl_{label}_{suffix}"));
        std::fs::create_dir_all(&root).expect("temp root");
        root
    }

    async fn seeded_store(root: &Path) -> SnapshotStore {
        let snapshot = json!({
            "extension": {
                "a": { "metadata": { "id": "a", "name": "Alpha" }, "enabled": true },
                "b": { "metadata": { "id": "b" }, "enabled": false }
            }
        });
        let path = root.join("collections.json");
        std::fs::write(&path, snapshot.to_string()).expect("seed snapshot");
        SnapshotStore::open(&path, root.join("artifacts"))
            .await
            .expect("open store")
    }

    fn request(operation: StoreOperation) -> StoreRequest {
        StoreRequest::new(CollectionKind::Extension, operation)
    }

    #[tokio::test]
    async fn missing_snapshot_lists_nothing() {
        let root = temp_root("empty");
        let store = SnapshotStore::open(&root.join("none.json"), root.join("artifacts"))
            .await
            .expect("open");

        let response = store
            .send(request(StoreOperation::GetDetails))
            .await
            .expect("details");
        assert_eq!(response, StoreResponse::Details(DetailsMap::new()));

        std::fs::remove_dir_all(root).expect("cleanup");
    }

    #[tokio::test]
    async fn package_then_export_copies_the_artifact() {
        let root = temp_root("export");
        let store = seeded_store(&root).await;
        let id = ItemId::from("a");

        let packaged = store
            .send(request(StoreOperation::Package { id: id.clone() }))
            .await
            .expect("package");
        assert_eq!(
            packaged,
            StoreResponse::Packaged {
                file_name: "a.mspe".to_string()
            }
        );

        let destination = root.join("out.mspe");
        let exported = store
            .send(request(StoreOperation::Export {
                id,
                destination: destination.clone(),
            }))
            .await
            .expect("export");
        assert_eq!(exported, StoreResponse::Ack);
        let copied: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&destination).expect("read copy"))
                .expect("artifact json");
        assert_eq!(copied["metadata"]["name"], json!("Alpha"));

        std::fs::remove_dir_all(root).expect("cleanup");
    }

    #[tokio::test]
    async fn export_before_package_fails_with_reason() {
        let root = temp_root("unpackaged");
        let store = seeded_store(&root).await;

        let response = store
            .send(request(StoreOperation::Export {
                id: ItemId::from("b"),
                destination: root.join("b.mspe"),
            }))
            .await
            .expect("reply");
        assert!(matches!(
            response,
            StoreResponse::Failed(StoreFailure { code: ErrorCode::NotFound, .. })
        ));

        std::fs::remove_dir_all(root).expect("cleanup");
    }

    #[tokio::test]
    async fn remove_and_persist_write_through_to_disk() {
        let root = temp_root("write");
        let store = seeded_store(&root).await;

        let removed = store
            .send(request(StoreOperation::Remove {
                id: ItemId::from("a"),
            }))
            .await
            .expect("remove");
        assert_eq!(removed, StoreResponse::Ack);

        let mut enabled = EnabledMap::new();
        enabled.insert(ItemId::from("b"), true);
        store
            .send(request(StoreOperation::Persist { enabled }))
            .await
            .expect("persist");

        let reopened = SnapshotStore::open(&root.join("collections.json"), root.join("artifacts"))
            .await
            .expect("reopen");
        let StoreResponse::Details(details) = reopened
            .send(request(StoreOperation::GetDetails))
            .await
            .expect("details")
        else {
            panic!("expected details");
        };
        assert_eq!(details.len(), 1);
        assert!(details["b"].enabled);

        let again = reopened
            .send(request(StoreOperation::Remove {
                id: ItemId::from("a"),
            }))
            .await
            .expect("reply");
        assert!(matches!(again, StoreResponse::Failed(_)));

        std::fs::remove_dir_all(root).expect("cleanup");
    }

    #[tokio::test]
    async fn failed_write_leaves_the_snapshot_untouched() {
        let root = temp_root("unwritable");
        let mut store = seeded_store(&root).await;
        let blocked = root.join("blocked");
        std::fs::create_dir_all(&blocked).expect("blocking dir");
        store.path = blocked;

        let removed = store
            .send(request(StoreOperation::Remove {
                id: ItemId::from("a"),
            }))
            .await;
        assert!(removed.is_err());

        let mut enabled = EnabledMap::new();
        enabled.insert(ItemId::from("b"), true);
        let persisted = store.send(request(StoreOperation::Persist { enabled })).await;
        assert!(persisted.is_err());

        let StoreResponse::Details(details) = store
            .send(request(StoreOperation::GetDetails))
            .await
            .expect("details")
        else {
            panic!("expected details");
        };
        assert_eq!(
            details.keys().map(ItemId::as_str).collect::<Vec<_>>(),
            vec!["a", "b"]
        );
        assert!(!details["b"].enabled);

        std::fs::remove_dir_all(root).expect("cleanup");
    }
}
