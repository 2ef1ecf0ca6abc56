use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    domain::{CollectionKind, ItemId, Metadata},
    error::StoreFailure,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDetails {
    pub metadata: Metadata,
    pub enabled: bool,
}

/// Store listing of one collection; key order is display order.
pub type DetailsMap = IndexMap<ItemId, ItemDetails>;

/// Enabled flags submitted on save, in collection order.
pub type EnabledMap = IndexMap<ItemId, bool>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum StoreOperation {
    GetDetails,
    Package { id: ItemId },
    Remove { id: ItemId },
    Export { id: ItemId, destination: PathBuf },
    Persist { enabled: EnabledMap },
}

impl StoreOperation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::GetDetails => "get_details",
            Self::Package { .. } => "package",
            Self::Remove { .. } => "remove",
            Self::Export { .. } => "export",
            Self::Persist { .. } => "persist",
        }
    }

    pub fn item_id(&self) -> Option<&ItemId> {
        match self {
            Self::Package { id } | Self::Remove { id } | Self::Export { id, .. } => Some(id),
            Self::GetDetails | Self::Persist { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreRequest {
    pub kind: CollectionKind,
    pub operation: StoreOperation,
}

impl StoreRequest {
    pub fn new(kind: CollectionKind, operation: StoreOperation) -> Self {
        Self { kind, operation }
    }

    /// Channel the request is routed on, derived only from the kind and
    /// the operation.
    pub fn channel(&self) -> String {
        let kind = self.kind.as_str();
        match &self.operation {
            StoreOperation::GetDetails => format!("get-{kind}-details"),
            StoreOperation::Package { .. } => format!("zip-{kind}"),
            StoreOperation::Remove { .. } => format!("remove-{kind}"),
            StoreOperation::Export { .. } => format!("export-{kind}"),
            StoreOperation::Persist { .. } => format!("save-{kind}"),
        }
    }

    pub fn envelope(&self) -> Value {
        let payload = match &self.operation {
            StoreOperation::GetDetails => Value::Null,
            StoreOperation::Package { id } | StoreOperation::Remove { id } => json!(id),
            StoreOperation::Export { id, destination } => {
                json!({ "id": id, "destination": destination })
            }
            StoreOperation::Persist { enabled } => json!(enabled),
        };
        json!({ "channel": self.channel(), "payload": payload })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum StoreResponse {
    Details(DetailsMap),
    Packaged { file_name: String },
    Ack,
    Failed(StoreFailure),
}

impl StoreResponse {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Details(_) => "details",
            Self::Packaged { .. } => "packaged",
            Self::Ack => "ack",
            Self::Failed(_) => "failed",
        }
    }
}
