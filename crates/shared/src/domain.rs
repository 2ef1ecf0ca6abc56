use std::{borrow::Borrow, fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for ItemId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Which named collection a controller manages. Request routing and the
/// export file type both follow from this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    Extension,
    ResourcePack,
    Tool,
}

impl CollectionKind {
    pub const ALL: [CollectionKind; 3] = [Self::Extension, Self::ResourcePack, Self::Tool];

    /// Lowercase routing segment used in store channel names.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Extension => "extension",
            Self::ResourcePack => "resourcepack",
            Self::Tool => "tool",
        }
    }

    pub fn export_descriptor(self) -> ExportDescriptor {
        match self {
            Self::Extension => ExportDescriptor::new("mspe", "Extension Package"),
            Self::ResourcePack => ExportDescriptor::new("mspr", "Resource Pack Package"),
            Self::Tool => ExportDescriptor::new("mspt", "Tool Package"),
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown collection kind '{0}' (expected extension, resourcepack or tool)")]
pub struct UnknownCollectionKind(pub String);

impl FromStr for CollectionKind {
    type Err = UnknownCollectionKind;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase().replace(['-', '_'], "");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| UnknownCollectionKind(raw.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportDescriptor {
    pub file_extension: String,
    pub type_label: String,
}

impl ExportDescriptor {
    pub fn new(file_extension: impl Into<String>, type_label: impl Into<String>) -> Self {
        Self {
            file_extension: file_extension.into(),
            type_label: type_label.into(),
        }
    }
}

/// Descriptive fields of one collection item. The controller reads `id` and
/// stamps `kind` on load; every other field is carried as raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub id: ItemId,
    #[serde(
        rename = "type",
        default,
        deserialize_with = "lenient_kind",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<CollectionKind>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Metadata {
    pub fn new(id: impl Into<ItemId>) -> Self {
        Self {
            id: id.into(),
            kind: None,
            extra: Map::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.extra.insert("name".to_string(), Value::String(name.into()));
        self
    }

    /// The `name` field when it is a non-empty string, otherwise the id.
    pub fn display_name(&self) -> &str {
        self.extra
            .get("name")
            .and_then(Value::as_str)
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(self.id.as_str())
    }
}

// Stores stamp whatever they like into `type`; an unrecognised value is
// dropped since the controller overwrites it on load.
fn lenient_kind<'de, D>(deserializer: D) -> Result<Option<CollectionKind>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|raw| raw.parse().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_kind_names_loosely() {
        assert_eq!("Extension".parse(), Ok(CollectionKind::Extension));
        assert_eq!("resource-pack".parse(), Ok(CollectionKind::ResourcePack));
        assert_eq!("resource_pack".parse(), Ok(CollectionKind::ResourcePack));
        assert_eq!(" tool ".parse(), Ok(CollectionKind::Tool));
        assert!("skin".parse::<CollectionKind>().is_err());
    }

    #[test]
    fn every_kind_has_a_distinct_export_extension() {
        let extensions: Vec<_> = CollectionKind::ALL
            .iter()
            .map(|kind| kind.export_descriptor().file_extension)
            .collect();
        assert_eq!(extensions, vec!["mspe", "mspr", "mspt"]);
    }

    #[test]
    fn metadata_keeps_unknown_fields_and_writes_kind_as_type() {
        let raw = r#"{"id":"a","name":"Alpha","preview":"preview.png"}"#;
        let mut metadata: Metadata = serde_json::from_str(raw).expect("metadata");
        assert_eq!(metadata.id, ItemId::from("a"));
        assert_eq!(metadata.extra.get("preview"), Some(&Value::from("preview.png")));

        metadata.kind = Some(CollectionKind::ResourcePack);
        let value = serde_json::to_value(&metadata).expect("serialize");
        assert_eq!(value["type"], Value::from("resourcepack"));
        assert_eq!(value["preview"], Value::from("preview.png"));
        assert_eq!(metadata.display_name(), "Alpha");
    }

    #[test]
    fn metadata_tolerates_free_form_fields_and_foreign_type_values() {
        let raw = r#"{"id":"a","type":"extension","author":"Someone","version":3}"#;
        let metadata: Metadata = serde_json::from_str(raw).expect("lowercase type");
        assert_eq!(metadata.kind, Some(CollectionKind::Extension));
        assert_eq!(metadata.extra.get("author"), Some(&Value::from("Someone")));
        assert_eq!(metadata.display_name(), "a");

        let raw = r#"{"id":"b","type":{"legacy":true},"author":["x","y"],"name":7}"#;
        let metadata: Metadata = serde_json::from_str(raw).expect("odd type");
        assert_eq!(metadata.kind, None);
        assert_eq!(metadata.extra.get("author"), Some(&serde_json::json!(["x", "y"])));
        assert_eq!(metadata.display_name(), "b");
    }

    #[test]
    fn unknown_kind_error_names_the_accepted_values() {
        let err = "skin".parse::<CollectionKind>().expect_err("unknown");
        assert_eq!(
            err.to_string(),
            "unknown collection kind 'skin' (expected extension, resourcepack or tool)"
        );
    }
}
