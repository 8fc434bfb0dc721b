//! Portable archive format
//!
//! ```text
//! data/account.json              root document of the source account
//! data/<entity_type>/<id>.json   one document per exported row
//! storage/<blob_key>             raw attachment bytes, stored uncompressed
//! ```
//!
//! Documents keep source-space identifiers; translation happens on import.

mod reader;
mod writer;

pub use reader::ArchiveReader;
pub use writer::ArchiveWriter;

use std::collections::BTreeMap;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{ArchiveError, ArchiveResult};
use crate::transfer::EntityKind;

pub const DATA_DIR: &str = "data";
pub const STORAGE_DIR: &str = "storage";
pub const ROOT_DOCUMENT: &str = "data/account.json";

/// Persisted attributes of one row, keyed by column name.
pub type Attributes = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootDocument {
    pub id: String,
    pub name: String,
    pub external_account_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_code: Option<JoinCodeDocument>,
}

impl RootDocument {
    /// Path prefix segment identifying the account in product URLs.
    pub fn slug(&self) -> String {
        self.external_account_id.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinCodeDocument {
    pub code: String,
    pub usage_count: i64,
    pub usage_limit: i64,
}

/// One entity document as read from the archive.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub kind: EntityKind,
    pub path: String,
    pub body: Attributes,
}

impl Document {
    pub fn source_id(&self) -> Option<String> {
        self.field("id")
    }

    /// String form of a scalar field; `None` for absent or null values.
    pub fn field(&self, name: &str) -> Option<String> {
        self.body.get(name).and_then(id_value)
    }
}

/// Every entity document of an archive, grouped by kind.
#[derive(Debug, Default, Clone)]
pub struct ArchiveDocuments {
    by_kind: BTreeMap<EntityKind, Vec<Document>>,
}

impl ArchiveDocuments {
    pub fn of(&self, kind: EntityKind) -> &[Document] {
        self.by_kind.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Documents in import order, lexicographic within a kind.
    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.by_kind.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.by_kind.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn push(&mut self, document: Document) {
        self.by_kind.entry(document.kind).or_default().push(document);
    }
}

/// Identifier as a string. Ids may be serialized as strings or numbers.
pub fn id_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn document_path(kind: EntityKind, id: &str) -> String {
    format!("{}/{}/{}.json", DATA_DIR, kind.directory(), id)
}

pub fn blob_path(key: &str) -> String {
    format!("{}/{}", STORAGE_DIR, key)
}

/// Rejects entry names that would escape the archive root.
pub(crate) fn sanitize_entry_name(name: &str) -> ArchiveResult<String> {
    let candidate = Path::new(name);
    if name.is_empty()
        || candidate.is_absolute()
        || candidate
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
    {
        return Err(ArchiveError::UnsafePath(name.to_string()));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_paths() {
        assert_eq!(document_path(EntityKind::Cards, "c1"), "data/cards/c1.json");
        assert_eq!(blob_path("abc123"), "storage/abc123");
    }

    #[test]
    fn test_sanitize_entry_name() {
        assert!(sanitize_entry_name("data/cards/1.json").is_ok());
        assert!(matches!(
            sanitize_entry_name("../escape.json"),
            Err(ArchiveError::UnsafePath(_))
        ));
        assert!(sanitize_entry_name("/etc/passwd").is_err());
        assert!(sanitize_entry_name("data/../../x").is_err());
    }

    #[test]
    fn test_id_value_accepts_numbers() {
        assert_eq!(id_value(&json!(42)), Some("42".to_string()));
        assert_eq!(id_value(&json!("abc")), Some("abc".to_string()));
        assert_eq!(id_value(&json!(null)), None);
    }

    #[test]
    fn test_root_document_without_join_code() {
        let root: RootDocument =
            serde_json::from_value(json!({"id": "a", "name": "Acme", "external_account_id": 7}))
                .unwrap();
        assert!(root.join_code.is_none());
        assert_eq!(root.slug(), "7");
    }
}
