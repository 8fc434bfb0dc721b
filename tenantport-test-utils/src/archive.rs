use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use anyhow::{anyhow, Result};
use serde_json::Value;

use tenantport::archive::{blob_path, ArchiveReader, ArchiveWriter, Attributes, RootDocument};
use tenantport::transfer::EntityKind;

/// Assembles or edits archives for import tests.
#[derive(Debug, Clone)]
pub struct ArchiveBuilder {
    root: RootDocument,
    documents: BTreeMap<(EntityKind, String), Attributes>,
    blobs: BTreeMap<String, Vec<u8>>,
}

impl ArchiveBuilder {
    pub fn new(root: RootDocument) -> Self {
        Self {
            root,
            documents: BTreeMap::new(),
            blobs: BTreeMap::new(),
        }
    }

    /// Loads every document and blob of an existing archive.
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut reader = ArchiveReader::open(path)?;
        let mut builder = Self::new(reader.root()?);
        for document in reader.all_documents()?.iter() {
            let id = document
                .source_id()
                .ok_or_else(|| anyhow!("{} has no id", document.path))?;
            builder
                .documents
                .insert((document.kind, id), document.body.clone());
        }
        for key in reader.blob_keys() {
            let bytes = reader.read_bytes(&blob_path(&key))?;
            builder.blobs.insert(key, bytes);
        }
        Ok(builder)
    }

    pub fn root_mut(&mut self) -> &mut RootDocument {
        &mut self.root
    }

    pub fn blob(mut self, key: &str, bytes: &[u8]) -> Self {
        self.blobs.insert(key.to_string(), bytes.to_vec());
        self
    }

    pub fn ids(&self, kind: EntityKind) -> Vec<String> {
        self.documents
            .keys()
            .filter(|(k, _)| *k == kind)
            .map(|(_, id)| id.clone())
            .collect()
    }

    /// Overwrites one field of one document.
    pub fn set_field(&mut self, kind: EntityKind, id: &str, field: &str, value: Value) -> Result<()> {
        let document = self
            .documents
            .get_mut(&(kind, id.to_string()))
            .ok_or_else(|| anyhow!("no {} document {}", kind, id))?;
        document.insert(field.to_string(), value);
        Ok(())
    }

    pub fn field(&self, kind: EntityKind, id: &str, field: &str) -> Option<&Value> {
        self.documents.get(&(kind, id.to_string()))?.get(field)
    }

    /// Adds or replaces one document.
    pub fn insert(&mut self, kind: EntityKind, id: &str, body: Value) -> Result<()> {
        let Value::Object(mut body) = body else {
            return Err(anyhow!("{} document {} is not an object", kind, id));
        };
        body.insert("id".to_string(), Value::String(id.to_string()));
        self.documents.insert((kind, id.to_string()), body);
        Ok(())
    }

    pub fn remove(&mut self, kind: EntityKind, id: &str) -> Option<Attributes> {
        self.documents.remove(&(kind, id.to_string()))
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        let mut writer = ArchiveWriter::new(File::create(path)?, 64 * 1024);
        writer.write_root(&self.root)?;
        for ((kind, id), body) in &self.documents {
            writer.write_document(*kind, id, body)?;
        }
        for (key, bytes) in &self.blobs {
            writer.write_bytes(&blob_path(key), bytes)?;
        }
        writer.finish()?;
        Ok(())
    }
}
