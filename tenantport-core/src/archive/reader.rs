use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, Write};
use std::path::Path;

use serde_json::Value;
use tracing::debug;
use zip::{result::ZipError, ZipArchive};

use super::{
    blob_path, sanitize_entry_name, ArchiveDocuments, Attributes, Document, RootDocument,
    DATA_DIR, ROOT_DOCUMENT, STORAGE_DIR,
};
use crate::errors::{ArchiveError, ArchiveResult, IntegrityError, TransferResult};
use crate::transfer::EntityKind;

/// Random-access reader over an archive. Entry names are indexed and sorted once so
/// every enumeration is deterministic.
pub struct ArchiveReader<R: Read + Seek> {
    archive: ZipArchive<R>,
    names: BTreeSet<String>,
}

impl ArchiveReader<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> ArchiveResult<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file))
    }
}

impl<R: Read + Seek> ArchiveReader<R> {
    pub fn from_reader(reader: R) -> ArchiveResult<Self> {
        let archive = ZipArchive::new(reader)?;
        let mut names = BTreeSet::new();
        for name in archive.file_names() {
            if name.ends_with('/') {
                continue;
            }
            names.insert(sanitize_entry_name(name)?);
        }
        Ok(Self { archive, names })
    }

    pub fn contains(&self, path: &str) -> bool {
        self.names.contains(path)
    }

    /// Every file entry, sorted.
    pub fn entry_names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// The source account's root document.
    pub fn root(&mut self) -> TransferResult<RootDocument> {
        if !self.contains(ROOT_DOCUMENT) {
            return Err(IntegrityError::MissingRoot.into());
        }
        let bytes = self.read_bytes(ROOT_DOCUMENT)?;
        serde_json::from_slice(&bytes)
            .map_err(|e| IntegrityError::UnreadableRoot(e.to_string()).into())
    }

    /// Documents of one kind, ordered by entry name.
    pub fn documents(&mut self, kind: EntityKind) -> ArchiveResult<Vec<Document>> {
        let prefix = format!("{}/{}/", DATA_DIR, kind.directory());
        let paths: Vec<String> = self
            .names
            .iter()
            .filter(|name| {
                name.starts_with(&prefix)
                    && name.ends_with(".json")
                    && !name[prefix.len()..].contains('/')
            })
            .cloned()
            .collect();

        paths
            .into_iter()
            .map(|path| {
                let body = self.read_object(&path)?;
                Ok(Document { kind, path, body })
            })
            .collect()
    }

    /// Every known entity document, grouped by kind in import order.
    pub fn all_documents(&mut self) -> ArchiveResult<ArchiveDocuments> {
        self.log_unknown_entries();

        let mut documents = ArchiveDocuments::default();
        for kind in EntityKind::in_import_order() {
            for document in self.documents(kind)? {
                documents.push(document);
            }
        }
        Ok(documents)
    }

    fn log_unknown_entries(&self) {
        let data_prefix = format!("{}/", DATA_DIR);
        let storage_prefix = format!("{}/", STORAGE_DIR);
        for name in &self.names {
            if name == ROOT_DOCUMENT || name.starts_with(&storage_prefix) {
                continue;
            }
            let known = name
                .strip_prefix(&data_prefix)
                .and_then(|rest| rest.split_once('/'))
                .and_then(|(directory, _)| EntityKind::from_directory(directory))
                .is_some();
            if !known {
                debug!("Skipping unrecognised archive entry {}", name);
            }
        }
    }

    /// Storage keys of every attachment payload, sorted.
    pub fn blob_keys(&self) -> Vec<String> {
        let prefix = format!("{}/", STORAGE_DIR);
        self.names
            .iter()
            .filter_map(|name| name.strip_prefix(&prefix))
            .filter(|key| !key.is_empty() && !key.contains('/'))
            .map(str::to_string)
            .collect()
    }

    /// Copies one attachment payload into `out` and returns the byte count.
    pub fn extract_blob<W: Write + ?Sized>(&mut self, key: &str, out: &mut W) -> ArchiveResult<u64> {
        let path = blob_path(key);
        let mut entry = self.archive.by_name(&path).map_err(|e| match e {
            ZipError::FileNotFound => ArchiveError::MissingEntry(path.clone()),
            other => ArchiveError::Zip(other),
        })?;
        Ok(io::copy(&mut entry, out)?)
    }

    pub fn read_bytes(&mut self, path: &str) -> ArchiveResult<Vec<u8>> {
        let mut file = self.archive.by_name(path).map_err(|e| match e {
            ZipError::FileNotFound => ArchiveError::MissingEntry(path.to_string()),
            other => ArchiveError::Zip(other),
        })?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;
        Ok(buffer)
    }

    fn read_object(&mut self, path: &str) -> ArchiveResult<Attributes> {
        let bytes = self.read_bytes(path)?;
        let value: Value = serde_json::from_slice(&bytes).map_err(|source| ArchiveError::Parse {
            path: path.to_string(),
            source,
        })?;
        match value {
            Value::Object(map) => Ok(map),
            _ => Err(ArchiveError::NotAnObject(path.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{ArchiveWriter, JoinCodeDocument};
    use crate::errors::TransferError;
    use serde_json::json;
    use std::io::Cursor;

    fn sample_root() -> RootDocument {
        RootDocument {
            id: "acct".to_string(),
            name: "Acme".to_string(),
            external_account_id: 1001,
            join_code: Some(JoinCodeDocument {
                code: "ABCD-EFGH-JKLM".to_string(),
                usage_count: 2,
                usage_limit: 10,
            }),
        }
    }

    fn build(write: impl FnOnce(&mut ArchiveWriter<Cursor<Vec<u8>>>)) -> Vec<u8> {
        let mut writer = ArchiveWriter::new(Cursor::new(Vec::new()), 1024);
        write(&mut writer);
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_documents_are_sorted_regardless_of_write_order() {
        let bytes = build(|w| {
            w.write_root(&sample_root()).unwrap();
            for id in ["c", "a", "b"] {
                w.write_document(EntityKind::Cards, id, &json!({"id": id}))
                    .unwrap();
            }
        });
        let mut reader = ArchiveReader::from_reader(Cursor::new(bytes)).unwrap();
        let ids: Vec<String> = reader
            .documents(EntityKind::Cards)
            .unwrap()
            .iter()
            .filter_map(Document::source_id)
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(reader.root().unwrap(), sample_root());
    }

    #[test]
    fn test_unknown_directories_are_skipped() {
        let bytes = build(|w| {
            w.write_root(&sample_root()).unwrap();
            w.write_json("data/future_things/1.json", &json!({"id": "1"}))
                .unwrap();
            w.write_json("extras/readme.json", &json!({})).unwrap();
            w.write_document(EntityKind::Tags, "t1", &json!({"id": "t1"}))
                .unwrap();
        });
        let mut reader = ArchiveReader::from_reader(Cursor::new(bytes)).unwrap();
        let documents = reader.all_documents().unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents.of(EntityKind::Tags).len(), 1);
    }

    #[test]
    fn test_missing_root_is_integrity_error() {
        let bytes = build(|w| {
            w.write_document(EntityKind::Tags, "t1", &json!({"id": "t1"}))
                .unwrap();
        });
        let mut reader = ArchiveReader::from_reader(Cursor::new(bytes)).unwrap();
        assert!(matches!(
            reader.root(),
            Err(TransferError::Integrity(IntegrityError::MissingRoot))
        ));
    }

    #[test]
    fn test_unreadable_root_is_integrity_error() {
        let bytes = build(|w| {
            w.write_json(ROOT_DOCUMENT, &json!({"name": 3})).unwrap();
        });
        let mut reader = ArchiveReader::from_reader(Cursor::new(bytes)).unwrap();
        assert!(matches!(
            reader.root(),
            Err(TransferError::Integrity(IntegrityError::UnreadableRoot(_)))
        ));
    }

    #[test]
    fn test_non_object_document_is_rejected() {
        let bytes = build(|w| {
            w.write_json("data/tags/t1.json", &json!([1, 2])).unwrap();
        });
        let mut reader = ArchiveReader::from_reader(Cursor::new(bytes)).unwrap();
        assert!(matches!(
            reader.documents(EntityKind::Tags),
            Err(ArchiveError::NotAnObject(_))
        ));
    }

    #[test]
    fn test_blob_keys_and_missing_blob() {
        let bytes = build(|w| {
            w.write_bytes("storage/zz", b"2").unwrap();
            w.write_bytes("storage/aa", b"1").unwrap();
        });
        let mut reader = ArchiveReader::from_reader(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.blob_keys(), vec!["aa", "zz"]);
        let mut sink = Vec::new();
        assert!(matches!(
            reader.extract_blob("nope", &mut sink),
            Err(ArchiveError::MissingEntry(_))
        ));
    }
}
