use std::io::{self, Seek, Write};

use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt};
use zip::{write::FileOptions, CompressionMethod, ZipWriter};

use super::{blob_path, document_path, sanitize_entry_name, RootDocument, ROOT_DOCUMENT};
use crate::errors::ArchiveResult;
use crate::transfer::EntityKind;

/// Streams an archive into any seekable writer.
pub struct ArchiveWriter<W: Write + Seek> {
    zip: ZipWriter<W>,
    chunk_size: usize,
    entries: usize,
}

impl<W: Write + Seek> ArchiveWriter<W> {
    pub fn new(inner: W, chunk_size: usize) -> Self {
        Self {
            zip: ZipWriter::new(inner),
            chunk_size: chunk_size.max(1),
            entries: 0,
        }
    }

    fn json_options() -> FileOptions {
        FileOptions::default().compression_method(CompressionMethod::Deflated)
    }

    fn raw_options() -> FileOptions {
        FileOptions::default().compression_method(CompressionMethod::Stored)
    }

    pub fn write_root(&mut self, root: &RootDocument) -> ArchiveResult<()> {
        self.write_json(ROOT_DOCUMENT, root)
    }

    pub fn write_document<T: Serialize + ?Sized>(
        &mut self,
        kind: EntityKind,
        id: &str,
        document: &T,
    ) -> ArchiveResult<()> {
        self.write_json(&document_path(kind, id), document)
    }

    /// Writes any JSON entry at a caller-chosen path.
    pub fn write_json<T: Serialize + ?Sized>(&mut self, path: &str, value: &T) -> ArchiveResult<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_entry(path, &bytes, Self::json_options())
    }

    /// Writes raw bytes stored without compression.
    pub fn write_bytes(&mut self, path: &str, bytes: &[u8]) -> ArchiveResult<()> {
        self.write_entry(path, bytes, Self::raw_options())
    }

    fn write_entry(&mut self, path: &str, bytes: &[u8], options: FileOptions) -> ArchiveResult<()> {
        let path = sanitize_entry_name(path)?;
        self.zip.start_file(path, options)?;
        self.zip.write_all(bytes)?;
        self.entries += 1;
        Ok(())
    }

    /// Streams attachment bytes into `storage/<key>`.
    pub async fn write_blob<R>(&mut self, key: &str, reader: &mut R) -> ArchiveResult<u64>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        self.stream_entry(&blob_path(key), reader).await
    }

    /// Streams bytes into an uncompressed entry chunk by chunk. The bytes are staged in a
    /// scratch file first, so a read failure leaves no entry behind.
    pub async fn stream_entry<R>(&mut self, path: &str, reader: &mut R) -> ArchiveResult<u64>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let path = sanitize_entry_name(path)?;

        let mut scratch = tempfile::tempfile()?;
        let mut buffer = vec![0u8; self.chunk_size];
        let mut written = 0u64;
        loop {
            let read = reader.read(&mut buffer).await?;
            if read == 0 {
                break;
            }
            scratch.write_all(&buffer[..read])?;
            written += read as u64;
        }
        scratch.rewind()?;

        self.zip.start_file(path, Self::raw_options())?;
        io::copy(&mut scratch, &mut self.zip)?;
        self.entries += 1;
        Ok(written)
    }

    pub fn entries(&self) -> usize {
        self.entries
    }

    pub fn finish(mut self) -> ArchiveResult<W> {
        Ok(self.zip.finish()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::ArchiveReader;
    use serde_json::json;
    use std::io::Cursor;

    #[tokio::test]
    async fn test_blob_entries_are_stored_uncompressed() {
        let mut writer = ArchiveWriter::new(Cursor::new(Vec::new()), 4);
        let payload = b"hello attachment bytes".to_vec();
        let written = writer
            .write_blob("key-1", &mut Cursor::new(payload.clone()))
            .await
            .unwrap();
        assert_eq!(written, payload.len() as u64);
        writer
            .write_document(EntityKind::Tags, "t1", &json!({"id": "t1"}))
            .unwrap();
        assert_eq!(writer.entries(), 2);

        let bytes = writer.finish().unwrap().into_inner();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes.clone())).unwrap();
        let entry = archive.by_name("storage/key-1").unwrap();
        assert_eq!(entry.compression(), CompressionMethod::Stored);
        drop(entry);

        let mut reader = ArchiveReader::from_reader(Cursor::new(bytes)).unwrap();
        let mut out = Vec::new();
        reader.extract_blob("key-1", &mut out).unwrap();
        assert_eq!(out, payload);
    }

    #[tokio::test]
    async fn test_failed_read_leaves_no_entry() {
        let mut writer = ArchiveWriter::new(Cursor::new(Vec::new()), 8);
        let mut reader = tokio_test::io::Builder::new()
            .read(b"partial ")
            .read_error(io::Error::new(io::ErrorKind::BrokenPipe, "store went away"))
            .build();
        let err = writer.write_blob("key-1", &mut reader).await.unwrap_err();
        assert!(matches!(err, crate::errors::ArchiveError::Io(_)));
        assert_eq!(writer.entries(), 0);

        writer.write_bytes("notes.txt", b"after").unwrap();
        let bytes = writer.finish().unwrap().into_inner();
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        assert_eq!(names, vec!["notes.txt"]);
    }

    #[test]
    fn test_rejects_unsafe_entry() {
        let mut writer = ArchiveWriter::new(Cursor::new(Vec::new()), 1024);
        assert!(writer.write_bytes("../evil", b"x").is_err());
    }
}
