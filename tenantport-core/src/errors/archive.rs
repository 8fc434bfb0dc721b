//! Archive container errors
//!
//! Raised while reading or writing the zip payload itself. Content problems
//! (dangling references, foreign accounts) are [`IntegrityError`](super::IntegrityError)s.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArchiveError {
    /// The zip container could not be read or written
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Entry name escapes the archive root
    #[error("Invalid path component in archive entry: {0}")]
    UnsafePath(String),

    /// Entry is not valid JSON
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Entry is valid JSON but not an object
    #[error("Archive entry {0} is not a JSON object")]
    NotAnObject(String),

    /// A named entry was requested but is absent
    #[error("Archive entry {0} not found")]
    MissingEntry(String),

    /// Document could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ArchiveError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ArchiveError::Zip(_) => "ZIP_ERROR",
            ArchiveError::Io(_) => "IO_ERROR",
            ArchiveError::UnsafePath(_) => "UNSAFE_PATH",
            ArchiveError::Parse { .. } => "PARSE_ERROR",
            ArchiveError::NotAnObject(_) => "NOT_AN_OBJECT",
            ArchiveError::MissingEntry(_) => "MISSING_ENTRY",
            ArchiveError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsafe_path() {
        let err = ArchiveError::UnsafePath("../etc/passwd".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid path component in archive entry: ../etc/passwd"
        );
        assert_eq!(err.error_code(), "UNSAFE_PATH");
    }

    #[test]
    fn test_missing_entry() {
        let err = ArchiveError::MissingEntry("storage/abc".to_string());
        assert_eq!(err.to_string(), "Archive entry storage/abc not found");
    }
}
