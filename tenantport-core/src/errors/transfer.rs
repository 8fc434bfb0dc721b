//! Import and export engine errors

use thiserror::Error;

use super::{ArchiveError, IntegrityError, StorageError};
use crate::transfer::EntityKind;

#[derive(Error, Debug)]
pub enum TransferError {
    /// The archive failed validation
    #[error("Integrity error: {0}")]
    Integrity(#[from] IntegrityError),

    /// The zip container could not be read or written
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// Attachment store failure
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Database error, including uniqueness and foreign key violations
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A document could not be turned into a row
    #[error("Document {path} is invalid: {reason}")]
    InvalidDocument { path: String, reason: String },

    /// A translated pair was mapped a second time to a different target
    #[error("{kind} {source_id} is already mapped to {existing}, refusing {attempted}")]
    IdentifierReassigned {
        kind: EntityKind,
        source_id: String,
        existing: String,
        attempted: String,
    },

    /// The target account lacks its system user
    #[error("Account {0} has no system user")]
    MissingSystemUser(String),

    /// A row the engine depends on is missing
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// A status transition was requested from the wrong state
    #[error("{entity} {id} is {status}, expected {expected}")]
    InvalidState {
        entity: &'static str,
        id: String,
        status: String,
        expected: String,
    },
}

impl TransferError {
    pub fn is_integrity(&self) -> bool {
        matches!(self, TransferError::Integrity(_))
    }

    /// Errors caused by the archive content rather than the environment
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            TransferError::Integrity(_)
                | TransferError::InvalidDocument { .. }
                | TransferError::Serialization(_)
                | TransferError::Archive(ArchiveError::UnsafePath(_))
        )
    }

    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            TransferError::Storage(_) | TransferError::Io(_) | TransferError::Database(_)
        )
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            TransferError::Integrity(_) => "INTEGRITY_ERROR",
            TransferError::Archive(_) => "ARCHIVE_ERROR",
            TransferError::Storage(_) => "STORAGE_ERROR",
            TransferError::Database(_) => "DATABASE_ERROR",
            TransferError::Serialization(_) => "SERIALIZATION_ERROR",
            TransferError::Io(_) => "IO_ERROR",
            TransferError::InvalidDocument { .. } => "INVALID_DOCUMENT",
            TransferError::IdentifierReassigned { .. } => "IDENTIFIER_REASSIGNED",
            TransferError::MissingSystemUser(_) => "MISSING_SYSTEM_USER",
            TransferError::NotFound { .. } => "NOT_FOUND",
            TransferError::InvalidState { .. } => "INVALID_STATE",
        }
    }

    pub fn invalid_document(path: impl Into<String>, reason: impl Into<String>) -> Self {
        TransferError::InvalidDocument {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integrity_wrapping() {
        let err: TransferError = IntegrityError::MissingRoot.into();
        assert!(err.is_integrity());
        assert!(err.is_client_error());
        assert_eq!(
            err.to_string(),
            "Integrity error: Archive has no root account document"
        );
    }

    #[test]
    fn test_identifier_reassigned() {
        let err = TransferError::IdentifierReassigned {
            kind: EntityKind::Cards,
            source_id: "a".to_string(),
            existing: "b".to_string(),
            attempted: "c".to_string(),
        };
        assert_eq!(err.to_string(), "cards a is already mapped to b, refusing c");
        assert_eq!(err.error_code(), "IDENTIFIER_REASSIGNED");
    }

    #[test]
    fn test_database_is_server_error() {
        let err = TransferError::Database(sea_orm::DbErr::Custom("locked".to_string()));
        assert!(err.is_server_error());
        assert!(!err.is_client_error());
    }
}
