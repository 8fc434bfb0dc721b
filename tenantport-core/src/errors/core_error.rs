use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;

use super::{ArchiveError, StorageError, TransferError};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CoreErrorKind {
    NotFound,
    Validation,
    Conflict,
    Integrity,
    Unavailable,
    Internal,
}

#[derive(Debug)]
pub struct CoreError {
    kind: CoreErrorKind,
    message: String,
    fields: Option<BTreeMap<String, String>>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl CoreError {
    pub fn new(kind: CoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            fields: None,
            source: None,
        }
    }

    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert("entity".to_string(), entity.into());
        fields.insert("id".to_string(), id.into());

        Self {
            kind: CoreErrorKind::NotFound,
            message: "Resource not found".to_string(),
            fields: Some(fields),
            source: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::Validation, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::Conflict, message)
    }

    pub fn integrity(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::Integrity, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::Unavailable, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::Internal, message)
    }

    pub fn with_fields(mut self, fields: BTreeMap<String, String>) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> CoreErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn fields(&self) -> Option<&BTreeMap<String, String>> {
        self.fields.as_ref()
    }

    /// Stable code for logs and CLI exit reporting
    pub fn error_code(&self) -> &'static str {
        match self.kind {
            CoreErrorKind::NotFound => "NOT_FOUND",
            CoreErrorKind::Validation => "VALIDATION_FAILED",
            CoreErrorKind::Conflict => "CONFLICT",
            CoreErrorKind::Integrity => "INTEGRITY_ERROR",
            CoreErrorKind::Unavailable => "UNAVAILABLE",
            CoreErrorKind::Internal => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl StdError for CoreError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<anyhow::Error> for CoreError {
    fn from(err: anyhow::Error) -> Self {
        let message = format!("Unhandled error: {}", err);
        CoreError::internal(message).with_source(AnyhowSource(err))
    }
}

impl From<sea_orm::DbErr> for CoreError {
    fn from(err: sea_orm::DbErr) -> Self {
        CoreError::internal(format!("Database error: {}", err)).with_source(err)
    }
}

impl From<TransferError> for CoreError {
    fn from(err: TransferError) -> Self {
        let kind = match &err {
            TransferError::Integrity(_) => CoreErrorKind::Integrity,
            TransferError::NotFound { .. } => CoreErrorKind::NotFound,
            TransferError::InvalidState { .. } => CoreErrorKind::Conflict,
            TransferError::Storage(_) => CoreErrorKind::Unavailable,
            TransferError::InvalidDocument { .. } | TransferError::Archive(_) => {
                CoreErrorKind::Validation
            }
            _ => CoreErrorKind::Internal,
        };
        let mut fields = BTreeMap::new();
        fields.insert("code".to_string(), err.error_code().to_string());

        CoreError::new(kind, err.to_string())
            .with_fields(fields)
            .with_source(err)
    }
}

impl From<StorageError> for CoreError {
    fn from(err: StorageError) -> Self {
        TransferError::from(err).into()
    }
}

impl From<ArchiveError> for CoreError {
    fn from(err: ArchiveError) -> Self {
        TransferError::from(err).into()
    }
}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        CoreError::unavailable(format!("IO error: {}", err)).with_source(err)
    }
}

/// Adapter so an `anyhow::Error` can sit in the boxed source slot.
#[derive(Debug)]
struct AnyhowSource(anyhow::Error);

impl fmt::Display for AnyhowSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StdError for AnyhowSource {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::IntegrityError;

    #[test]
    fn test_not_found_fields() {
        let err = CoreError::not_found("Import", "abc");
        assert_eq!(err.kind(), CoreErrorKind::NotFound);
        let fields = err.fields().unwrap();
        assert_eq!(fields.get("entity").map(String::as_str), Some("Import"));
        assert_eq!(fields.get("id").map(String::as_str), Some("abc"));
        assert_eq!(err.to_string(), "NotFound: Resource not found");
    }

    #[test]
    fn test_transfer_error_maps_to_integrity_kind() {
        let err: CoreError = TransferError::from(IntegrityError::MissingRoot).into();
        assert_eq!(err.kind(), CoreErrorKind::Integrity);
        assert_eq!(err.error_code(), "INTEGRITY_ERROR");
        assert_eq!(
            err.fields().and_then(|f| f.get("code")).map(String::as_str),
            Some("INTEGRITY_ERROR")
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn test_anyhow_conversion_is_internal() {
        let err: CoreError = anyhow::anyhow!("boom").into();
        assert_eq!(err.kind(), CoreErrorKind::Internal);
        assert!(err.message().contains("boom"));
    }
}
