use thiserror::Error;

/// Attachment store failures
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Stored object '{0}' not found")]
    NotFound(String),

    #[error("Invalid storage key '{0}'")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            StorageError::NotFound(_) => "STORAGE_NOT_FOUND",
            StorageError::InvalidKey(_) => "STORAGE_INVALID_KEY",
            StorageError::Io(_) => "STORAGE_IO_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found() {
        let err = StorageError::NotFound("exports/1.zip".to_string());
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Stored object 'exports/1.zip' not found");
    }
}
