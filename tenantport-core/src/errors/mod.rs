//! Domain-specific error types for tenantport-core
//!
//! Each layer of the engine reports failures through its own error type so callers
//! can tell a corrupt archive apart from a storage outage or a database constraint.
//!
//! # Error Categories
//!
//! - **ArchiveError**: reading or writing the zip container itself
//! - **IntegrityError**: pre-flight rejection of an archive before anything is written
//! - **StorageError**: the attachment store
//! - **TransferError**: everything that can go wrong while importing or exporting
//! - **CoreError**: the structured error returned by services
//!
//! # Examples
//!
//! ```rust
//! use tenantport::errors::{IntegrityError, TransferError};
//!
//! let err: TransferError = IntegrityError::MissingRoot.into();
//! assert!(err.is_integrity());
//! assert_eq!(err.error_code(), "INTEGRITY_ERROR");
//! ```

pub mod archive;
pub mod core_error;
pub mod integrity;
pub mod storage;
pub mod transfer;

pub use archive::ArchiveError;
pub use core_error::{CoreError, CoreErrorKind};
pub use integrity::IntegrityError;
pub use storage::StorageError;
pub use transfer::TransferError;

/// Result type alias for service operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Result type alias for archive codec operations
pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Result type alias for import and export operations
pub type TransferResult<T> = Result<T, TransferError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_result_alias() {
        let result: CoreResult<()> = Err(CoreError::not_found("Import", "abc"));
        assert!(result.is_err());
    }

    #[test]
    fn test_transfer_result_alias() {
        let result: TransferResult<()> = Err(IntegrityError::MissingRoot.into());
        assert!(matches!(result, Err(TransferError::Integrity(_))));
    }
}
