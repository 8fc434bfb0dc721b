//! Pre-flight validation failures
//!
//! Any of these aborts an import before a single row is written.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntegrityError {
    /// `data/account.json` is absent
    #[error("Archive has no root account document")]
    MissingRoot,

    /// `data/account.json` could not be parsed
    #[error("Root account document is unreadable: {0}")]
    UnreadableRoot(String),

    /// A document belongs to a different account than the root
    #[error("{path} references account {account_id}, expected {expected}")]
    ForeignAccount {
        path: String,
        account_id: String,
        expected: String,
    },

    /// A foreign key points at an id the archive does not contain
    #[error("{path} references {field} {id} which is not in the archive")]
    DanglingReference {
        path: String,
        field: String,
        id: String,
    },

    /// A document has no usable `id`
    #[error("{path} has no id")]
    MissingIdentifier { path: String },

    /// A polymorphic type tag is not recognised (strict mode only)
    #[error("{path} has unrecognised {field} '{tag}'")]
    UnknownPolymorphicType {
        path: String,
        field: String,
        tag: String,
    },

    /// A polymorphic pair addresses an id absent from the archive (strict mode only)
    #[error("{path} references {tag} {id} which is not in the archive")]
    DanglingPolymorphicReference {
        path: String,
        tag: String,
        id: String,
    },

    /// An embedded rich-text object does not exist in the target tenant
    #[error("Rich text {rich_text} embeds {tag} {id} which does not exist")]
    UnresolvedEmbed {
        rich_text: String,
        tag: String,
        id: String,
    },
}

impl IntegrityError {
    pub fn error_code(&self) -> &'static str {
        match self {
            IntegrityError::MissingRoot => "MISSING_ROOT",
            IntegrityError::UnreadableRoot(_) => "UNREADABLE_ROOT",
            IntegrityError::ForeignAccount { .. } => "FOREIGN_ACCOUNT",
            IntegrityError::DanglingReference { .. } => "DANGLING_REFERENCE",
            IntegrityError::MissingIdentifier { .. } => "MISSING_IDENTIFIER",
            IntegrityError::UnknownPolymorphicType { .. } => "UNKNOWN_POLYMORPHIC_TYPE",
            IntegrityError::DanglingPolymorphicReference { .. } => {
                "DANGLING_POLYMORPHIC_REFERENCE"
            }
            IntegrityError::UnresolvedEmbed { .. } => "UNRESOLVED_EMBED",
        }
    }
}
