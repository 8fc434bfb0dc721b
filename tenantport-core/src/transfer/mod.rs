//! The migration engine: identifier translation, archive validation, phased import,
//! rich-text rewriting and export generation.

mod entity_kind;
pub mod ensure;
pub mod exporter;
pub mod importer;
pub mod polymorphic;
pub mod records;
pub mod rich_text;
pub mod translator;
pub mod validator;

pub use entity_kind::{EntityKind, ForeignKeys, Phase, PolymorphicField};
pub use ensure::Ensured;
pub use exporter::{ExportKind, ExportSummary, Exporter};
pub use importer::{
    copy_blob_files, discard_uploads, ImportSummary, PhasedImporter, SYSTEM_ROLE,
};
pub use polymorphic::{resolve_type_tag, PolymorphicReference, ACCOUNT_CONTAINER_TAG};
pub use rich_text::{to_portable_body, EmbeddedReference, RewrittenBody, RichTextRewriter};
pub use translator::IdTranslator;
pub use validator::{ArchiveIndex, IntegrityValidator};
