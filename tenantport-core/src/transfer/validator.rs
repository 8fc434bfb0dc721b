//! Pre-flight archive validation.
//!
//! Runs over the whole archive before the import transaction opens, so a rejected
//! archive never touches the target tenant.

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use tracing::debug;

use super::entity_kind::EntityKind;
use super::polymorphic::PolymorphicReference;
use crate::archive::{ArchiveDocuments, Document, RootDocument};
use crate::errors::IntegrityError;

/// Foreign-key fields checked against the ids present in the archive.
pub const FOREIGN_KEY_VALIDATIONS: &[(&str, EntityKind)] = &[
    ("board_id", EntityKind::Boards),
    ("card_id", EntityKind::Cards),
    ("column_id", EntityKind::Columns),
    ("user_id", EntityKind::Users),
    ("creator_id", EntityKind::Users),
    ("assignee_id", EntityKind::Users),
    ("assigner_id", EntityKind::Users),
    ("closer_id", EntityKind::Users),
    ("mentioner_id", EntityKind::Users),
    ("mentionee_id", EntityKind::Users),
    ("reacter_id", EntityKind::Users),
    ("tag_id", EntityKind::Tags),
    ("comment_id", EntityKind::Comments),
    ("webhook_id", EntityKind::Webhooks),
    ("event_id", EntityKind::Events),
    ("blob_id", EntityKind::Blobs),
    ("filter_id", EntityKind::Filters),
];

/// Ids present in an archive, per entity type.
#[derive(Debug, Default)]
pub struct ArchiveIndex {
    ids: HashMap<EntityKind, HashSet<String>>,
}

impl ArchiveIndex {
    pub fn build(documents: &ArchiveDocuments) -> Result<Self, IntegrityError> {
        let mut index = Self::default();
        for document in documents.iter() {
            let id = document
                .source_id()
                .ok_or_else(|| IntegrityError::MissingIdentifier {
                    path: document.path.clone(),
                })?;
            index.ids.entry(document.kind).or_default().insert(id);
        }
        Ok(index)
    }

    pub fn contains(&self, kind: EntityKind, id: &str) -> bool {
        self.ids.get(&kind).is_some_and(|ids| ids.contains(id))
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        self.ids.get(&kind).map(HashSet::len).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IntegrityValidator {
    strict_polymorphic: bool,
}

impl IntegrityValidator {
    pub fn new(strict_polymorphic: bool) -> Self {
        Self { strict_polymorphic }
    }

    /// Checks account scope then foreign keys of every document. The first violation
    /// found is returned.
    pub fn validate(
        &self,
        root: &RootDocument,
        documents: &ArchiveDocuments,
    ) -> Result<ArchiveIndex, IntegrityError> {
        let index = ArchiveIndex::build(documents)?;

        for document in documents.iter() {
            check_account_scope(document, &root.id)?;
            check_foreign_keys(document, &index)?;
            if self.strict_polymorphic {
                check_polymorphic(document, &index)?;
            }
        }

        debug!(
            documents = documents.len(),
            strict = self.strict_polymorphic,
            "Archive passed integrity validation"
        );
        Ok(index)
    }
}

fn check_account_scope(document: &Document, expected: &str) -> Result<(), IntegrityError> {
    if document.body.get("account_id").map_or(true, Value::is_null) {
        return Ok(());
    }
    match document.field("account_id") {
        Some(account_id) if account_id == expected => Ok(()),
        other => Err(IntegrityError::ForeignAccount {
            path: document.path.clone(),
            account_id: other.unwrap_or_else(|| "null".to_string()),
            expected: expected.to_string(),
        }),
    }
}

fn check_foreign_keys(document: &Document, index: &ArchiveIndex) -> Result<(), IntegrityError> {
    for (field, kind) in FOREIGN_KEY_VALIDATIONS {
        let Some(id) = document.field(field) else {
            continue;
        };
        if !index.contains(*kind, &id) {
            return Err(IntegrityError::DanglingReference {
                path: document.path.clone(),
                field: field.to_string(),
                id,
            });
        }
    }
    Ok(())
}

fn check_polymorphic(document: &Document, index: &ArchiveIndex) -> Result<(), IntegrityError> {
    let Some(field) = document.kind.polymorphic_field() else {
        return Ok(());
    };
    let Some(reference) = PolymorphicReference::read(&document.body, field) else {
        return Ok(());
    };
    if reference.is_account_container() && document.kind == EntityKind::Entropies {
        return Ok(());
    }
    let Some(kind) = reference.target() else {
        return Err(IntegrityError::UnknownPolymorphicType {
            path: document.path.clone(),
            field: field.type_field.to_string(),
            tag: reference.tag,
        });
    };
    if !index.contains(kind, &reference.id) {
        return Err(IntegrityError::DanglingPolymorphicReference {
            path: document.path.clone(),
            tag: reference.tag,
            id: reference.id,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{document_path, Attributes};
    use serde_json::{json, Value};

    fn root() -> RootDocument {
        RootDocument {
            id: "src".to_string(),
            name: "Source".to_string(),
            external_account_id: 1,
            join_code: None,
        }
    }

    fn documents(entries: Vec<(EntityKind, Value)>) -> ArchiveDocuments {
        let mut documents = ArchiveDocuments::default();
        for (kind, body) in entries {
            let body: Attributes = body.as_object().cloned().unwrap();
            let id = body["id"].as_str().unwrap().to_string();
            documents.push(Document {
                kind,
                path: document_path(kind, &id),
                body,
            });
        }
        documents
    }

    fn consistent() -> Vec<(EntityKind, Value)> {
        vec![
            (EntityKind::Users, json!({"id": "u1", "account_id": "src"})),
            (EntityKind::Boards, json!({"id": "b1", "account_id": "src", "creator_id": "u1"})),
            (
                EntityKind::Cards,
                json!({"id": "c1", "account_id": "src", "board_id": "b1", "column_id": null, "creator_id": "u1"}),
            ),
            (
                EntityKind::Events,
                json!({"id": "e1", "account_id": "src", "board_id": "b1", "creator_id": "u1",
                       "eventable_type": "Card", "eventable_id": "c1"}),
            ),
        ]
    }

    #[test]
    fn test_consistent_archive_passes() {
        let index = IntegrityValidator::new(true)
            .validate(&root(), &documents(consistent()))
            .unwrap();
        assert!(index.contains(EntityKind::Cards, "c1"));
        assert_eq!(index.count(EntityKind::Users), 1);
    }

    #[test]
    fn test_foreign_account_is_rejected() {
        let mut entries = consistent();
        entries.push((EntityKind::Tags, json!({"id": "t1", "account_id": "other"})));
        let err = IntegrityValidator::default()
            .validate(&root(), &documents(entries))
            .unwrap_err();
        assert!(matches!(err, IntegrityError::ForeignAccount { ref account_id, .. } if account_id == "other"));
    }

    #[test]
    fn test_null_account_is_treated_as_absent() {
        let mut entries = consistent();
        entries.push((EntityKind::Tags, json!({"id": "t1", "account_id": null})));
        assert!(IntegrityValidator::default()
            .validate(&root(), &documents(entries))
            .is_ok());
    }

    #[test]
    fn test_dangling_foreign_key_is_rejected() {
        let mut entries = consistent();
        entries.push((
            EntityKind::Comments,
            json!({"id": "m1", "account_id": "src", "card_id": "missing", "creator_id": "u1"}),
        ));
        let err = IntegrityValidator::default()
            .validate(&root(), &documents(entries))
            .unwrap_err();
        assert_eq!(
            err,
            IntegrityError::DanglingReference {
                path: "data/comments/m1.json".to_string(),
                field: "card_id".to_string(),
                id: "missing".to_string(),
            }
        );
    }

    #[test]
    fn test_unknown_polymorphic_tag_passes_unless_strict() {
        let mut entries = consistent();
        entries.push((
            EntityKind::Notifications,
            json!({"id": "n1", "account_id": "src", "user_id": "u1",
                   "source_type": "Gadget", "source_id": "g1"}),
        ));
        assert!(IntegrityValidator::new(false)
            .validate(&root(), &documents(entries.clone()))
            .is_ok());
        let err = IntegrityValidator::new(true)
            .validate(&root(), &documents(entries))
            .unwrap_err();
        assert!(matches!(err, IntegrityError::UnknownPolymorphicType { .. }));
    }

    #[test]
    fn test_strict_mode_rejects_dangling_polymorphic_id() {
        let mut entries = consistent();
        entries.push((
            EntityKind::Mentions,
            json!({"id": "x1", "account_id": "src", "mentioner_id": "u1", "mentionee_id": "u1",
                   "source_type": "Comment", "source_id": "gone"}),
        ));
        let err = IntegrityValidator::new(true)
            .validate(&root(), &documents(entries))
            .unwrap_err();
        assert!(matches!(err, IntegrityError::DanglingPolymorphicReference { .. }));
    }

    #[test]
    fn test_account_container_is_accepted_in_strict_mode() {
        let mut entries = consistent();
        entries.push((
            EntityKind::Entropies,
            json!({"id": "en1", "account_id": "src", "container_type": "Account",
                   "container_id": "src", "auto_postpone_period": 30}),
        ));
        assert!(IntegrityValidator::new(true)
            .validate(&root(), &documents(entries))
            .is_ok());
    }

    #[test]
    fn test_document_without_id_is_rejected() {
        let mut docs = documents(consistent());
        docs.push(Document {
            kind: EntityKind::Tags,
            path: "data/tags/broken.json".to_string(),
            body: json!({"title": "x"}).as_object().cloned().unwrap(),
        });
        let err = IntegrityValidator::default()
            .validate(&root(), &docs)
            .unwrap_err();
        assert!(matches!(err, IntegrityError::MissingIdentifier { .. }));
    }
}
