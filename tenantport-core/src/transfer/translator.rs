//! Per-import source id -> target id tables.

use std::collections::HashMap;

use serde_json::Value;

use super::entity_kind::{EntityKind, ForeignKeys};
use crate::archive::{id_value, Attributes};
use crate::errors::{TransferError, TransferResult};

/// User-referencing fields that recur across many entity types.
pub const USER_FOREIGN_KEYS: ForeignKeys = &[
    ("user_id", EntityKind::Users),
    ("creator_id", EntityKind::Users),
    ("assignee_id", EntityKind::Users),
    ("assigner_id", EntityKind::Users),
    ("closer_id", EntityKind::Users),
    ("mentioner_id", EntityKind::Users),
    ("mentionee_id", EntityKind::Users),
    ("reacter_id", EntityKind::Users),
];

/// Translation state for a single import. Owned by the importer that created it and
/// dropped when that import ends.
#[derive(Debug)]
pub struct IdTranslator {
    target_account_id: String,
    tables: HashMap<EntityKind, HashMap<String, String>>,
}

impl IdTranslator {
    pub fn new(target_account_id: impl Into<String>) -> Self {
        Self {
            target_account_id: target_account_id.into(),
            tables: HashMap::new(),
        }
    }

    pub fn target_account_id(&self) -> &str {
        &self.target_account_id
    }

    /// Records `source_id -> target_id`. A pair, once mapped, never changes target.
    pub fn map(
        &mut self,
        kind: EntityKind,
        source_id: impl Into<String>,
        target_id: impl Into<String>,
    ) -> TransferResult<()> {
        let source_id = source_id.into();
        let target_id = target_id.into();
        let table = self.tables.entry(kind).or_default();

        match table.get(&source_id) {
            Some(existing) if *existing != target_id => Err(TransferError::IdentifierReassigned {
                kind,
                source_id,
                existing: existing.clone(),
                attempted: target_id,
            }),
            Some(_) => Ok(()),
            None => {
                table.insert(source_id, target_id);
                Ok(())
            }
        }
    }

    /// Target id for `source_id`, or `source_id` itself when unmapped.
    pub fn lookup(&self, kind: EntityKind, source_id: &str) -> String {
        self.get(kind, source_id)
            .unwrap_or(source_id)
            .to_string()
    }

    pub fn get(&self, kind: EntityKind, source_id: &str) -> Option<&str> {
        self.tables
            .get(&kind)
            .and_then(|table| table.get(source_id))
            .map(String::as_str)
    }

    pub fn is_mapped(&self, kind: EntityKind, source_id: &str) -> bool {
        self.get(kind, source_id).is_some()
    }

    pub fn mapped_count(&self, kind: EntityKind) -> usize {
        self.tables.get(&kind).map(HashMap::len).unwrap_or(0)
    }

    /// Copy of `document` with `account_id` pointed at the target account and every
    /// declared foreign key passed through [`lookup`](Self::lookup). Absent or null
    /// fields stay as they are.
    pub fn remap(&self, document: &Attributes, foreign_keys: ForeignKeys) -> Attributes {
        let mut remapped = document.clone();
        if remapped.contains_key("account_id") {
            remapped.insert(
                "account_id".to_string(),
                Value::String(self.target_account_id.clone()),
            );
        }
        for (field, kind) in foreign_keys {
            if let Some(source_id) = remapped.get(*field).and_then(id_value) {
                let target = self.lookup(*kind, &source_id);
                remapped.insert(field.to_string(), Value::String(target));
            }
        }
        remapped
    }

    /// [`remap`](Self::remap) with the recurring user fields declared as well.
    pub fn remap_with_users(&self, document: &Attributes, foreign_keys: ForeignKeys) -> Attributes {
        let remapped = self.remap(document, USER_FOREIGN_KEYS);
        self.remap(&remapped, foreign_keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Attributes {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_lookup_passes_through_unmapped_ids() {
        let mut translator = IdTranslator::new("target");
        translator.map(EntityKind::Boards, "b1", "B1").unwrap();
        assert_eq!(translator.lookup(EntityKind::Boards, "b1"), "B1");
        assert_eq!(translator.lookup(EntityKind::Boards, "b2"), "b2");
        assert_eq!(translator.lookup(EntityKind::Cards, "b1"), "b1");
        assert!(translator.is_mapped(EntityKind::Boards, "b1"));
        assert!(!translator.is_mapped(EntityKind::Cards, "b1"));
    }

    #[test]
    fn test_mapping_is_immutable() {
        let mut translator = IdTranslator::new("target");
        translator.map(EntityKind::Cards, "c1", "C1").unwrap();
        translator.map(EntityKind::Cards, "c1", "C1").unwrap();
        let err = translator.map(EntityKind::Cards, "c1", "C2").unwrap_err();
        assert!(matches!(err, TransferError::IdentifierReassigned { .. }));
        assert_eq!(translator.lookup(EntityKind::Cards, "c1"), "C1");
        assert_eq!(translator.mapped_count(EntityKind::Cards), 1);
    }

    #[test]
    fn test_remap_rewrites_account_and_declared_keys() {
        let mut translator = IdTranslator::new("target");
        translator.map(EntityKind::Boards, "b1", "B1").unwrap();
        translator.map(EntityKind::Columns, "col1", "COL1").unwrap();

        let source = doc(json!({
            "id": "c1",
            "account_id": "source",
            "board_id": "b1",
            "column_id": null,
            "title": "hello"
        }));
        let remapped = translator.remap(&source, EntityKind::Cards.foreign_keys());
        assert_eq!(remapped["account_id"], json!("target"));
        assert_eq!(remapped["board_id"], json!("B1"));
        assert_eq!(remapped["column_id"], json!(null));
        assert_eq!(remapped["id"], json!("c1"));
        assert_eq!(source["board_id"], json!("b1"));
    }

    #[test]
    fn test_remap_leaves_absent_fields_absent() {
        let translator = IdTranslator::new("target");
        let remapped = translator.remap(&doc(json!({"title": "x"})), EntityKind::Cards.foreign_keys());
        assert!(!remapped.contains_key("account_id"));
        assert!(!remapped.contains_key("board_id"));
    }

    #[test]
    fn test_remap_with_users() {
        let mut translator = IdTranslator::new("target");
        translator.map(EntityKind::Users, "u1", "U1").unwrap();
        translator.map(EntityKind::Users, "u2", "U2").unwrap();
        translator.map(EntityKind::Cards, "c1", "C1").unwrap();

        let source = doc(json!({
            "card_id": "c1",
            "assignee_id": "u1",
            "assigner_id": "u2"
        }));
        let remapped =
            translator.remap_with_users(&source, EntityKind::Assignments.foreign_keys());
        assert_eq!(remapped["card_id"], json!("C1"));
        assert_eq!(remapped["assignee_id"], json!("U1"));
        assert_eq!(remapped["assigner_id"], json!("U2"));
    }
}
