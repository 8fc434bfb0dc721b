//! Static dispatch for polymorphic (type tag, id) pairs.

use super::entity_kind::{EntityKind, PolymorphicField};
use crate::archive::{id_value, Attributes};

/// Entropy containers may point at the account itself. The importer rewrites these
/// to the target account; they never go through the translator.
pub const ACCOUNT_CONTAINER_TAG: &str = "Account";

const POLYMORPHIC_TYPES: &[(&str, EntityKind)] = &[
    ("Card", EntityKind::Cards),
    ("Comment", EntityKind::Comments),
    ("Board", EntityKind::Boards),
    ("User", EntityKind::Users),
    ("Tag", EntityKind::Tags),
    ("Assignment", EntityKind::Assignments),
    ("Tagging", EntityKind::Taggings),
    ("Closure", EntityKind::Closures),
    ("Step", EntityKind::Steps),
    ("Watch", EntityKind::Watches),
    ("Pin", EntityKind::Pins),
    ("Reaction", EntityKind::Reactions),
    ("Mention", EntityKind::Mentions),
    ("Event", EntityKind::Events),
    ("Access", EntityKind::Accesses),
    ("Webhook", EntityKind::Webhooks),
    ("Webhook::Delivery", EntityKind::WebhookDeliveries),
    ("Card::Goldness", EntityKind::CardGoldnesses),
    ("Card::NotNow", EntityKind::CardNotNows),
    ("Card::ActivitySpike", EntityKind::CardActivitySpikes),
    ("Blob", EntityKind::Blobs),
    ("Attachment", EntityKind::Attachments),
    ("RichText", EntityKind::RichTexts),
];

/// Entity type addressed by a polymorphic type tag, if the tag is recognised.
pub fn resolve_type_tag(tag: &str) -> Option<EntityKind> {
    POLYMORPHIC_TYPES
        .iter()
        .find(|(candidate, _)| *candidate == tag)
        .map(|(_, kind)| *kind)
}

/// A polymorphic pair read out of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolymorphicReference {
    pub tag: String,
    pub id: String,
}

impl PolymorphicReference {
    /// Reads the pair; `None` when either half is missing or null.
    pub fn read(document: &Attributes, field: PolymorphicField) -> Option<Self> {
        let tag = document.get(field.type_field)?.as_str()?.to_string();
        let id = document.get(field.id_field).and_then(id_value)?;
        Some(Self { tag, id })
    }

    pub fn target(&self) -> Option<EntityKind> {
        resolve_type_tag(&self.tag)
    }

    pub fn is_account_container(&self) -> bool {
        self.tag == ACCOUNT_CONTAINER_TAG
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_table_matches_entity_tags() {
        for (tag, kind) in POLYMORPHIC_TYPES {
            assert_eq!(kind.type_tag(), *tag);
        }
        assert_eq!(POLYMORPHIC_TYPES.len(), 23);
    }

    #[test]
    fn test_resolve_type_tag() {
        assert_eq!(
            resolve_type_tag("Webhook::Delivery"),
            Some(EntityKind::WebhookDeliveries)
        );
        assert_eq!(resolve_type_tag("Card"), Some(EntityKind::Cards));
        assert_eq!(resolve_type_tag("Account"), None);
        assert_eq!(resolve_type_tag("Board::Publication"), None);
    }

    #[test]
    fn test_read_reference() {
        let field = EntityKind::Events.polymorphic_field().unwrap();
        let document = json!({"eventable_type": "Card", "eventable_id": "c-1"});
        let reference = PolymorphicReference::read(document.as_object().unwrap(), field).unwrap();
        assert_eq!(reference.target(), Some(EntityKind::Cards));
        assert_eq!(reference.id, "c-1");

        let missing = json!({"eventable_type": "Card", "eventable_id": null});
        assert!(PolymorphicReference::read(missing.as_object().unwrap(), field).is_none());
    }
}
