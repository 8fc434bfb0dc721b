use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Import phases, executed in declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
pub enum Phase {
    Foundation,
    Users,
    Basic,
    Content,
    Relationships,
    Webhooks,
    Activity,
    Storage,
}

/// Every entity type that travels in an archive.
///
/// Variants are declared in import order, so iterating [`EntityKind::iter`] walks the
/// dependency graph leaves first. The snake_case name doubles as the archive directory
/// under `data/` and as the translator table key.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntityKind {
    Users,
    Tags,
    Boards,
    Columns,
    Entropies,
    BoardPublications,
    Cards,
    Comments,
    Steps,
    Accesses,
    Assignments,
    Taggings,
    Closures,
    CardGoldnesses,
    CardNotNows,
    CardActivitySpikes,
    Watches,
    Pins,
    Reactions,
    Mentions,
    Filters,
    Webhooks,
    WebhookDelinquencyTrackers,
    WebhookDeliveries,
    Events,
    Notifications,
    NotificationBundles,
    Blobs,
    Attachments,
    RichTexts,
}

/// Declared `{field -> entity type}` foreign keys of a document.
pub type ForeignKeys = &'static [(&'static str, EntityKind)];

/// The (type tag, id) field pair of a polymorphic association.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PolymorphicField {
    pub type_field: &'static str,
    pub id_field: &'static str,
}

const fn poly(type_field: &'static str, id_field: &'static str) -> Option<PolymorphicField> {
    Some(PolymorphicField {
        type_field,
        id_field,
    })
}

use EntityKind::*;

impl EntityKind {
    /// Archive directory name under `data/`.
    pub fn directory(self) -> &'static str {
        self.into()
    }

    pub fn from_directory(directory: &str) -> Option<Self> {
        directory.parse().ok()
    }

    /// All kinds in import order.
    pub fn in_import_order() -> impl Iterator<Item = EntityKind> {
        EntityKind::iter()
    }

    pub fn phase(self) -> Phase {
        match self {
            Users => Phase::Users,
            Tags | Boards | Columns | Entropies | BoardPublications => Phase::Basic,
            Cards | Comments | Steps => Phase::Content,
            Accesses | Assignments | Taggings | Closures | CardGoldnesses | CardNotNows
            | CardActivitySpikes | Watches | Pins | Reactions | Mentions | Filters => {
                Phase::Relationships
            }
            Webhooks | WebhookDelinquencyTrackers | WebhookDeliveries => Phase::Webhooks,
            Events | Notifications | NotificationBundles => Phase::Activity,
            Blobs | Attachments | RichTexts => Phase::Storage,
        }
    }

    /// Tag used for this kind in polymorphic `*_type` fields and `gid://` references.
    pub fn type_tag(self) -> &'static str {
        match self {
            Users => "User",
            Tags => "Tag",
            Boards => "Board",
            Columns => "Column",
            Entropies => "Entropy",
            BoardPublications => "Board::Publication",
            Cards => "Card",
            Comments => "Comment",
            Steps => "Step",
            Accesses => "Access",
            Assignments => "Assignment",
            Taggings => "Tagging",
            Closures => "Closure",
            CardGoldnesses => "Card::Goldness",
            CardNotNows => "Card::NotNow",
            CardActivitySpikes => "Card::ActivitySpike",
            Watches => "Watch",
            Pins => "Pin",
            Reactions => "Reaction",
            Mentions => "Mention",
            Filters => "Filter",
            Webhooks => "Webhook",
            WebhookDelinquencyTrackers => "Webhook::DelinquencyTracker",
            WebhookDeliveries => "Webhook::Delivery",
            Events => "Event",
            Notifications => "Notification",
            NotificationBundles => "Notification::Bundle",
            Blobs => "Blob",
            Attachments => "Attachment",
            RichTexts => "RichText",
        }
    }

    /// Non-user foreign keys remapped at creation time.
    pub fn foreign_keys(self) -> ForeignKeys {
        match self {
            Columns | BoardPublications | Accesses | Webhooks | Events => &[("board_id", Boards)],
            Cards => &[("board_id", Boards), ("column_id", Columns)],
            Comments | Steps | Assignments | Closures | CardGoldnesses | CardNotNows
            | CardActivitySpikes | Watches | Pins => &[("card_id", Cards)],
            Taggings => &[("card_id", Cards), ("tag_id", Tags)],
            Reactions => &[("comment_id", Comments)],
            WebhookDelinquencyTrackers | WebhookDeliveries => &[("webhook_id", Webhooks)],
            Attachments => &[("blob_id", Blobs)],
            Users | Tags | Boards | Entropies | Mentions | Filters | Notifications
            | NotificationBundles | Blobs | RichTexts => &[],
        }
    }

    /// Foreign keys that point at rows created in a later phase.
    pub fn deferred_keys(self) -> ForeignKeys {
        match self {
            WebhookDeliveries => &[("event_id", Events)],
            _ => &[],
        }
    }

    /// Whether documents of this kind carry user-referencing fields.
    pub fn remaps_users(self) -> bool {
        matches!(
            self,
            Boards
                | Cards
                | Comments
                | Accesses
                | Assignments
                | Closures
                | CardNotNows
                | Watches
                | Pins
                | Reactions
                | Mentions
                | Filters
                | Events
                | Notifications
                | NotificationBundles
        )
    }

    pub fn polymorphic_field(self) -> Option<PolymorphicField> {
        match self {
            Entropies => poly("container_type", "container_id"),
            Mentions | Notifications => poly("source_type", "source_id"),
            Events => poly("eventable_type", "eventable_id"),
            Attachments | RichTexts => poly("record_type", "record_id"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directories_round_trip() {
        assert_eq!(CardGoldnesses.directory(), "card_goldnesses");
        assert_eq!(WebhookDelinquencyTrackers.directory(), "webhook_delinquency_trackers");
        assert_eq!(EntityKind::from_directory("rich_texts"), Some(RichTexts));
        assert_eq!(EntityKind::from_directory("account"), None);
    }

    #[test]
    fn test_import_order_is_phase_monotonic() {
        let kinds: Vec<EntityKind> = EntityKind::in_import_order().collect();
        assert_eq!(kinds.len(), 30);
        assert_eq!(kinds.first(), Some(&Users));
        assert_eq!(kinds.last(), Some(&RichTexts));
        for pair in kinds.windows(2) {
            assert!(pair[0].phase() <= pair[1].phase(), "{:?}", pair);
        }
    }

    #[test]
    fn test_foreign_keys_point_at_earlier_kinds() {
        for kind in EntityKind::in_import_order() {
            for (field, target) in kind.foreign_keys() {
                assert!(*target < kind, "{kind}.{field} -> {target}");
            }
            for (_, target) in kind.deferred_keys() {
                assert!(*target > kind);
            }
        }
    }
}
