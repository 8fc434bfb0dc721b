//! Kind-dispatched row access.
//!
//! Archive documents are untyped; each operation here routes an [`EntityKind`] to its
//! sea-orm entity module and works through the typed `Model`.

use std::collections::BTreeMap;

use chrono::Utc;
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::Value;
use uuid::Uuid;

use super::entity_kind::EntityKind;
use crate::archive::Attributes;
use crate::errors::{TransferError, TransferResult};

/// Expands `$body` once per kind with `$table` bound to that kind's entity module.
macro_rules! with_entity {
    ($kind:expr, $table:ident => $body:expr) => {{
        use $crate::database::entities as tables;
        use $crate::transfer::EntityKind as Kind;
        match $kind {
            Kind::Users => { use tables::users as $table; $body }
            Kind::Tags => { use tables::tags as $table; $body }
            Kind::Boards => { use tables::boards as $table; $body }
            Kind::Columns => { use tables::columns as $table; $body }
            Kind::Entropies => { use tables::entropies as $table; $body }
            Kind::BoardPublications => { use tables::board_publications as $table; $body }
            Kind::Cards => { use tables::cards as $table; $body }
            Kind::Comments => { use tables::comments as $table; $body }
            Kind::Steps => { use tables::steps as $table; $body }
            Kind::Accesses => { use tables::accesses as $table; $body }
            Kind::Assignments => { use tables::assignments as $table; $body }
            Kind::Taggings => { use tables::taggings as $table; $body }
            Kind::Closures => { use tables::closures as $table; $body }
            Kind::CardGoldnesses => { use tables::card_goldnesses as $table; $body }
            Kind::CardNotNows => { use tables::card_not_nows as $table; $body }
            Kind::CardActivitySpikes => { use tables::card_activity_spikes as $table; $body }
            Kind::Watches => { use tables::watches as $table; $body }
            Kind::Pins => { use tables::pins as $table; $body }
            Kind::Reactions => { use tables::reactions as $table; $body }
            Kind::Mentions => { use tables::mentions as $table; $body }
            Kind::Filters => { use tables::filters as $table; $body }
            Kind::Webhooks => { use tables::webhooks as $table; $body }
            Kind::WebhookDelinquencyTrackers => {
                use tables::webhook_delinquency_trackers as $table;
                $body
            }
            Kind::WebhookDeliveries => { use tables::webhook_deliveries as $table; $body }
            Kind::Events => { use tables::events as $table; $body }
            Kind::Notifications => { use tables::notifications as $table; $body }
            Kind::NotificationBundles => { use tables::notification_bundles as $table; $body }
            Kind::Blobs => { use tables::blobs as $table; $body }
            Kind::Attachments => { use tables::attachments as $table; $body }
            Kind::RichTexts => { use tables::rich_texts as $table; $body }
        }
    }};
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Flat storage key for attachment bytes.
pub fn new_blob_key() -> String {
    Uuid::new_v4().simple().to_string()
}

fn timestamp_now() -> Value {
    Value::String(Utc::now().to_rfc3339())
}

/// Inserts `attributes` as a new row of `kind`.
pub async fn insert_row<C: ConnectionTrait>(
    db: &C,
    kind: EntityKind,
    attributes: Attributes,
    path: &str,
) -> TransferResult<()> {
    let document = Value::Object(attributes);
    with_entity!(kind, table => {
        let model: table::Model = serde_json::from_value(document)
            .map_err(|e| TransferError::invalid_document(path, e.to_string()))?;
        table::Entity::insert(table::ActiveModel::from(model))
            .exec(db)
            .await?;
    });
    Ok(())
}

/// Allocates a fresh id, fills missing timestamps, inserts, and returns the new id.
pub async fn insert_fresh<C: ConnectionTrait>(
    db: &C,
    kind: EntityKind,
    mut attributes: Attributes,
    path: &str,
) -> TransferResult<String> {
    let id = new_id();
    attributes.insert("id".to_string(), Value::String(id.clone()));
    for field in ["created_at", "updated_at"] {
        if attributes.get(field).map_or(true, Value::is_null) {
            attributes.insert(field.to_string(), timestamp_now());
        }
    }
    insert_row(db, kind, attributes, path).await?;
    Ok(id)
}

/// Every row of `kind` owned by `account_id`, as attribute maps.
pub async fn rows_for_account<C: ConnectionTrait>(
    db: &C,
    kind: EntityKind,
    account_id: &str,
) -> TransferResult<Vec<Attributes>> {
    let values: Vec<Value> = with_entity!(kind, table => {
        let models = table::Entity::find()
            .filter(table::Column::AccountId.eq(account_id))
            .all(db)
            .await?;
        models
            .into_iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?
    });

    Ok(values
        .into_iter()
        .filter_map(|value| match value {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect())
}

pub async fn count_for_account<C: ConnectionTrait>(
    db: &C,
    kind: EntityKind,
    account_id: &str,
) -> Result<u64, DbErr> {
    with_entity!(kind, table => {
        table::Entity::find()
            .filter(table::Column::AccountId.eq(account_id))
            .count(db)
            .await
    })
}

/// Row counts of every migrating kind for one account.
pub async fn counts_for_account<C: ConnectionTrait>(
    db: &C,
    account_id: &str,
) -> Result<BTreeMap<EntityKind, u64>, DbErr> {
    let mut counts = BTreeMap::new();
    for kind in EntityKind::in_import_order() {
        counts.insert(kind, count_for_account(db, kind, account_id).await?);
    }
    Ok(counts)
}

/// Whether a row of `kind` with `id` exists inside `account_id`.
pub async fn exists<C: ConnectionTrait>(
    db: &C,
    kind: EntityKind,
    account_id: &str,
    id: &str,
) -> Result<bool, DbErr> {
    let count = with_entity!(kind, table => {
        table::Entity::find()
            .filter(table::Column::Id.eq(id))
            .filter(table::Column::AccountId.eq(account_id))
            .count(db)
            .await?
    });
    Ok(count > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_utils::{seed_account, setup_test_db};
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_and_count_tags() {
        let db = setup_test_db().await;
        let account = seed_account(&db, "Acme").await;

        let attributes = json!({"account_id": account.id, "title": "urgent"})
            .as_object()
            .cloned()
            .unwrap();
        let id = insert_fresh(&db, EntityKind::Tags, attributes, "data/tags/t1.json")
            .await
            .unwrap();

        assert_eq!(
            count_for_account(&db, EntityKind::Tags, &account.id).await.unwrap(),
            1
        );
        assert!(exists(&db, EntityKind::Tags, &account.id, &id).await.unwrap());
        assert!(!exists(&db, EntityKind::Tags, "elsewhere", &id).await.unwrap());

        let rows = rows_for_account(&db, EntityKind::Tags, &account.id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["title"], json!("urgent"));
        assert_eq!(rows[0]["id"], json!(id));
    }

    #[tokio::test]
    async fn test_invalid_document_names_the_path() {
        let db = setup_test_db().await;
        let attributes = json!({"title": 12}).as_object().cloned().unwrap();
        let err = insert_fresh(&db, EntityKind::Tags, attributes, "data/tags/bad.json")
            .await
            .unwrap_err();
        match err {
            TransferError::InvalidDocument { path, .. } => assert_eq!(path, "data/tags/bad.json"),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
