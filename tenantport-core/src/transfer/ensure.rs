//! Idempotent "ensure a row exists for this natural key" operations.
//!
//! Some rows appear as a side effect of creating others (a board grants its creator
//! access, a card makes its creator a watcher). The importer goes through these
//! operations for both the side effects and the archived rows, so whichever arrives
//! second reuses the first.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
};
use serde_json::{json, Value};

use super::entity_kind::EntityKind;
use super::records;
use crate::archive::{id_value, Attributes};
use crate::database::entities::{accesses, entropies, identities, watches};
use crate::errors::{TransferError, TransferResult};

/// Outcome of an ensure or create step: the target id, and whether it is new.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ensured {
    Created(String),
    Reused(String),
}

impl Ensured {
    pub fn id(&self) -> &str {
        match self {
            Ensured::Created(id) | Ensured::Reused(id) => id,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Ensured::Created(_))
    }
}

fn required(attributes: &Attributes, field: &str, path: &str) -> TransferResult<String> {
    attributes
        .get(field)
        .and_then(id_value)
        .ok_or_else(|| TransferError::invalid_document(path, format!("missing {}", field)))
}

fn attributes(value: Value) -> Attributes {
    match value {
        Value::Object(map) => map,
        _ => Attributes::new(),
    }
}

/// Access on `(board_id, user_id)` within `account_id`.
pub async fn ensure_access<C: ConnectionTrait>(
    db: &C,
    account_id: &str,
    attributes: Attributes,
    path: &str,
) -> TransferResult<Ensured> {
    let board_id = required(&attributes, "board_id", path)?;
    let user_id = required(&attributes, "user_id", path)?;

    let existing = accesses::Entity::find()
        .filter(accesses::Column::AccountId.eq(account_id))
        .filter(accesses::Column::BoardId.eq(board_id.as_str()))
        .filter(accesses::Column::UserId.eq(user_id.as_str()))
        .one(db)
        .await?;
    if let Some(existing) = existing {
        return Ok(Ensured::Reused(existing.id));
    }

    let id = records::insert_fresh(db, EntityKind::Accesses, attributes, path).await?;
    Ok(Ensured::Created(id))
}

/// Access granted to a board's creator when the board is created.
pub async fn ensure_creator_access<C: ConnectionTrait>(
    db: &C,
    account_id: &str,
    board_id: &str,
    user_id: &str,
) -> TransferResult<Ensured> {
    let defaults = attributes(json!({
        "account_id": account_id,
        "board_id": board_id,
        "user_id": user_id,
        "involvement": "watching",
        "accessed_at": null,
    }));
    ensure_access(db, account_id, defaults, "accesses").await
}

/// Watch on `(card_id, user_id)` within `account_id`.
pub async fn ensure_watch<C: ConnectionTrait>(
    db: &C,
    account_id: &str,
    attributes: Attributes,
    path: &str,
) -> TransferResult<Ensured> {
    let card_id = required(&attributes, "card_id", path)?;
    let user_id = required(&attributes, "user_id", path)?;

    let existing = watches::Entity::find()
        .filter(watches::Column::AccountId.eq(account_id))
        .filter(watches::Column::CardId.eq(card_id.as_str()))
        .filter(watches::Column::UserId.eq(user_id.as_str()))
        .one(db)
        .await?;
    if let Some(existing) = existing {
        return Ok(Ensured::Reused(existing.id));
    }

    let id = records::insert_fresh(db, EntityKind::Watches, attributes, path).await?;
    Ok(Ensured::Created(id))
}

/// Watch subscribed for a card's creator when the card is created.
pub async fn ensure_creator_watch<C: ConnectionTrait>(
    db: &C,
    account_id: &str,
    card_id: &str,
    user_id: &str,
) -> TransferResult<Ensured> {
    let defaults = attributes(json!({
        "account_id": account_id,
        "card_id": card_id,
        "user_id": user_id,
        "watching": true,
    }));
    ensure_watch(db, account_id, defaults, "watches").await
}

/// Entropy on `(container_type, container_id)` within `account_id`. An existing row keeps
/// its id and takes the incoming `auto_postpone_period`.
pub async fn ensure_entropy<C: ConnectionTrait>(
    db: &C,
    account_id: &str,
    attributes: Attributes,
    path: &str,
) -> TransferResult<Ensured> {
    let container_type = required(&attributes, "container_type", path)?;
    let container_id = required(&attributes, "container_id", path)?;

    let existing = entropies::Entity::find()
        .filter(entropies::Column::AccountId.eq(account_id))
        .filter(entropies::Column::ContainerType.eq(container_type.as_str()))
        .filter(entropies::Column::ContainerId.eq(container_id.as_str()))
        .one(db)
        .await?;

    let Some(existing) = existing else {
        let id = records::insert_fresh(db, EntityKind::Entropies, attributes, path).await?;
        return Ok(Ensured::Created(id));
    };

    let id = existing.id.clone();
    if let Some(period) = attributes.get("auto_postpone_period").and_then(Value::as_i64) {
        let mut active: entropies::ActiveModel = existing.into();
        active.auto_postpone_period = Set(period);
        active.updated_at = Set(Utc::now());
        active.update(db).await?;
    }
    Ok(Ensured::Reused(id))
}

/// Global identity for an email address, created on first use.
pub async fn ensure_identity<C: ConnectionTrait>(
    db: &C,
    email_address: &str,
) -> TransferResult<identities::Model> {
    let email_address = email_address.trim().to_lowercase();
    let existing = identities::Entity::find()
        .filter(identities::Column::EmailAddress.eq(email_address.as_str()))
        .one(db)
        .await?;
    if let Some(identity) = existing {
        return Ok(identity);
    }

    let now = Utc::now();
    let identity = identities::ActiveModel {
        id: Set(records::new_id()),
        email_address: Set(email_address),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;
    Ok(identity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_utils::{seed_account, setup_test_db};
    use sea_orm::PaginatorTrait;

    #[tokio::test]
    async fn test_ensure_entropy_merges_on_container() {
        let db = setup_test_db().await;
        let account = seed_account(&db, "Acme").await;

        let first = attributes(json!({
            "account_id": account.id,
            "container_type": "Account",
            "container_id": account.id,
            "auto_postpone_period": 30,
        }));
        let created = ensure_entropy(&db, &account.id, first, "e1").await.unwrap();
        assert!(created.is_created());

        let second = attributes(json!({
            "account_id": account.id,
            "container_type": "Account",
            "container_id": account.id,
            "auto_postpone_period": 7,
        }));
        let reused = ensure_entropy(&db, &account.id, second, "e2").await.unwrap();
        assert_eq!(reused, Ensured::Reused(created.id().to_string()));

        let row = entropies::Entity::find_by_id(created.id().to_string())
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.auto_postpone_period, 7);
        assert_eq!(entropies::Entity::find().count(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_ensure_entropy_ignores_other_accounts() {
        let db = setup_test_db().await;
        let owner = seed_account(&db, "Acme").await;
        let other = seed_account(&db, "Globex").await;

        let original = attributes(json!({
            "account_id": owner.id,
            "container_type": "Board",
            "container_id": "board-1",
            "auto_postpone_period": 30,
        }));
        let owned = ensure_entropy(&db, &owner.id, original, "e1").await.unwrap();

        let incoming = attributes(json!({
            "account_id": other.id,
            "container_type": "Board",
            "container_id": "board-1",
            "auto_postpone_period": 1,
        }));
        let result = ensure_entropy(&db, &other.id, incoming, "e2").await;
        assert!(!matches!(result, Ok(Ensured::Reused(_))));

        let row = entropies::Entity::find_by_id(owned.id().to_string())
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.account_id, owner.id);
        assert_eq!(row.auto_postpone_period, 30);
    }

    #[tokio::test]
    async fn test_ensure_identity_is_case_insensitive() {
        let db = setup_test_db().await;
        let first = ensure_identity(&db, "Kim@Example.com").await.unwrap();
        let second = ensure_identity(&db, " kim@example.com ").await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.email_address, "kim@example.com");
    }

    #[tokio::test]
    async fn test_ensure_access_requires_natural_key() {
        let db = setup_test_db().await;
        let err = ensure_access(&db, "acct", attributes(json!({"board_id": "b"})), "data/accesses/a.json")
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::InvalidDocument { .. }));
    }
}
