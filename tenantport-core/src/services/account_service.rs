use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use crate::database::entities::{account_join_codes, accounts, entropies, identities, users};
use crate::errors::{CoreError, CoreResult};
use crate::transfer::records::new_id;
use crate::transfer::{EntityKind, ACCOUNT_CONTAINER_TAG, SYSTEM_ROLE};

pub const OWNER_ROLE: &str = "owner";
pub const MEMBER_ROLE: &str = "member";
pub const SYSTEM_USER_NAME: &str = "System";

const FIRST_EXTERNAL_ACCOUNT_ID: i64 = 1_000_001;
const DEFAULT_JOIN_CODE_LIMIT: i64 = 10;
const DEFAULT_AUTO_POSTPONE_PERIOD: i64 = 30 * 24 * 60 * 60;
const JOIN_CODE_ATTEMPTS: usize = 8;

/// A freshly created tenant and the rows created with it.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub account: accounts::Model,
    pub join_code: account_join_codes::Model,
    pub system_user: users::Model,
    pub owner: users::Model,
}

#[derive(Clone)]
pub struct AccountService {
    db: DatabaseConnection,
}

impl AccountService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an account with its join code, system user, owner and account entropy.
    pub async fn create_with_owner(
        &self,
        name: &str,
        owner_name: &str,
        identity: &identities::Model,
    ) -> CoreResult<NewAccount> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::validation("Account name cannot be empty"));
        }

        let txn = self.db.begin().await?;
        let now = Utc::now();

        let account = accounts::ActiveModel {
            id: Set(new_id()),
            name: Set(name.to_string()),
            external_account_id: Set(next_external_account_id(&txn).await?),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let join_code = account_join_codes::ActiveModel {
            id: Set(new_id()),
            account_id: Set(account.id.clone()),
            code: Set(unused_join_code(&txn).await?),
            usage_count: Set(0),
            usage_limit: Set(DEFAULT_JOIN_CODE_LIMIT),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let system_user = users::ActiveModel {
            id: Set(new_id()),
            account_id: Set(account.id.clone()),
            identity_id: Set(None),
            name: Set(SYSTEM_USER_NAME.to_string()),
            role: Set(SYSTEM_ROLE.to_string()),
            active: Set(true),
            verified_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let owner = users::ActiveModel {
            id: Set(new_id()),
            account_id: Set(account.id.clone()),
            identity_id: Set(Some(identity.id.clone())),
            name: Set(owner_name.to_string()),
            role: Set(OWNER_ROLE.to_string()),
            active: Set(true),
            verified_at: Set(Some(now)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        entropies::ActiveModel {
            id: Set(new_id()),
            account_id: Set(account.id.clone()),
            container_type: Set(ACCOUNT_CONTAINER_TAG.to_string()),
            container_id: Set(account.id.clone()),
            auto_postpone_period: Set(DEFAULT_AUTO_POSTPONE_PERIOD),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        info!(
            account_id = %account.id,
            external_account_id = account.external_account_id,
            "Created account"
        );

        Ok(NewAccount {
            account,
            join_code,
            system_user,
            owner,
        })
    }

    pub async fn find(&self, account_id: &str) -> CoreResult<accounts::Model> {
        accounts::Entity::find_by_id(account_id.to_string())
            .one(&self.db)
            .await?
            .ok_or_else(|| CoreError::not_found("Account", account_id))
    }

    pub async fn system_user(&self, account_id: &str) -> CoreResult<users::Model> {
        users::Entity::find()
            .filter(users::Column::AccountId.eq(account_id))
            .filter(users::Column::Role.eq(SYSTEM_ROLE))
            .one(&self.db)
            .await?
            .ok_or_else(|| CoreError::not_found(EntityKind::Users.type_tag(), SYSTEM_ROLE))
    }

    pub async fn join_code(&self, account_id: &str) -> CoreResult<account_join_codes::Model> {
        account_join_codes::Entity::find()
            .filter(account_join_codes::Column::AccountId.eq(account_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| CoreError::not_found("Join code", account_id))
    }
}

async fn next_external_account_id<C: ConnectionTrait>(db: &C) -> CoreResult<i64> {
    let latest = accounts::Entity::find()
        .order_by_desc(accounts::Column::ExternalAccountId)
        .one(db)
        .await?;
    Ok(latest.map_or(FIRST_EXTERNAL_ACCOUNT_ID, |a| {
        (a.external_account_id + 1).max(FIRST_EXTERNAL_ACCOUNT_ID)
    }))
}

/// `XXXX-XXXX-XXXX`, uppercase alphanumerics.
pub fn generate_join_code() -> String {
    let raw = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("{}-{}-{}", &raw[0..4], &raw[4..8], &raw[8..12])
}

async fn unused_join_code<C: ConnectionTrait>(db: &C) -> CoreResult<String> {
    for _ in 0..JOIN_CODE_ATTEMPTS {
        let code = generate_join_code();
        let taken = account_join_codes::Entity::find()
            .filter(account_join_codes::Column::Code.eq(code.as_str()))
            .one(db)
            .await?
            .is_some();
        if !taken {
            return Ok(code);
        }
    }
    Err(CoreError::conflict("Could not allocate an unused join code"))
}
