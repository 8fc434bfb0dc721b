#[cfg(test)]
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};

#[cfg(test)]
use crate::database::entities::accounts;

#[cfg(test)]
pub async fn setup_test_db() -> DatabaseConnection {
    // Create an in-memory SQLite database for testing
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to test database");

    // Run migrations
    use sea_orm_migration::MigratorTrait;
    crate::database::migrations::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// Bare account row with no users or join code, for unit tests that only need an owner.
#[cfg(test)]
pub async fn seed_account(db: &DatabaseConnection, name: &str) -> accounts::Model {
    use sea_orm::{EntityTrait, PaginatorTrait};

    let existing = accounts::Entity::find()
        .count(db)
        .await
        .expect("Failed to count accounts");
    let now = chrono::Utc::now();
    accounts::ActiveModel {
        id: Set(uuid::Uuid::new_v4().to_string()),
        name: Set(name.to_string()),
        external_account_id: Set(9_000_000 + existing as i64),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("Failed to insert account")
}
