pub use sea_orm_migration::prelude::*;

mod m20260301_000001_create_accounts;
mod m20260301_000002_create_boards_and_cards;
mod m20260301_000003_create_card_relationships;
mod m20260301_000004_create_webhooks_and_activity;
mod m20260301_000005_create_storage;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_accounts::Migration),
            Box::new(m20260301_000002_create_boards_and_cards::Migration),
            Box::new(m20260301_000003_create_card_relationships::Migration),
            Box::new(m20260301_000004_create_webhooks_and_activity::Migration),
            Box::new(m20260301_000005_create_storage::Migration),
        ]
    }
}
