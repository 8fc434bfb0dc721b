use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::time::Duration;

pub async fn establish_connection(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(database_url);

    // An in-memory database only exists on the connection that created it
    let max_connections = if is_in_memory(database_url) { 1 } else { 10 };

    opt.max_connections(max_connections)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(5))
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(300))
        .max_lifetime(Duration::from_secs(3600))
        .sqlx_logging(true);

    Database::connect(opt).await
}

pub fn get_database_url(database_path: Option<&str>) -> String {
    match database_path {
        Some(":memory:") => "sqlite::memory:".to_string(),
        Some(path) if path.starts_with("sqlite:") => path.to_string(),
        Some(path) => format!("sqlite://{}?mode=rwc", path),
        None => "sqlite://tenantport.db?mode=rwc".to_string(),
    }
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_urls() {
        assert_eq!(get_database_url(Some(":memory:")), "sqlite::memory:");
        assert_eq!(
            get_database_url(Some("data/tp.db")),
            "sqlite://data/tp.db?mode=rwc"
        );
        assert_eq!(
            get_database_url(Some("sqlite://x.db?mode=ro")),
            "sqlite://x.db?mode=ro"
        );
        assert_eq!(get_database_url(None), "sqlite://tenantport.db?mode=rwc");
    }

    #[tokio::test]
    async fn test_in_memory_connection_runs_migrations() {
        use sea_orm::{EntityTrait, PaginatorTrait};
        use sea_orm_migration::MigratorTrait;

        let db = establish_connection("sqlite::memory:").await.unwrap();
        crate::database::migrations::Migrator::up(&db, None)
            .await
            .unwrap();
        let accounts = crate::database::entities::accounts::Entity::find()
            .count(&db)
            .await
            .unwrap();
        assert_eq!(accounts, 0);
    }
}
