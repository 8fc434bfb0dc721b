use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::Subcommand;
use sea_orm_migration::prelude::*;
use tracing::info;

use tenantport::collaborators::{BufferedJobQueue, Job, JobQueue, JobRunner};
use tenantport::database::connection::establish_connection;
use tenantport::database::migrations::Migrator;
use tenantport::transfer::ensure::ensure_identity;
use tenantport::transfer::ExportKind;
use tenantport::{AppContext, Collaborators, TransferConfig};

#[derive(Subcommand, Debug)]
pub enum MigrateDirection {
    Up,
    Down,
    Fresh,
}

pub async fn migrate_database(config: &TransferConfig, direction: MigrateDirection) -> Result<()> {
    let db = establish_connection(&config.database_url).await?;

    match direction {
        MigrateDirection::Up => {
            info!("Running migrations up");
            Migrator::up(&db, None).await?;
        }
        MigrateDirection::Down => {
            info!("Running migrations down");
            Migrator::down(&db, None).await?;
        }
        MigrateDirection::Fresh => {
            info!("Running fresh migrations (down then up)");
            Migrator::down(&db, None).await?;
            Migrator::up(&db, None).await?;
        }
    }

    info!("Database migration completed");
    Ok(())
}

/// Migrated database plus a context whose queued jobs run in the foreground.
pub struct Runtime {
    context: AppContext,
    queue: Arc<BufferedJobQueue>,
}

impl Runtime {
    pub async fn start(config: &TransferConfig) -> Result<Self> {
        let db = establish_connection(&config.database_url).await?;
        Migrator::up(&db, None).await?;

        let queue = Arc::new(BufferedJobQueue::new());
        let collaborators = Collaborators::from_config(config, queue.clone());
        Ok(Self {
            context: AppContext::new(db, config, collaborators),
            queue,
        })
    }

    /// Runs queued jobs, including ones they enqueue, until the queue is empty.
    async fn run_queued(&self) -> Result<()> {
        loop {
            let jobs = self.queue.drain().await;
            if jobs.is_empty() {
                return Ok(());
            }
            for job in jobs {
                self.context.run(job).await?;
            }
        }
    }
}

pub async fn create_account(
    runtime: &Runtime,
    name: &str,
    owner_email: &str,
    owner_name: Option<&str>,
) -> Result<()> {
    let identity = ensure_identity(runtime.context.db(), owner_email).await?;
    let owner_name = owner_name.unwrap_or(identity.email_address.as_str());
    let created = runtime
        .context
        .account_service()
        .create_with_owner(name, owner_name, &identity)
        .await?;

    let output = serde_json::json!({
        "account_id": created.account.id,
        "external_account_id": created.account.external_account_id,
        "join_code": created.join_code.code,
        "owner_id": created.owner.id,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

pub async fn export(
    runtime: &Runtime,
    account_id: &str,
    user_id: &str,
    single_user: bool,
    out: Option<&Path>,
) -> Result<()> {
    let kind = if single_user {
        ExportKind::SingleUser
    } else {
        ExportKind::WholeAccount
    };
    let service = runtime.context.export_service();
    let export = service.request(account_id, user_id, kind).await?;
    runtime.run_queued().await?;

    let export = service.find(&export.id).await?;
    let file_key = export
        .file_key
        .clone()
        .ok_or_else(|| anyhow!("Export {} finished as {}", export.id, export.status))?;

    match out {
        Some(path) => {
            let bytes = service.download_to(&export, path).await?;
            info!("Wrote {} bytes to {}", bytes, path.display());
        }
        None => println!("{}", file_key),
    }
    Ok(())
}

pub async fn import(runtime: &Runtime, archive: &Path, identity: &str) -> Result<()> {
    let service = runtime.context.import_service();
    let import = service.submit(identity, archive).await?;
    runtime.run_queued().await?;

    let import = service.find(&import.id).await?;
    let output = serde_json::json!({
        "import_id": import.id,
        "account_id": import.account_id,
        "status": import.status,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

pub async fn cleanup_exports(runtime: &Runtime) -> Result<()> {
    runtime.queue.enqueue(Job::CleanupExports).await?;
    runtime.run_queued().await
}
