use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::DatabaseConnection;

use crate::collaborators::{
    AttachmentStore, DiskAttachmentStore, Job, JobQueue, JobRunner, LogNotifier, Notifier,
    ProductRoutes, ReferenceSigner, RouteRecognizer,
};
use crate::config::TransferConfig;
use crate::errors::CoreResult;
use crate::services::{AccountService, ExportService, ImportService};
use crate::transfer::IntegrityValidator;

/// Shared application context wiring services to their collaborators.
#[derive(Clone)]
pub struct AppContext {
    db: DatabaseConnection,
    store: Arc<dyn AttachmentStore>,
    account_service: Arc<AccountService>,
    import_service: Arc<ImportService>,
    export_service: Arc<ExportService>,
}

/// Collaborators an [`AppContext`] is built from.
pub struct Collaborators {
    pub store: Arc<dyn AttachmentStore>,
    pub notifier: Arc<dyn Notifier>,
    pub queue: Arc<dyn JobQueue>,
    pub routes: Arc<dyn RouteRecognizer>,
}

impl Collaborators {
    /// Disk storage under `config.storage_root` and log notifications.
    pub fn from_config(config: &TransferConfig, queue: Arc<dyn JobQueue>) -> Self {
        Self {
            store: Arc::new(DiskAttachmentStore::new(config.storage_root.clone())),
            notifier: Arc::new(LogNotifier),
            queue,
            routes: Arc::new(ProductRoutes),
        }
    }
}

impl AppContext {
    pub fn new(db: DatabaseConnection, config: &TransferConfig, collaborators: Collaborators) -> Self {
        let Collaborators {
            store,
            notifier,
            queue,
            routes,
        } = collaborators;
        let signer = Arc::new(ReferenceSigner::new(
            config.signing_secret(),
            config.application_name.clone(),
        ));

        let account_service = Arc::new(AccountService::new(db.clone()));
        let import_service = Arc::new(ImportService::new(
            db.clone(),
            store.clone(),
            notifier.clone(),
            queue.clone(),
            signer.clone(),
            routes,
            IntegrityValidator::new(config.strict_polymorphic_references),
        ));
        let export_service = Arc::new(ExportService::new(
            db.clone(),
            store.clone(),
            notifier,
            queue,
            signer,
            config.chunk_size(),
            config.export_retention(),
        ));

        Self {
            db,
            store,
            account_service,
            import_service,
            export_service,
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn store(&self) -> &Arc<dyn AttachmentStore> {
        &self.store
    }

    pub fn account_service(&self) -> &Arc<AccountService> {
        &self.account_service
    }

    pub fn import_service(&self) -> &Arc<ImportService> {
        &self.import_service
    }

    pub fn export_service(&self) -> &Arc<ExportService> {
        &self.export_service
    }
}

#[async_trait]
impl JobRunner for AppContext {
    async fn run(&self, job: Job) -> CoreResult<()> {
        match job {
            Job::Import { import_id } => {
                self.import_service.perform(&import_id).await?;
            }
            Job::Export { export_id } => {
                self.export_service.build(&export_id).await?;
            }
            Job::CleanupExports => {
                self.export_service.cleanup(Utc::now()).await?;
            }
        }
        Ok(())
    }
}
