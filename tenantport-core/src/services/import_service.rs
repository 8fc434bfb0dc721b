//! Import lifecycle: submission, the single terminal transition, notification.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use tracing::{error, info, instrument, warn};

use super::{AccountService, TransferStatus};
use crate::archive::ArchiveReader;
use crate::collaborators::{
    AttachmentStore, Job, JobQueue, Notifier, ReferenceSigner, RouteRecognizer,
};
use crate::database::entities::{account_imports, accounts, identities, users};
use crate::errors::{CoreError, CoreResult, TransferError, TransferResult};
use crate::transfer::ensure::ensure_identity;
use crate::transfer::records::new_id;
use crate::transfer::{
    copy_blob_files, discard_uploads, ImportSummary, IntegrityValidator, PhasedImporter,
};

pub struct ImportService {
    db: DatabaseConnection,
    store: Arc<dyn AttachmentStore>,
    notifier: Arc<dyn Notifier>,
    queue: Arc<dyn JobQueue>,
    signer: Arc<ReferenceSigner>,
    routes: Arc<dyn RouteRecognizer>,
    validator: IntegrityValidator,
}

impl ImportService {
    pub fn new(
        db: DatabaseConnection,
        store: Arc<dyn AttachmentStore>,
        notifier: Arc<dyn Notifier>,
        queue: Arc<dyn JobQueue>,
        signer: Arc<ReferenceSigner>,
        routes: Arc<dyn RouteRecognizer>,
        validator: IntegrityValidator,
    ) -> Self {
        Self {
            db,
            store,
            notifier,
            queue,
            signer,
            routes,
            validator,
        }
    }

    /// Creates the target tenant owned by `identity_email`, stores the archive and
    /// queues the import.
    pub async fn submit(
        &self,
        identity_email: &str,
        archive_path: &Path,
    ) -> CoreResult<account_imports::Model> {
        let root = ArchiveReader::open(archive_path)?.root()?;
        let identity = ensure_identity(&self.db, identity_email).await?;
        let owner_name = owner_name_from_email(&identity.email_address);

        let tenant = AccountService::new(self.db.clone())
            .create_with_owner(&root.name, &owner_name, &identity)
            .await?;

        let import_id = new_id();
        let file_key = format!("imports/{}.zip", import_id);
        let mut file = tokio::fs::File::open(archive_path).await?;
        self.store.upload(&file_key, &mut file).await?;

        let now = Utc::now();
        let import = account_imports::ActiveModel {
            id: Set(import_id.clone()),
            account_id: Set(tenant.account.id.clone()),
            identity_id: Set(identity.id.clone()),
            status: Set(TransferStatus::Pending.to_string()),
            file_key: Set(Some(file_key)),
            completed_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        self.queue.enqueue(Job::Import { import_id }).await?;
        info!(import_id = %import.id, account_id = %import.account_id, "Import submitted");
        Ok(import)
    }

    pub async fn find(&self, import_id: &str) -> CoreResult<account_imports::Model> {
        account_imports::Entity::find_by_id(import_id.to_string())
            .one(&self.db)
            .await?
            .ok_or_else(|| CoreError::not_found("Import", import_id))
    }

    /// The target-tenant user bound to the identity that requested the import.
    pub async fn owner_user(&self, import: &account_imports::Model) -> CoreResult<users::Model> {
        users::Entity::find()
            .filter(users::Column::AccountId.eq(import.account_id.as_str()))
            .filter(users::Column::IdentityId.eq(import.identity_id.as_str()))
            .one(&self.db)
            .await?
            .ok_or_else(|| CoreError::not_found("User", import.identity_id.as_str()))
    }

    /// Runs a pending import to its terminal state and notifies the requester. The
    /// error of a failed run is returned after the failure has been recorded.
    #[instrument(skip(self), fields(account_id = tracing::field::Empty))]
    pub async fn perform(&self, import_id: &str) -> CoreResult<ImportSummary> {
        let import = self.find(import_id).await?;
        let status: TransferStatus = import
            .status
            .parse()
            .map_err(|_| CoreError::internal(format!("Unknown import status {}", import.status)))?;
        if status != TransferStatus::Pending {
            return Err(TransferError::InvalidState {
                entity: "Import",
                id: import.id.clone(),
                status: import.status.clone(),
                expected: TransferStatus::Pending.to_string(),
            }
            .into());
        }
        tracing::Span::current().record("account_id", import.account_id.as_str());

        let recipient = identities::Entity::find_by_id(import.identity_id.clone())
            .one(&self.db)
            .await?
            .map(|identity| identity.email_address)
            .unwrap_or_else(|| import.identity_id.clone());

        let import = self.transition(import, TransferStatus::Processing).await?;
        match self.execute(&import).await {
            Ok(summary) => {
                self.transition(import, TransferStatus::Completed).await?;
                info!(
                    created = summary.total_created(),
                    blobs = summary.blobs_copied,
                    "Import completed"
                );
                self.notifier.import_completed(&recipient, import_id).await;
                Ok(summary)
            }
            Err(err) => {
                error!(error = %err, code = err.error_code(), "Import failed");
                self.transition(import, TransferStatus::Failed).await?;
                self.notifier.import_failed(&recipient, import_id).await;
                Err(err.into())
            }
        }
    }

    async fn execute(&self, import: &account_imports::Model) -> TransferResult<ImportSummary> {
        let file_key = import.file_key.clone().ok_or_else(|| TransferError::NotFound {
            entity: "Import archive",
            id: import.id.clone(),
        })?;
        let account = accounts::Entity::find_by_id(import.account_id.clone())
            .one(&self.db)
            .await?
            .ok_or_else(|| TransferError::NotFound {
                entity: "Account",
                id: import.account_id.clone(),
            })?;

        let scratch = tempfile::NamedTempFile::new()?;
        let mut local = tokio::fs::File::create(scratch.path()).await?;
        self.store.download(&file_key, &mut local).await?;
        drop(local);

        let mut reader = ArchiveReader::open(scratch.path())?;
        let root = reader.root()?;
        let documents = reader.all_documents()?;
        self.validator.validate(&root, &documents)?;
        info!(documents = documents.len(), source_account = %root.id, "Archive validated");

        let txn = self.db.begin().await?;
        let mut uploaded = Vec::new();
        let outcome = async {
            let importer =
                PhasedImporter::new(&txn, &account, &root, &self.signer, self.routes.as_ref());
            let mut summary = importer.run(&root, &documents).await?;
            summary.blobs_copied = copy_blob_files(
                &mut reader,
                self.store.as_ref(),
                &summary.blob_keys,
                &mut uploaded,
            )
            .await?;
            Ok::<_, TransferError>(summary)
        }
        .await;

        let result = match outcome {
            Ok(summary) => txn
                .commit()
                .await
                .map(|()| summary)
                .map_err(TransferError::from),
            Err(err) => {
                if let Err(rollback) = txn.rollback().await {
                    warn!(error = %rollback, "Rollback failed");
                }
                Err(err)
            }
        };
        if result.is_err() && !uploaded.is_empty() {
            discard_uploads(self.store.as_ref(), &uploaded).await;
        }
        result
    }

    async fn transition(
        &self,
        import: account_imports::Model,
        status: TransferStatus,
    ) -> CoreResult<account_imports::Model> {
        let now = Utc::now();
        let mut active: account_imports::ActiveModel = import.into();
        active.status = Set(status.to_string());
        if status.is_terminal() {
            active.completed_at = Set(Some(now));
        }
        active.updated_at = Set(now);
        Ok(active.update(&self.db).await?)
    }
}

/// Display name for a new owner: the local part of the address.
fn owner_name_from_email(email: &str) -> String {
    email
        .split('@')
        .next()
        .filter(|local| !local.is_empty())
        .unwrap_or(email)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{ArchiveWriter, RootDocument};
    use crate::collaborators::{
        BlobReader, BufferedJobQueue, MemoryAttachmentStore, ProductRoutes, RecordingNotifier,
    };
    use crate::database::entities::blobs;
    use crate::database::test_utils::setup_test_db;
    use crate::errors::StorageError;
    use crate::transfer::EntityKind;
    use async_trait::async_trait;
    use sea_orm::PaginatorTrait;
    use serde_json::json;
    use tokio::io::AsyncRead;

    /// Memory store that refuses uploads for one key.
    struct RejectingStore {
        inner: MemoryAttachmentStore,
        rejected: &'static str,
    }

    #[async_trait]
    impl AttachmentStore for RejectingStore {
        async fn open(&self, key: &str) -> Result<BlobReader, StorageError> {
            self.inner.open(key).await
        }

        async fn upload(
            &self,
            key: &str,
            reader: &mut (dyn AsyncRead + Send + Unpin),
        ) -> Result<u64, StorageError> {
            if key == self.rejected {
                return Err(StorageError::InvalidKey(key.to_string()));
            }
            self.inner.upload(key, reader).await
        }

        async fn delete(&self, key: &str) -> Result<(), StorageError> {
            self.inner.delete(key).await
        }

        async fn exists(&self, key: &str) -> Result<bool, StorageError> {
            self.inner.exists(key).await
        }
    }

    fn two_blob_archive(path: &Path) {
        let root = RootDocument {
            id: "src-account".to_string(),
            name: "Acme".to_string(),
            external_account_id: 4_100_001,
            join_code: None,
        };
        let file = std::fs::File::create(path).unwrap();
        let mut writer = ArchiveWriter::new(file, 1024);
        writer.write_root(&root).unwrap();
        for (id, key) in [("b1", "k1accepted"), ("b2", "k2rejected")] {
            writer
                .write_document(
                    EntityKind::Blobs,
                    id,
                    &json!({
                        "id": id,
                        "account_id": root.id,
                        "key": key,
                        "filename": format!("{}.txt", key),
                        "byte_size": 5,
                    }),
                )
                .unwrap();
            writer
                .write_bytes(&crate::archive::blob_path(key), b"bytes")
                .unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_owner_name_from_email() {
        assert_eq!(owner_name_from_email("kim@example.com"), "kim");
        assert_eq!(owner_name_from_email("@example.com"), "@example.com");
    }

    #[tokio::test]
    async fn test_failed_upload_discards_copied_files() {
        let db = setup_test_db().await;
        let store = Arc::new(RejectingStore {
            inner: MemoryAttachmentStore::new(),
            rejected: "k2rejected",
        });
        let notifier = Arc::new(RecordingNotifier::new());
        let service = ImportService::new(
            db.clone(),
            store.clone(),
            notifier,
            Arc::new(BufferedJobQueue::new()),
            Arc::new(ReferenceSigner::new("secret", "tenantport")),
            Arc::new(ProductRoutes),
            IntegrityValidator::new(false),
        );

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("acme.zip");
        two_blob_archive(&path);

        let import = service.submit("kim@example.com", &path).await.unwrap();
        let err = service.perform(&import.id).await.unwrap_err();
        assert_eq!(err.kind(), crate::errors::CoreErrorKind::Unavailable);

        assert_eq!(service.find(&import.id).await.unwrap().status, "failed");
        assert!(store.inner.get("k1accepted").await.is_none());
        assert!(store.inner.get("k2rejected").await.is_none());
        assert_eq!(blobs::Entity::find().count(&db).await.unwrap(), 0);
    }
}
