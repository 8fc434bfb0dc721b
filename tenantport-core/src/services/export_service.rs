use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, Set,
};
use tracing::{error, info, instrument, warn};

use super::TransferStatus;
use crate::archive::ArchiveWriter;
use crate::collaborators::{AttachmentStore, Job, JobQueue, Notifier, ReferenceSigner};
use crate::database::entities::{account_exports, accounts, identities, users};
use crate::errors::{CoreError, CoreResult, TransferError, TransferResult};
use crate::transfer::records::new_id;
use crate::transfer::{ExportKind, ExportSummary, Exporter};

pub struct ExportService {
    db: DatabaseConnection,
    store: Arc<dyn AttachmentStore>,
    notifier: Arc<dyn Notifier>,
    queue: Arc<dyn JobQueue>,
    signer: Arc<ReferenceSigner>,
    chunk_size: usize,
    retention: Duration,
}

impl ExportService {
    pub fn new(
        db: DatabaseConnection,
        store: Arc<dyn AttachmentStore>,
        notifier: Arc<dyn Notifier>,
        queue: Arc<dyn JobQueue>,
        signer: Arc<ReferenceSigner>,
        chunk_size: usize,
        retention: Duration,
    ) -> Self {
        Self {
            db,
            store,
            notifier,
            queue,
            signer,
            chunk_size,
            retention,
        }
    }

    /// Records a pending export for `user_id` and queues it.
    pub async fn request(
        &self,
        account_id: &str,
        user_id: &str,
        kind: ExportKind,
    ) -> CoreResult<account_exports::Model> {
        let user = users::Entity::find_by_id(user_id.to_string())
            .one(&self.db)
            .await?
            .filter(|user| user.account_id == account_id)
            .ok_or_else(|| CoreError::not_found("User", user_id))?;

        let now = Utc::now();
        let export = account_exports::ActiveModel {
            id: Set(new_id()),
            account_id: Set(user.account_id),
            user_id: Set(user.id),
            kind: Set(kind.to_string()),
            status: Set(TransferStatus::Pending.to_string()),
            file_key: Set(None),
            completed_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        self.queue
            .enqueue(Job::Export {
                export_id: export.id.clone(),
            })
            .await?;
        info!(export_id = %export.id, kind = %kind, "Export requested");
        Ok(export)
    }

    pub async fn find(&self, export_id: &str) -> CoreResult<account_exports::Model> {
        account_exports::Entity::find_by_id(export_id.to_string())
            .one(&self.db)
            .await?
            .ok_or_else(|| CoreError::not_found("Export", export_id))
    }

    /// Only the user who requested an export may download it.
    pub fn accessible_to(export: &account_exports::Model, user_id: &str) -> bool {
        export.user_id == user_id
    }

    /// Generates the archive, stores it at `exports/<id>.zip` and notifies the requester.
    #[instrument(skip(self))]
    pub async fn build(&self, export_id: &str) -> CoreResult<account_exports::Model> {
        let export = self.find(export_id).await?;
        if export.status != TransferStatus::Pending.to_string() {
            return Err(TransferError::InvalidState {
                entity: "Export",
                id: export.id.clone(),
                status: export.status.clone(),
                expected: TransferStatus::Pending.to_string(),
            }
            .into());
        }

        let export = self
            .transition(export, TransferStatus::Processing, None)
            .await?;
        match self.generate(&export).await {
            Ok((file_key, summary)) => {
                let export = self
                    .transition(export, TransferStatus::Completed, Some(file_key))
                    .await?;
                info!(
                    documents = summary.documents,
                    blobs = summary.blobs_written,
                    skipped = summary.blobs_skipped,
                    "Export completed"
                );
                let recipient = self.recipient(&export.user_id).await?;
                self.notifier.export_completed(&recipient, &export.id).await;
                Ok(export)
            }
            Err(err) => {
                error!(error = %err, code = err.error_code(), "Export failed");
                self.transition(export, TransferStatus::Failed, None).await?;
                Err(err.into())
            }
        }
    }

    async fn generate(
        &self,
        export: &account_exports::Model,
    ) -> TransferResult<(String, ExportSummary)> {
        let kind: ExportKind = export
            .kind
            .parse()
            .map_err(|_| TransferError::invalid_document("account_exports", format!("unknown kind {}", export.kind)))?;
        let account = accounts::Entity::find_by_id(export.account_id.clone())
            .one(&self.db)
            .await?
            .ok_or_else(|| TransferError::NotFound {
                entity: "Account",
                id: export.account_id.clone(),
            })?;

        // Removed on drop, whatever the outcome.
        let scratch = tempfile::NamedTempFile::new()?;
        let mut writer = ArchiveWriter::new(scratch.reopen()?, self.chunk_size);
        let exporter = Exporter::new(&self.db, self.store.as_ref(), &self.signer);
        let summary = match kind {
            ExportKind::WholeAccount => exporter.write_account(&account, &mut writer).await?,
            ExportKind::SingleUser => {
                let user = users::Entity::find_by_id(export.user_id.clone())
                    .one(&self.db)
                    .await?
                    .ok_or_else(|| TransferError::NotFound {
                        entity: "User",
                        id: export.user_id.clone(),
                    })?;
                exporter.write_single_user(&account, &user, &mut writer).await?
            }
        };
        writer.finish()?;

        let file_key = format!("exports/{}.zip", export.id);
        let mut file = tokio::fs::File::open(scratch.path()).await?;
        self.store.upload(&file_key, &mut file).await?;
        Ok((file_key, summary))
    }

    /// Copies a completed export's archive to `destination`.
    pub async fn download_to(
        &self,
        export: &account_exports::Model,
        destination: &Path,
    ) -> CoreResult<u64> {
        let file_key = export
            .file_key
            .as_deref()
            .ok_or_else(|| CoreError::not_found("Export archive", export.id.as_str()))?;
        let mut file = tokio::fs::File::create(destination).await?;
        Ok(self.store.download(file_key, &mut file).await?)
    }

    /// Deletes exports that finished before the retention window, with their files.
    pub async fn cleanup(&self, now: DateTime<Utc>) -> CoreResult<usize> {
        let cutoff = now - self.retention;
        let expired = account_exports::Entity::find()
            .filter(account_exports::Column::CompletedAt.lt(cutoff))
            .all(&self.db)
            .await?;

        let mut removed = 0;
        for export in expired {
            if let Some(file_key) = export.file_key.as_deref() {
                if let Err(err) = self.store.delete(file_key).await {
                    warn!(export_id = %export.id, error = %err, "Failed to delete export file");
                    continue;
                }
            }
            export.delete(&self.db).await?;
            removed += 1;
        }
        if removed > 0 {
            info!(count = removed, "Removed expired exports");
        }
        Ok(removed)
    }

    async fn recipient(&self, user_id: &str) -> CoreResult<String> {
        let user = users::Entity::find_by_id(user_id.to_string())
            .one(&self.db)
            .await?
            .ok_or_else(|| CoreError::not_found("User", user_id))?;
        let Some(identity_id) = user.identity_id.clone() else {
            return Ok(user.name);
        };
        Ok(identities::Entity::find_by_id(identity_id)
            .one(&self.db)
            .await?
            .map_or(user.name, |identity| identity.email_address))
    }

    async fn transition(
        &self,
        export: account_exports::Model,
        status: TransferStatus,
        file_key: Option<String>,
    ) -> CoreResult<account_exports::Model> {
        let now = Utc::now();
        let mut active: account_exports::ActiveModel = export.into();
        active.status = Set(status.to_string());
        if status.is_terminal() {
            active.completed_at = Set(Some(now));
        }
        if file_key.is_some() {
            active.file_key = Set(file_key);
        }
        active.updated_at = Set(now);
        Ok(active.update(&self.db).await?)
    }
}
