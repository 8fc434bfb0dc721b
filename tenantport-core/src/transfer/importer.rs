//! Phased reconstruction of an archive inside a target account.
//!
//! The importer runs entirely on the connection it is given, normally a transaction
//! opened by the caller, and never commits. Entity kinds are created in
//! [`EntityKind::in_import_order`], and each new row is registered with the
//! translator before the next document is read.

use std::collections::BTreeMap;
use std::io::{Read, Seek};

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::ensure::{self, Ensured};
use super::entity_kind::{EntityKind, Phase};
use super::polymorphic::PolymorphicReference;
use super::records;
use super::rich_text::RichTextRewriter;
use super::translator::IdTranslator;
use crate::archive::{ArchiveDocuments, ArchiveReader, Attributes, Document, RootDocument};
use crate::collaborators::{AttachmentStore, ReferenceSigner, RouteRecognizer};
use crate::database::entities::{account_join_codes, accounts, blobs, users, webhook_deliveries};
use crate::errors::{IntegrityError, TransferError, TransferResult};

pub const SYSTEM_ROLE: &str = "system";

/// What an import created or reused, per entity kind.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub created: BTreeMap<EntityKind, usize>,
    pub reused: BTreeMap<EntityKind, usize>,
    pub join_code_preserved: bool,
    /// Archived storage key to the keys its bytes are stored under in the target.
    pub blob_keys: BTreeMap<String, Vec<String>>,
    pub blobs_copied: usize,
}

impl ImportSummary {
    fn record(&mut self, kind: EntityKind, ensured: &Ensured) {
        let counts = if ensured.is_created() {
            &mut self.created
        } else {
            &mut self.reused
        };
        *counts.entry(kind).or_default() += 1;
    }

    pub fn created(&self, kind: EntityKind) -> usize {
        self.created.get(&kind).copied().unwrap_or(0)
    }

    pub fn reused(&self, kind: EntityKind) -> usize {
        self.reused.get(&kind).copied().unwrap_or(0)
    }

    pub fn total_created(&self) -> usize {
        self.created.values().sum()
    }
}

pub struct PhasedImporter<'a, C: ConnectionTrait> {
    db: &'a C,
    account: &'a accounts::Model,
    translator: IdTranslator,
    rewriter: RichTextRewriter<'a>,
    summary: ImportSummary,
    /// Target ids of rows whose deferred keys still hold source ids.
    deferred: Vec<(EntityKind, String)>,
}

impl<'a, C: ConnectionTrait> PhasedImporter<'a, C> {
    pub fn new(
        db: &'a C,
        account: &'a accounts::Model,
        root: &RootDocument,
        signer: &'a ReferenceSigner,
        routes: &'a dyn RouteRecognizer,
    ) -> Self {
        Self {
            db,
            account,
            translator: IdTranslator::new(account.id.clone()),
            rewriter: RichTextRewriter::new(
                signer,
                routes,
                root.slug(),
                account.external_account_id.to_string(),
            ),
            summary: ImportSummary::default(),
            deferred: Vec::new(),
        }
    }

    pub async fn run(
        mut self,
        root: &RootDocument,
        documents: &ArchiveDocuments,
    ) -> TransferResult<ImportSummary> {
        info!(phase = %Phase::Foundation, account_id = %self.account.id, "Importing phase");
        self.import_account(root).await?;
        self.import_join_code(root).await?;

        let mut current = Phase::Foundation;
        for kind in EntityKind::in_import_order() {
            if kind.phase() != current {
                self.finish_phase(current).await?;
                current = kind.phase();
                info!(phase = %current, "Importing phase");
            }

            let batch = documents.of(kind);
            if kind == EntityKind::Users {
                self.import_users(batch).await?;
            } else {
                self.import_kind(kind, batch).await?;
            }
            if !batch.is_empty() {
                debug!(entity = %kind, count = batch.len(), "Imported documents");
            }
        }
        self.finish_phase(current).await?;

        Ok(self.summary)
    }

    async fn finish_phase(&mut self, phase: Phase) -> TransferResult<()> {
        if phase == Phase::Activity {
            self.relink_deferred().await?;
        }
        Ok(())
    }

    // Phase 1

    async fn import_account(&self, root: &RootDocument) -> TransferResult<()> {
        let mut active: accounts::ActiveModel = self.account.clone().into();
        active.name = Set(root.name.clone());
        active.updated_at = Set(Utc::now());
        active.update(self.db).await?;
        Ok(())
    }

    async fn import_join_code(&mut self, root: &RootDocument) -> TransferResult<()> {
        let Some(join_code) = &root.join_code else {
            return Ok(());
        };

        let taken = account_join_codes::Entity::find()
            .filter(account_join_codes::Column::Code.eq(join_code.code.as_str()))
            .one(self.db)
            .await?
            .is_some();
        if taken {
            info!("Archived join code is already in use; keeping the generated code");
            return Ok(());
        }

        let current = account_join_codes::Entity::find()
            .filter(account_join_codes::Column::AccountId.eq(self.account.id.as_str()))
            .one(self.db)
            .await?;
        let now = Utc::now();
        match current {
            Some(current) => {
                let mut active: account_join_codes::ActiveModel = current.into();
                active.code = Set(join_code.code.clone());
                active.usage_count = Set(join_code.usage_count);
                active.usage_limit = Set(join_code.usage_limit);
                active.updated_at = Set(now);
                active.update(self.db).await?;
            }
            None => {
                account_join_codes::ActiveModel {
                    id: Set(records::new_id()),
                    account_id: Set(self.account.id.clone()),
                    code: Set(join_code.code.clone()),
                    usage_count: Set(join_code.usage_count),
                    usage_limit: Set(join_code.usage_limit),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(self.db)
                .await?;
            }
        }
        self.summary.join_code_preserved = true;
        Ok(())
    }

    // Phase 2

    async fn import_users(&mut self, documents: &[Document]) -> TransferResult<()> {
        if let Some(document) = documents.iter().find(|d| is_system_user(d)) {
            let system_user = users::Entity::find()
                .filter(users::Column::AccountId.eq(self.account.id.as_str()))
                .filter(users::Column::Role.eq(SYSTEM_ROLE))
                .one(self.db)
                .await?
                .ok_or_else(|| TransferError::MissingSystemUser(self.account.id.clone()))?;
            self.register(EntityKind::Users, document, Ensured::Reused(system_user.id))?;
        }

        for document in documents.iter().filter(|d| !is_system_user(d)) {
            let ensured = self.import_user(document).await?;
            self.register(EntityKind::Users, document, ensured)?;
        }
        Ok(())
    }

    async fn import_user(&self, document: &Document) -> TransferResult<Ensured> {
        let mut attributes = document.body.clone();
        let email = attributes
            .remove("email_address")
            .and_then(|v| v.as_str().map(str::trim).map(str::to_string))
            .filter(|email| !email.is_empty());
        attributes.remove("identity_id");

        let identity = match email {
            Some(email) => Some(ensure::ensure_identity(self.db, &email).await?),
            None => None,
        };

        if let Some(identity) = &identity {
            let existing = users::Entity::find()
                .filter(users::Column::AccountId.eq(self.account.id.as_str()))
                .filter(users::Column::IdentityId.eq(identity.id.as_str()))
                .one(self.db)
                .await?;
            if let Some(existing) = existing {
                let id = existing.id.clone();
                self.update_user(existing, &attributes, &document.path).await?;
                return Ok(Ensured::Reused(id));
            }
        }

        attributes.insert(
            "account_id".to_string(),
            Value::String(self.account.id.clone()),
        );
        attributes.insert(
            "identity_id".to_string(),
            identity.map_or(Value::Null, |i| Value::String(i.id)),
        );
        let id =
            records::insert_fresh(self.db, EntityKind::Users, attributes, &document.path).await?;
        Ok(Ensured::Created(id))
    }

    async fn update_user(
        &self,
        existing: users::Model,
        attributes: &Attributes,
        path: &str,
    ) -> TransferResult<()> {
        let mut active: users::ActiveModel = existing.into();
        if let Some(name) = attributes.get("name").and_then(Value::as_str) {
            active.name = Set(name.to_string());
        }
        if let Some(role) = attributes.get("role").and_then(Value::as_str) {
            active.role = Set(role.to_string());
        }
        if let Some(flag) = attributes.get("active").and_then(Value::as_bool) {
            active.active = Set(flag);
        }
        if let Some(verified_at) = attributes.get("verified_at") {
            let verified_at: Option<DateTime<Utc>> = serde_json::from_value(verified_at.clone())
                .map_err(|e| TransferError::invalid_document(path, e.to_string()))?;
            active.verified_at = Set(verified_at);
        }
        active.updated_at = Set(Utc::now());
        active.update(self.db).await?;
        Ok(())
    }

    // Phases 3-8

    async fn import_kind(&mut self, kind: EntityKind, documents: &[Document]) -> TransferResult<()> {
        for document in documents {
            let attributes = self.translate(kind, document)?;
            let ensured = self.create(kind, attributes, &document.path).await?;
            if !kind.deferred_keys().is_empty() && ensured.is_created() {
                self.deferred.push((kind, ensured.id().to_string()));
            }
            self.register(kind, document, ensured)?;
        }
        Ok(())
    }

    /// Remaps account, polymorphic pair and declared foreign keys of one document.
    fn translate(&self, kind: EntityKind, document: &Document) -> TransferResult<Attributes> {
        let mut attributes = document.body.clone();
        attributes.remove("id");

        if let Some(field) = kind.polymorphic_field() {
            if let Some(reference) = PolymorphicReference::read(&attributes, field) {
                let target = if reference.is_account_container() {
                    Some(self.account.id.clone())
                } else {
                    reference
                        .target()
                        .map(|target| self.translator.lookup(target, &reference.id))
                };
                if let Some(target) = target {
                    attributes.insert(field.id_field.to_string(), Value::String(target));
                }
            }
        }

        Ok(if kind.remaps_users() {
            self.translator
                .remap_with_users(&attributes, kind.foreign_keys())
        } else {
            self.translator.remap(&attributes, kind.foreign_keys())
        })
    }

    async fn create(
        &mut self,
        kind: EntityKind,
        mut attributes: Attributes,
        path: &str,
    ) -> TransferResult<Ensured> {
        match kind {
            EntityKind::Entropies => {
                return ensure::ensure_entropy(self.db, &self.account.id, attributes, path).await
            }
            EntityKind::Accesses => {
                return ensure::ensure_access(self.db, &self.account.id, attributes, path).await
            }
            EntityKind::Watches => {
                return ensure::ensure_watch(self.db, &self.account.id, attributes, path).await
            }
            EntityKind::RichTexts => self.rewrite_body(&mut attributes, path).await?,
            EntityKind::Blobs => self.claim_blob_key(&mut attributes, path).await?,
            _ => {}
        }

        let creator = attributes
            .get("creator_id")
            .and_then(crate::archive::id_value);
        let id = records::insert_fresh(self.db, kind, attributes, path).await?;

        if let Some(creator) = creator {
            let side_effect = match kind {
                EntityKind::Boards => Some(
                    ensure::ensure_creator_access(self.db, &self.account.id, &id, &creator)
                        .await?,
                ),
                EntityKind::Cards => Some(
                    ensure::ensure_creator_watch(self.db, &self.account.id, &id, &creator)
                        .await?,
                ),
                _ => None,
            };
            if let Some(side_effect) = side_effect.filter(Ensured::is_created) {
                let side_kind = if kind == EntityKind::Boards {
                    EntityKind::Accesses
                } else {
                    EntityKind::Watches
                };
                debug!(entity = %side_kind, id = side_effect.id(), "Created creator row");
            }
        }

        Ok(Ensured::Created(id))
    }

    /// Storage keys are unique across the installation. An archived key that is already
    /// taken is replaced by a fresh one so the bytes of its owner are never touched.
    async fn claim_blob_key(
        &mut self,
        attributes: &mut Attributes,
        path: &str,
    ) -> TransferResult<()> {
        let archived = attributes
            .get("key")
            .and_then(Value::as_str)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .ok_or_else(|| TransferError::invalid_document(path, "missing key"))?;

        let taken = blobs::Entity::find()
            .filter(blobs::Column::Key.eq(archived.as_str()))
            .one(self.db)
            .await?
            .is_some();
        let stored = if taken {
            let fresh = records::new_blob_key();
            info!(
                key = %archived,
                stored_as = %fresh,
                "Archived storage key is in use; allocated a new key"
            );
            attributes.insert("key".to_string(), Value::String(fresh.clone()));
            fresh
        } else {
            archived.clone()
        };

        self.summary.blob_keys.entry(archived).or_default().push(stored);
        Ok(())
    }

    async fn rewrite_body(&self, attributes: &mut Attributes, path: &str) -> TransferResult<()> {
        let Some(body) = attributes.get("body").and_then(Value::as_str) else {
            return Ok(());
        };
        let rewritten = self.rewriter.rewrite(body, &self.translator);

        for embed in &rewritten.embeds {
            if !records::exists(self.db, embed.kind, &self.account.id, &embed.id).await? {
                return Err(IntegrityError::UnresolvedEmbed {
                    rich_text: path.to_string(),
                    tag: embed.tag.clone(),
                    id: embed.id.clone(),
                }
                .into());
            }
        }
        attributes.insert("body".to_string(), Value::String(rewritten.html));
        Ok(())
    }

    /// Points deferred foreign keys at rows created after their owner.
    async fn relink_deferred(&mut self) -> TransferResult<()> {
        let deferred = std::mem::take(&mut self.deferred);
        for (kind, id) in &deferred {
            if *kind != EntityKind::WebhookDeliveries {
                continue;
            }
            let Some(delivery) = webhook_deliveries::Entity::find_by_id(id.clone())
                .one(self.db)
                .await?
            else {
                continue;
            };
            let Some(source_event) = delivery.event_id.clone() else {
                continue;
            };
            let event_id = self.translator.lookup(EntityKind::Events, &source_event);
            let mut active: webhook_deliveries::ActiveModel = delivery.into();
            active.event_id = Set(Some(event_id));
            active.update(self.db).await?;
        }
        if !deferred.is_empty() {
            debug!(count = deferred.len(), "Relinked deferred references");
        }
        Ok(())
    }

    fn register(
        &mut self,
        kind: EntityKind,
        document: &Document,
        ensured: Ensured,
    ) -> TransferResult<()> {
        let source_id = document
            .source_id()
            .ok_or_else(|| IntegrityError::MissingIdentifier {
                path: document.path.clone(),
            })?;
        self.translator.map(kind, source_id, ensured.id())?;
        self.summary.record(kind, &ensured);
        Ok(())
    }
}

fn is_system_user(document: &Document) -> bool {
    document.body.get("role").and_then(Value::as_str) == Some(SYSTEM_ROLE)
}

/// Streams archived attachment bytes into the store under the keys the import allocated
/// for them. Entries without a blob row are skipped. Every key written is pushed onto
/// `uploaded`, including when a later upload fails.
pub async fn copy_blob_files<R: Read + Seek>(
    reader: &mut ArchiveReader<R>,
    store: &dyn AttachmentStore,
    blob_keys: &BTreeMap<String, Vec<String>>,
    uploaded: &mut Vec<String>,
) -> TransferResult<usize> {
    let mut copied = 0;
    for key in reader.blob_keys() {
        let Some(targets) = blob_keys.get(&key) else {
            debug!(key = %key, "Skipping archived file without a blob record");
            continue;
        };

        let mut scratch = tempfile::tempfile()?;
        reader.extract_blob(&key, &mut scratch)?;

        for target in targets {
            scratch.rewind()?;
            let mut file = tokio::fs::File::from_std(scratch.try_clone()?);
            uploaded.push(target.clone());
            store.upload(target, &mut file).await?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Removes bytes written by an import that did not commit.
pub async fn discard_uploads(store: &dyn AttachmentStore, uploaded: &[String]) {
    for key in uploaded {
        if let Err(err) = store.delete(key).await {
            warn!(key = %key, error = %err, "Failed to remove uploaded file of a failed import");
        }
    }
}
