use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use sea_orm::{ConnectionTrait, DatabaseConnection};
use serde_json::{json, Value};

use tenantport::collaborators::{
    BufferedJobQueue, JobRunner, MemoryAttachmentStore, ProductRoutes, RecordingNotifier,
    ReferenceSigner, ATTACHABLE_PURPOSE,
};
use tenantport::database::entities::{account_exports, account_imports, accounts, users};
use tenantport::errors::CoreResult;
use tenantport::services::account_service::MEMBER_ROLE;
use tenantport::transfer::{ensure, records, EntityKind, ExportKind};
use tenantport::{AppContext, Collaborators, TransferConfig};

use crate::db::TestDb;

pub const TEST_SIGNING_SECRET: &str = "integration-test-secret";

/// Migrated in-memory database with in-process collaborators.
pub struct Harness {
    pub db: DatabaseConnection,
    pub config: TransferConfig,
    pub store: Arc<MemoryAttachmentStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub queue: Arc<BufferedJobQueue>,
    pub context: AppContext,
}

impl Harness {
    pub async fn new() -> Result<Self> {
        Self::with_config(TransferConfig {
            signing_secret: Some(TEST_SIGNING_SECRET.to_string()),
            ..TransferConfig::default()
        })
        .await
    }

    pub async fn with_config(config: TransferConfig) -> Result<Self> {
        let db = TestDb::new_in_memory().migrated().await?;
        let store = Arc::new(MemoryAttachmentStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let queue = Arc::new(BufferedJobQueue::new());

        let collaborators = Collaborators {
            store: store.clone(),
            notifier: notifier.clone(),
            queue: queue.clone(),
            routes: Arc::new(ProductRoutes),
        };
        let context = AppContext::new(db.clone(), &config, collaborators);

        Ok(Self {
            db,
            config,
            store,
            notifier,
            queue,
            context,
        })
    }

    pub fn signer(&self) -> ReferenceSigner {
        ReferenceSigner::new(
            self.config.signing_secret(),
            self.config.application_name.clone(),
        )
    }

    /// Runs every queued job, in order, and returns each outcome.
    pub async fn run_jobs(&self) -> Vec<CoreResult<()>> {
        let mut outcomes = Vec::new();
        loop {
            let jobs = self.queue.drain().await;
            if jobs.is_empty() {
                return outcomes;
            }
            for job in jobs {
                outcomes.push(self.context.run(job).await);
            }
        }
    }

    /// Requests an export for the tenant owner, runs it, and copies the archive to `path`.
    pub async fn export_to(
        &self,
        tenant: &Tenant,
        kind: ExportKind,
        path: &Path,
    ) -> Result<account_exports::Model> {
        let service = self.context.export_service();
        let export = service.request(tenant.id(), &tenant.owner.id, kind).await?;
        for outcome in self.run_jobs().await {
            outcome?;
        }
        let export = service.find(&export.id).await?;
        let file_key = export
            .file_key
            .clone()
            .ok_or_else(|| anyhow!("export {} is {}", export.id, export.status))?;
        let bytes = self
            .store
            .get(&file_key)
            .await
            .ok_or_else(|| anyhow!("no stored file {}", file_key))?;
        std::fs::write(path, bytes)?;
        Ok(export)
    }

    /// Submits `path` for `identity_email` and runs the queued import. Returns the
    /// import record as stored afterwards and the outcome of the job.
    pub async fn import_archive(
        &self,
        identity_email: &str,
        path: &Path,
    ) -> Result<(account_imports::Model, CoreResult<()>)> {
        let service = self.context.import_service();
        let import = service.submit(identity_email, path).await?;
        let outcome = self
            .run_jobs()
            .await
            .into_iter()
            .find(Result::is_err)
            .unwrap_or(Ok(()));
        Ok((service.find(&import.id).await?, outcome))
    }

    /// A fresh tenant with its system user and an owner bound to `owner_email`.
    pub async fn tenant(&self, name: &str, owner_email: &str) -> Result<Tenant> {
        let identity = ensure::ensure_identity(&self.db, owner_email).await?;
        let created = self
            .context
            .account_service()
            .create_with_owner(name, "Owner", &identity)
            .await?;
        Ok(Tenant {
            db: self.db.clone(),
            account: created.account,
            owner: created.owner,
            system_user: created.system_user,
        })
    }
}

/// A seeded account. Rows are inserted the way the product creates them, including
/// creator accesses and watches.
pub struct Tenant {
    db: DatabaseConnection,
    pub account: accounts::Model,
    pub owner: users::Model,
    pub system_user: users::Model,
}

impl Tenant {
    pub fn id(&self) -> &str {
        &self.account.id
    }

    pub fn slug(&self) -> String {
        self.account.external_account_id.to_string()
    }

    async fn insert(&self, kind: EntityKind, value: Value) -> Result<String> {
        let Value::Object(mut attributes) = value else {
            return Err(anyhow!("fixture for {} is not an object", kind));
        };
        attributes.insert("account_id".to_string(), json!(self.account.id));
        Ok(records::insert_fresh(&self.db, kind, attributes, kind.directory()).await?)
    }

    pub async fn add_user(&self, name: &str, email: &str) -> Result<String> {
        let identity = ensure::ensure_identity(&self.db, email).await?;
        self.insert(
            EntityKind::Users,
            json!({
                "identity_id": identity.id,
                "name": name,
                "role": MEMBER_ROLE,
                "active": true,
                "verified_at": null,
            }),
        )
        .await
    }

    pub async fn add_tag(&self, title: &str) -> Result<String> {
        self.insert(EntityKind::Tags, json!({ "title": title })).await
    }

    pub async fn add_board(&self, name: &str, creator_id: &str) -> Result<String> {
        let id = self
            .insert(
                EntityKind::Boards,
                json!({ "creator_id": creator_id, "name": name, "all_access": true }),
            )
            .await?;
        ensure::ensure_creator_access(&self.db, &self.account.id, &id, creator_id).await?;
        Ok(id)
    }

    pub async fn add_column(&self, board_id: &str, name: &str, position: i32) -> Result<String> {
        self.insert(
            EntityKind::Columns,
            json!({ "board_id": board_id, "name": name, "color": "#3b4b59", "position": position }),
        )
        .await
    }

    pub async fn add_card(
        &self,
        board_id: &str,
        column_id: Option<&str>,
        creator_id: &str,
        number: i64,
        title: &str,
    ) -> Result<String> {
        let id = self
            .insert(
                EntityKind::Cards,
                json!({
                    "board_id": board_id,
                    "column_id": column_id,
                    "creator_id": creator_id,
                    "number": number,
                    "title": title,
                    "status": "published",
                    "last_active_at": null,
                }),
            )
            .await?;
        ensure::ensure_creator_watch(&self.db, &self.account.id, &id, creator_id).await?;
        Ok(id)
    }

    pub async fn add_comment(&self, card_id: &str, creator_id: &str, body: &str) -> Result<String> {
        let id = self
            .insert(
                EntityKind::Comments,
                json!({ "card_id": card_id, "creator_id": creator_id }),
            )
            .await?;
        self.add_rich_text("Comment", &id, "body", body).await?;
        Ok(id)
    }

    pub async fn add_rich_text(
        &self,
        record_type: &str,
        record_id: &str,
        name: &str,
        body: &str,
    ) -> Result<String> {
        self.insert(
            EntityKind::RichTexts,
            json!({ "name": name, "body": body, "record_type": record_type, "record_id": record_id }),
        )
        .await
    }

    pub async fn add_tagging(&self, card_id: &str, tag_id: &str) -> Result<String> {
        self.insert(EntityKind::Taggings, json!({ "card_id": card_id, "tag_id": tag_id }))
            .await
    }

    pub async fn add_entropy(
        &self,
        container_type: &str,
        container_id: &str,
        auto_postpone_period: i64,
    ) -> Result<String> {
        self.insert(
            EntityKind::Entropies,
            json!({
                "container_type": container_type,
                "container_id": container_id,
                "auto_postpone_period": auto_postpone_period,
            }),
        )
        .await
    }

    pub async fn add_webhook(&self, board_id: &str, url: &str) -> Result<String> {
        self.insert(
            EntityKind::Webhooks,
            json!({
                "board_id": board_id,
                "name": "Deploys",
                "url": url,
                "signing_secret": "whsec_fixture",
                "active": true,
                "subscribed_actions": "[\"card_published\"]",
            }),
        )
        .await
    }

    pub async fn add_event(
        &self,
        board_id: &str,
        creator_id: &str,
        action: &str,
        eventable_type: &str,
        eventable_id: &str,
    ) -> Result<String> {
        self.insert(
            EntityKind::Events,
            json!({
                "board_id": board_id,
                "creator_id": creator_id,
                "action": action,
                "eventable_type": eventable_type,
                "eventable_id": eventable_id,
                "particulars": "{}",
            }),
        )
        .await
    }

    pub async fn add_delivery(&self, webhook_id: &str, event_id: &str) -> Result<String> {
        self.insert(
            EntityKind::WebhookDeliveries,
            json!({
                "webhook_id": webhook_id,
                "event_id": event_id,
                "state": "completed",
                "request": null,
                "response": null,
            }),
        )
        .await
    }

    /// Blob row plus its bytes in `store`.
    pub async fn add_blob(
        &self,
        store: &MemoryAttachmentStore,
        key: &str,
        filename: &str,
        bytes: &[u8],
    ) -> Result<String> {
        store.put(key, bytes.to_vec()).await;
        self.insert(
            EntityKind::Blobs,
            json!({
                "key": key,
                "filename": filename,
                "content_type": "application/octet-stream",
                "byte_size": bytes.len(),
                "checksum": null,
                "metadata": null,
            }),
        )
        .await
    }

    pub async fn add_attachment(
        &self,
        record_type: &str,
        record_id: &str,
        blob_id: &str,
    ) -> Result<String> {
        self.insert(
            EntityKind::Attachments,
            json!({ "name": "embeds", "record_type": record_type, "record_id": record_id, "blob_id": blob_id }),
        )
        .await
    }

    pub async fn counts(&self) -> Result<BTreeMap<EntityKind, u64>> {
        Ok(records::counts_for_account(&self.db, &self.account.id).await?)
    }

    pub async fn count(&self, kind: EntityKind) -> Result<u64> {
        Ok(records::count_for_account(&self.db, kind, &self.account.id).await?)
    }
}

/// Row counts of an arbitrary account.
pub async fn counts_for<C: ConnectionTrait>(db: &C, account_id: &str) -> Result<BTreeMap<EntityKind, u64>> {
    Ok(records::counts_for_account(db, account_id).await?)
}

/// Ids of a seeded [`Workspace`], in creation order.
pub struct Workspace {
    pub tenant: Tenant,
    pub member_id: String,
    pub tag_id: String,
    pub boards: Vec<String>,
    pub cards: Vec<String>,
    pub comment_id: String,
    pub webhook_id: String,
    pub event_id: String,
    pub blob_key: String,
}

pub const WORKSPACE_BLOB: &[u8] = b"release notes, v1";

/// Two boards, five cards, one webhook with a delivered event, a tagged card, a
/// comment linking to other records, and a card attachment embedded in its description.
pub async fn seed_workspace(harness: &Harness, name: &str, owner_email: &str) -> Result<Workspace> {
    let tenant = harness.tenant(name, owner_email).await?;
    let owner_id = tenant.owner.id.clone();
    let member_id = tenant.add_user("Bob", "bob@example.com").await?;
    let tag_id = tenant.add_tag("bug").await?;

    let mut boards = Vec::new();
    let mut cards = Vec::new();
    for (index, board_name) in ["Roadmap", "Support"].iter().enumerate() {
        let board_id = tenant.add_board(board_name, &owner_id).await?;
        let column_id = tenant.add_column(&board_id, "Doing", 0).await?;
        let card_count = if index == 0 { 3 } else { 2 };
        for _ in 0..card_count {
            let number = cards.len() as i64 + 1;
            let creator = if number % 2 == 0 { &member_id } else { &owner_id };
            let card_id = tenant
                .add_card(&board_id, Some(&column_id), creator, number, &format!("Card {}", number))
                .await?;
            cards.push(card_id);
        }
        boards.push(board_id);
    }
    tenant.add_tagging(&cards[0], &tag_id).await?;

    let signer = harness.signer();
    let tag_sgid = signer.sign(&signer.global_id("Tag", &tag_id), ATTACHABLE_PURPOSE);
    let comment_body = format!(
        "<p>See <a href=\"/{slug}/cards/{card}\">the next card</a> on \
         <a href=\"https://app.example.com/{slug}/boards/{board}\">Support</a> and \
         <a href=\"https://elsewhere.example/docs/cards\">the docs</a></p>\
         <attachment-embed sgid=\"{sgid}\"></attachment-embed>",
        slug = tenant.slug(),
        card = cards[1],
        board = boards[1],
        sgid = tag_sgid,
    );
    let comment_id = tenant.add_comment(&cards[0], &member_id, &comment_body).await?;

    let blob_key = "k7dq2xvb3ypfa9".to_string();
    let blob_id = tenant
        .add_blob(&harness.store, &blob_key, "notes.txt", WORKSPACE_BLOB)
        .await?;
    let attachment_id = tenant.add_attachment("Card", &cards[0], &blob_id).await?;
    let attachment_sgid =
        signer.sign(&signer.global_id("Attachment", &attachment_id), ATTACHABLE_PURPOSE);
    tenant
        .add_rich_text(
            "Card",
            &cards[0],
            "description",
            &format!("<p>Notes attached</p><attachment-embed sgid=\"{}\"></attachment-embed>", attachment_sgid),
        )
        .await?;

    let webhook_id = tenant
        .add_webhook(&boards[0], "https://hooks.example.com/deploys")
        .await?;
    let event_id = tenant
        .add_event(&boards[0], &owner_id, "card_published", "Card", &cards[0])
        .await?;
    tenant.add_delivery(&webhook_id, &event_id).await?;

    Ok(Workspace {
        tenant,
        member_id,
        tag_id,
        boards,
        cards,
        comment_id,
        webhook_id,
        event_id,
        blob_key,
    })
}
