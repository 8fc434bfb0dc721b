//! Archive generation for whole accounts and single users.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{Seek, Write};

use sea_orm::{ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use strum::{Display, EnumString};
use tracing::{debug, warn};

use super::entity_kind::EntityKind;
use super::records;
use super::rich_text::{embedded_global_ids, to_portable_body};
use crate::archive::{ArchiveWriter, Attributes, JoinCodeDocument, RootDocument};
use crate::collaborators::{AttachmentStore, ReferenceSigner};
use crate::database::entities::{
    accesses, account_join_codes, accounts, attachments, blobs, boards, cards, comments,
    identities, rich_texts, users,
};
use crate::errors::{ArchiveError, TransferError, TransferResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExportKind {
    WholeAccount,
    SingleUser,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    pub documents: usize,
    pub blobs_written: usize,
    pub blobs_skipped: usize,
}

pub struct Exporter<'a, C: ConnectionTrait> {
    db: &'a C,
    store: &'a dyn AttachmentStore,
    signer: &'a ReferenceSigner,
}

impl<'a, C: ConnectionTrait> Exporter<'a, C> {
    pub fn new(db: &'a C, store: &'a dyn AttachmentStore, signer: &'a ReferenceSigner) -> Self {
        Self { db, store, signer }
    }

    /// Writes every migrating row of `account` plus its attachment bytes.
    pub async fn write_account<W: Write + Seek>(
        &self,
        account: &accounts::Model,
        writer: &mut ArchiveWriter<W>,
    ) -> TransferResult<ExportSummary> {
        let mut summary = ExportSummary::default();
        writer.write_root(&self.root_document(account).await?)?;

        for kind in EntityKind::in_import_order() {
            let rows = records::rows_for_account(self.db, kind, &account.id).await?;
            for mut row in rows {
                let id = row
                    .get("id")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| TransferError::invalid_document(kind.directory(), "row without id"))?;
                match kind {
                    EntityKind::Users => self.portable_user(&mut row).await?,
                    EntityKind::RichTexts => self.portable_rich_text(&mut row),
                    _ => {}
                }
                writer.write_document(kind, &id, &row)?;
                summary.documents += 1;
            }
        }

        let blobs = blobs::Entity::find()
            .filter(blobs::Column::AccountId.eq(account.id.as_str()))
            .order_by_asc(blobs::Column::Key)
            .all(self.db)
            .await?;
        for blob in blobs {
            let path = crate::archive::blob_path(&blob.key);
            if self.copy_blob(&blob.key, &path, writer).await? {
                summary.blobs_written += 1;
            } else {
                summary.blobs_skipped += 1;
            }
        }

        debug!(
            account_id = %account.id,
            documents = summary.documents,
            blobs = summary.blobs_written,
            "Wrote account archive"
        );
        Ok(summary)
    }

    /// Writes the cards `user` can reach, one document per card with its comments, plus
    /// the files attached to each card or embedded in its rich text.
    pub async fn write_single_user<W: Write + Seek>(
        &self,
        account: &accounts::Model,
        user: &users::Model,
        writer: &mut ArchiveWriter<W>,
    ) -> TransferResult<ExportSummary> {
        let mut summary = ExportSummary::default();
        let boards = self.accessible_boards(account, user).await?;
        let board_names: BTreeMap<String, String> =
            boards.iter().map(|b| (b.id.clone(), b.name.clone())).collect();

        let cards = cards::Entity::find()
            .filter(cards::Column::AccountId.eq(account.id.as_str()))
            .filter(cards::Column::BoardId.is_in(board_names.keys().cloned()))
            .order_by_asc(cards::Column::Number)
            .all(self.db)
            .await?;

        let user_names: BTreeMap<String, String> = users::Entity::find()
            .filter(users::Column::AccountId.eq(account.id.as_str()))
            .all(self.db)
            .await?
            .into_iter()
            .map(|u| (u.id, u.name))
            .collect();
        let name_of = |id: &str| user_names.get(id).cloned().unwrap_or_default();

        for card in cards {
            let description = self.rich_text("Card", &card.id, "description").await?;
            let mut bodies: Vec<&rich_texts::Model> = description.iter().collect();

            let comments = comments::Entity::find()
                .filter(comments::Column::CardId.eq(card.id.as_str()))
                .order_by_asc(comments::Column::CreatedAt)
                .all(self.db)
                .await?;
            let mut comment_bodies = Vec::with_capacity(comments.len());
            for comment in &comments {
                comment_bodies.push(self.rich_text("Comment", &comment.id, "body").await?);
            }
            bodies.extend(comment_bodies.iter().flatten());

            let document = json!({
                "number": card.number,
                "title": card.title,
                "status": card.status,
                "board": board_names.get(&card.board_id),
                "creator": name_of(&card.creator_id),
                "created_at": card.created_at,
                "description": description.as_ref().map(|rt| to_portable_body(self.signer, &rt.body)),
                "comments": comments
                    .iter()
                    .zip(&comment_bodies)
                    .map(|(comment, body)| json!({
                        "creator": name_of(&comment.creator_id),
                        "created_at": comment.created_at,
                        "body": body.as_ref().map(|rt| to_portable_body(self.signer, &rt.body)),
                    }))
                    .collect::<Vec<_>>(),
            });
            writer.write_json(&format!("cards/{}.json", card.number), &document)?;
            summary.documents += 1;

            let embedded: BTreeSet<String> = bodies
                .iter()
                .flat_map(|rt| embedded_global_ids(self.signer, &rt.body))
                .filter(|gid| gid.tag == EntityKind::Attachments.type_tag())
                .map(|gid| gid.id)
                .collect();
            for blob in self.card_blobs(&card.id, &embedded).await? {
                let path = format!("cards/{}/{}-{}", card.number, blob.key, blob.filename);
                if self.copy_blob(&blob.key, &path, writer).await? {
                    summary.blobs_written += 1;
                } else {
                    summary.blobs_skipped += 1;
                }
            }
        }

        debug!(
            account_id = %account.id,
            user_id = %user.id,
            cards = summary.documents,
            "Wrote single-user archive"
        );
        Ok(summary)
    }

    async fn root_document(&self, account: &accounts::Model) -> TransferResult<RootDocument> {
        let join_code = account_join_codes::Entity::find()
            .filter(account_join_codes::Column::AccountId.eq(account.id.as_str()))
            .one(self.db)
            .await?
            .map(|jc| JoinCodeDocument {
                code: jc.code,
                usage_count: jc.usage_count,
                usage_limit: jc.usage_limit,
            });
        Ok(RootDocument {
            id: account.id.clone(),
            name: account.name.clone(),
            external_account_id: account.external_account_id,
            join_code,
        })
    }

    /// Replaces `identity_id` with the identity's email so the user can be matched on import.
    async fn portable_user(&self, row: &mut Attributes) -> TransferResult<()> {
        let identity_id = row
            .remove("identity_id")
            .and_then(|v| v.as_str().map(str::to_string));
        let Some(identity_id) = identity_id else {
            return Ok(());
        };
        if let Some(identity) = identities::Entity::find_by_id(identity_id).one(self.db).await? {
            row.insert("email_address".to_string(), Value::String(identity.email_address));
        }
        Ok(())
    }

    fn portable_rich_text(&self, row: &mut Attributes) {
        if let Some(body) = row.get("body").and_then(Value::as_str) {
            let portable = to_portable_body(self.signer, body);
            row.insert("body".to_string(), Value::String(portable));
        }
    }

    async fn accessible_boards(
        &self,
        account: &accounts::Model,
        user: &users::Model,
    ) -> TransferResult<Vec<boards::Model>> {
        let granted: Vec<String> = accesses::Entity::find()
            .filter(accesses::Column::UserId.eq(user.id.as_str()))
            .all(self.db)
            .await?
            .into_iter()
            .map(|access| access.board_id)
            .collect();

        Ok(boards::Entity::find()
            .filter(boards::Column::AccountId.eq(account.id.as_str()))
            .filter(
                Condition::any()
                    .add(boards::Column::AllAccess.eq(true))
                    .add(boards::Column::Id.is_in(granted)),
            )
            .all(self.db)
            .await?)
    }

    async fn rich_text(
        &self,
        record_type: &str,
        record_id: &str,
        name: &str,
    ) -> TransferResult<Option<rich_texts::Model>> {
        Ok(rich_texts::Entity::find()
            .filter(rich_texts::Column::RecordType.eq(record_type))
            .filter(rich_texts::Column::RecordId.eq(record_id))
            .filter(rich_texts::Column::Name.eq(name))
            .one(self.db)
            .await?)
    }

    /// Blobs attached to the card itself or embedded in its rich text.
    async fn card_blobs(
        &self,
        card_id: &str,
        embedded_attachments: &BTreeSet<String>,
    ) -> TransferResult<Vec<blobs::Model>> {
        let blob_ids: Vec<String> = attachments::Entity::find()
            .filter(
                Condition::any()
                    .add(
                        Condition::all()
                            .add(attachments::Column::RecordType.eq(EntityKind::Cards.type_tag()))
                            .add(attachments::Column::RecordId.eq(card_id)),
                    )
                    .add(attachments::Column::Id.is_in(embedded_attachments.iter().cloned())),
            )
            .all(self.db)
            .await?
            .into_iter()
            .map(|attachment| attachment.blob_id)
            .collect();
        if blob_ids.is_empty() {
            return Ok(Vec::new());
        }

        Ok(blobs::Entity::find()
            .filter(blobs::Column::Id.is_in(blob_ids))
            .order_by_asc(blobs::Column::Key)
            .all(self.db)
            .await?)
    }

    /// Streams one stored file into the archive. Missing or unreadable files are
    /// skipped and reported as `false`.
    async fn copy_blob<W: Write + Seek>(
        &self,
        key: &str,
        path: &str,
        writer: &mut ArchiveWriter<W>,
    ) -> TransferResult<bool> {
        let mut reader = match self.store.open(key).await {
            Ok(reader) => reader,
            Err(err) => {
                warn!(key = %key, error = %err, "Skipping attachment that could not be opened");
                return Ok(false);
            }
        };
        match writer.stream_entry(path, &mut reader).await {
            Ok(_) => Ok(true),
            Err(ArchiveError::Io(err)) => {
                warn!(key = %key, error = %err, "Skipping attachment that could not be copied");
                Ok(false)
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::BlobReader;
    use crate::database::test_utils::{seed_account, setup_test_db};
    use crate::errors::StorageError;
    use async_trait::async_trait;
    use chrono::Utc;
    use sea_orm::{ActiveModelTrait, Set};
    use std::io::Cursor;
    use tokio::io::AsyncRead;

    /// Yields one chunk of every file, then fails.
    struct FlakyStore;

    #[async_trait]
    impl AttachmentStore for FlakyStore {
        async fn open(&self, _key: &str) -> Result<BlobReader, StorageError> {
            Ok(Box::new(
                tokio_test::io::Builder::new()
                    .read(b"first chunk")
                    .read_error(std::io::Error::new(
                        std::io::ErrorKind::ConnectionReset,
                        "connection reset",
                    ))
                    .build(),
            ))
        }

        async fn upload(
            &self,
            key: &str,
            _reader: &mut (dyn AsyncRead + Send + Unpin),
        ) -> Result<u64, StorageError> {
            Err(StorageError::InvalidKey(key.to_string()))
        }

        async fn delete(&self, _key: &str) -> Result<(), StorageError> {
            Ok(())
        }

        async fn exists(&self, _key: &str) -> Result<bool, StorageError> {
            Ok(true)
        }
    }

    #[tokio::test]
    async fn test_unreadable_blob_is_skipped() {
        let db = setup_test_db().await;
        let account = seed_account(&db, "Acme").await;
        let now = Utc::now();
        blobs::ActiveModel {
            id: Set(records::new_id()),
            account_id: Set(account.id.clone()),
            key: Set("k7flaky2mx".to_string()),
            filename: Set("notes.txt".to_string()),
            content_type: Set(Some("text/plain".to_string())),
            byte_size: Set(42),
            checksum: Set(None),
            metadata: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&db)
        .await
        .unwrap();

        let store = FlakyStore;
        let signer = ReferenceSigner::new("secret", "tenantport");
        let exporter = Exporter::new(&db, &store, &signer);
        let mut writer = ArchiveWriter::new(Cursor::new(Vec::new()), 4);
        let summary = exporter.write_account(&account, &mut writer).await.unwrap();

        assert_eq!(summary.blobs_written, 0);
        assert_eq!(summary.blobs_skipped, 1);
        assert!(summary.documents >= 1);

        let bytes = writer.finish().unwrap().into_inner();
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert!(archive.file_names().any(|name| name.starts_with("data/blobs/")));
        assert!(!archive.file_names().any(|name| name.starts_with("storage/")));
    }
}
