use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Blobs::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Blobs::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Blobs::AccountId).string().not_null())
                    .col(ColumnDef::new(Blobs::Key).string().not_null())
                    .col(ColumnDef::new(Blobs::Filename).string().not_null())
                    .col(ColumnDef::new(Blobs::ContentType).string())
                    .col(ColumnDef::new(Blobs::ByteSize).big_integer().not_null())
                    .col(ColumnDef::new(Blobs::Checksum).string())
                    .col(ColumnDef::new(Blobs::Metadata).text())
                    .col(ColumnDef::new(Blobs::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Blobs::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_blobs_account_id")
                            .from(Blobs::Table, Blobs::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_blobs_key")
                    .table(Blobs::Table)
                    .col(Blobs::Key)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Attachments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Attachments::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Attachments::AccountId).string().not_null())
                    .col(ColumnDef::new(Attachments::Name).string().not_null())
                    .col(ColumnDef::new(Attachments::RecordType).string().not_null())
                    .col(ColumnDef::new(Attachments::RecordId).string().not_null())
                    .col(ColumnDef::new(Attachments::BlobId).string().not_null())
                    .col(ColumnDef::new(Attachments::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Attachments::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_attachments_account_id")
                            .from(Attachments::Table, Attachments::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_attachments_blob_id")
                            .from(Attachments::Table, Attachments::BlobId)
                            .to(Blobs::Table, Blobs::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_attachments_record_type_record_id")
                    .table(Attachments::Table)
                    .col(Attachments::RecordType)
                    .col(Attachments::RecordId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_attachments_blob_id")
                    .table(Attachments::Table)
                    .col(Attachments::BlobId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RichTexts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(RichTexts::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(RichTexts::AccountId).string().not_null())
                    .col(ColumnDef::new(RichTexts::Name).string().not_null())
                    .col(ColumnDef::new(RichTexts::Body).text().not_null())
                    .col(ColumnDef::new(RichTexts::RecordType).string().not_null())
                    .col(ColumnDef::new(RichTexts::RecordId).string().not_null())
                    .col(ColumnDef::new(RichTexts::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(RichTexts::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rich_texts_account_id")
                            .from(RichTexts::Table, RichTexts::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_rich_texts_record_type_record_id_name")
                    .table(RichTexts::Table)
                    .col(RichTexts::RecordType)
                    .col(RichTexts::RecordId)
                    .col(RichTexts::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RichTexts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Attachments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Blobs::Table).to_owned())
            .await?;
        Ok(())
    }
}


#[derive(Iden)]
enum Blobs {
    Table,
    Id,
    AccountId,
    Key,
    Filename,
    ContentType,
    ByteSize,
    Checksum,
    Metadata,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Attachments {
    Table,
    Id,
    AccountId,
    Name,
    RecordType,
    RecordId,
    BlobId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum RichTexts {
    Table,
    Id,
    AccountId,
    Name,
    Body,
    RecordType,
    RecordId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
}
