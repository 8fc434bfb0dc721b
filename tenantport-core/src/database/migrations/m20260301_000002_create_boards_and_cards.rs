use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tags::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Tags::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Tags::AccountId).string().not_null())
                    .col(ColumnDef::new(Tags::Title).string().not_null())
                    .col(ColumnDef::new(Tags::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Tags::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tags_account_id")
                            .from(Tags::Table, Tags::AccountId)
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
                    .name("uq_tags_account_id_title")
                    .table(Tags::Table)
                    .col(Tags::AccountId)
                    .col(Tags::Title)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Boards::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Boards::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Boards::AccountId).string().not_null())
                    .col(ColumnDef::new(Boards::CreatorId).string().not_null())
                    .col(ColumnDef::new(Boards::Name).string().not_null())
                    .col(ColumnDef::new(Boards::AllAccess).boolean().not_null())
                    .col(ColumnDef::new(Boards::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Boards::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_boards_account_id")
                            .from(Boards::Table, Boards::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_boards_creator_id")
                            .from(Boards::Table, Boards::CreatorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_boards_account_id")
                    .table(Boards::Table)
                    .col(Boards::AccountId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Columns::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Columns::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Columns::AccountId).string().not_null())
                    .col(ColumnDef::new(Columns::BoardId).string().not_null())
                    .col(ColumnDef::new(Columns::Name).string().not_null())
                    .col(ColumnDef::new(Columns::Color).string().not_null())
                    .col(ColumnDef::new(Columns::Position).integer().not_null())
                    .col(ColumnDef::new(Columns::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Columns::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_columns_account_id")
                            .from(Columns::Table, Columns::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_columns_board_id")
                            .from(Columns::Table, Columns::BoardId)
                            .to(Boards::Table, Boards::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_columns_board_id")
                    .table(Columns::Table)
                    .col(Columns::BoardId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Entropies::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Entropies::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Entropies::AccountId).string().not_null())
                    .col(ColumnDef::new(Entropies::ContainerType).string().not_null())
                    .col(ColumnDef::new(Entropies::ContainerId).string().not_null())
                    .col(ColumnDef::new(Entropies::AutoPostponePeriod).big_integer().not_null())
                    .col(ColumnDef::new(Entropies::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Entropies::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_entropies_account_id")
                            .from(Entropies::Table, Entropies::AccountId)
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
                    .name("uq_entropies_container_type_container_id")
                    .table(Entropies::Table)
                    .col(Entropies::ContainerType)
                    .col(Entropies::ContainerId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BoardPublications::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(BoardPublications::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(BoardPublications::AccountId).string().not_null())
                    .col(ColumnDef::new(BoardPublications::BoardId).string().not_null())
                    .col(ColumnDef::new(BoardPublications::Key).string().not_null())
                    .col(ColumnDef::new(BoardPublications::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(BoardPublications::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_board_publications_account_id")
                            .from(BoardPublications::Table, BoardPublications::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_board_publications_board_id")
                            .from(BoardPublications::Table, BoardPublications::BoardId)
                            .to(Boards::Table, Boards::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_board_publications_key")
                    .table(BoardPublications::Table)
                    .col(BoardPublications::Key)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Cards::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Cards::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Cards::AccountId).string().not_null())
                    .col(ColumnDef::new(Cards::BoardId).string().not_null())
                    .col(ColumnDef::new(Cards::ColumnId).string())
                    .col(ColumnDef::new(Cards::CreatorId).string().not_null())
                    .col(ColumnDef::new(Cards::Number).big_integer().not_null())
                    .col(ColumnDef::new(Cards::Title).string().not_null())
                    .col(ColumnDef::new(Cards::Status).string().not_null())
                    .col(ColumnDef::new(Cards::LastActiveAt).timestamp())
                    .col(ColumnDef::new(Cards::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Cards::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cards_account_id")
                            .from(Cards::Table, Cards::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cards_board_id")
                            .from(Cards::Table, Cards::BoardId)
                            .to(Boards::Table, Boards::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cards_column_id")
                            .from(Cards::Table, Cards::ColumnId)
                            .to(Columns::Table, Columns::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cards_creator_id")
                            .from(Cards::Table, Cards::CreatorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_cards_account_id_number")
                    .table(Cards::Table)
                    .col(Cards::AccountId)
                    .col(Cards::Number)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_cards_board_id")
                    .table(Cards::Table)
                    .col(Cards::BoardId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Comments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Comments::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Comments::AccountId).string().not_null())
                    .col(ColumnDef::new(Comments::CardId).string().not_null())
                    .col(ColumnDef::new(Comments::CreatorId).string().not_null())
                    .col(ColumnDef::new(Comments::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Comments::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comments_account_id")
                            .from(Comments::Table, Comments::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comments_card_id")
                            .from(Comments::Table, Comments::CardId)
                            .to(Cards::Table, Cards::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comments_creator_id")
                            .from(Comments::Table, Comments::CreatorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_comments_card_id")
                    .table(Comments::Table)
                    .col(Comments::CardId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Steps::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Steps::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Steps::AccountId).string().not_null())
                    .col(ColumnDef::new(Steps::CardId).string().not_null())
                    .col(ColumnDef::new(Steps::Content).string().not_null())
                    .col(ColumnDef::new(Steps::Completed).boolean().not_null())
                    .col(ColumnDef::new(Steps::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Steps::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_steps_account_id")
                            .from(Steps::Table, Steps::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_steps_card_id")
                            .from(Steps::Table, Steps::CardId)
                            .to(Cards::Table, Cards::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_steps_card_id")
                    .table(Steps::Table)
                    .col(Steps::CardId)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Steps::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Comments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Cards::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BoardPublications::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Entropies::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Columns::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Boards::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tags::Table).to_owned())
            .await?;
        Ok(())
    }
}


#[derive(Iden)]
enum Tags {
    Table,
    Id,
    AccountId,
    Title,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Boards {
    Table,
    Id,
    AccountId,
    CreatorId,
    Name,
    AllAccess,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Columns {
    Table,
    Id,
    AccountId,
    BoardId,
    Name,
    Color,
    Position,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Entropies {
    Table,
    Id,
    AccountId,
    ContainerType,
    ContainerId,
    AutoPostponePeriod,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum BoardPublications {
    Table,
    Id,
    AccountId,
    BoardId,
    Key,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Cards {
    Table,
    Id,
    AccountId,
    BoardId,
    ColumnId,
    CreatorId,
    Number,
    Title,
    Status,
    LastActiveAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Comments {
    Table,
    Id,
    AccountId,
    CardId,
    CreatorId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Steps {
    Table,
    Id,
    AccountId,
    CardId,
    Content,
    Completed,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}
