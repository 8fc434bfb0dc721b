use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Accesses::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Accesses::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Accesses::AccountId).string().not_null())
                    .col(ColumnDef::new(Accesses::BoardId).string().not_null())
                    .col(ColumnDef::new(Accesses::UserId).string().not_null())
                    .col(ColumnDef::new(Accesses::Involvement).string().not_null())
                    .col(ColumnDef::new(Accesses::AccessedAt).timestamp())
                    .col(ColumnDef::new(Accesses::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Accesses::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_accesses_account_id")
                            .from(Accesses::Table, Accesses::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_accesses_board_id")
                            .from(Accesses::Table, Accesses::BoardId)
                            .to(Boards::Table, Boards::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_accesses_user_id")
                            .from(Accesses::Table, Accesses::UserId)
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
                    .name("uq_accesses_board_id_user_id")
                    .table(Accesses::Table)
                    .col(Accesses::BoardId)
                    .col(Accesses::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Assignments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Assignments::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Assignments::AccountId).string().not_null())
                    .col(ColumnDef::new(Assignments::CardId).string().not_null())
                    .col(ColumnDef::new(Assignments::AssigneeId).string().not_null())
                    .col(ColumnDef::new(Assignments::AssignerId).string().not_null())
                    .col(ColumnDef::new(Assignments::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Assignments::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_assignments_account_id")
                            .from(Assignments::Table, Assignments::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_assignments_card_id")
                            .from(Assignments::Table, Assignments::CardId)
                            .to(Cards::Table, Cards::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_assignments_assignee_id")
                            .from(Assignments::Table, Assignments::AssigneeId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_assignments_assigner_id")
                            .from(Assignments::Table, Assignments::AssignerId)
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
                    .name("idx_assignments_card_id")
                    .table(Assignments::Table)
                    .col(Assignments::CardId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Taggings::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Taggings::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Taggings::AccountId).string().not_null())
                    .col(ColumnDef::new(Taggings::CardId).string().not_null())
                    .col(ColumnDef::new(Taggings::TagId).string().not_null())
                    .col(ColumnDef::new(Taggings::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Taggings::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_taggings_account_id")
                            .from(Taggings::Table, Taggings::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_taggings_card_id")
                            .from(Taggings::Table, Taggings::CardId)
                            .to(Cards::Table, Cards::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_taggings_tag_id")
                            .from(Taggings::Table, Taggings::TagId)
                            .to(Tags::Table, Tags::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_taggings_card_id_tag_id")
                    .table(Taggings::Table)
                    .col(Taggings::CardId)
                    .col(Taggings::TagId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Closures::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Closures::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Closures::AccountId).string().not_null())
                    .col(ColumnDef::new(Closures::CardId).string().not_null())
                    .col(ColumnDef::new(Closures::UserId).string())
                    .col(ColumnDef::new(Closures::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Closures::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_closures_account_id")
                            .from(Closures::Table, Closures::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_closures_card_id")
                            .from(Closures::Table, Closures::CardId)
                            .to(Cards::Table, Cards::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_closures_user_id")
                            .from(Closures::Table, Closures::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_closures_card_id")
                    .table(Closures::Table)
                    .col(Closures::CardId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CardGoldnesses::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(CardGoldnesses::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(CardGoldnesses::AccountId).string().not_null())
                    .col(ColumnDef::new(CardGoldnesses::CardId).string().not_null())
                    .col(ColumnDef::new(CardGoldnesses::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(CardGoldnesses::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_card_goldnesses_account_id")
                            .from(CardGoldnesses::Table, CardGoldnesses::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_card_goldnesses_card_id")
                            .from(CardGoldnesses::Table, CardGoldnesses::CardId)
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
                    .name("uq_card_goldnesses_card_id")
                    .table(CardGoldnesses::Table)
                    .col(CardGoldnesses::CardId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CardNotNows::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(CardNotNows::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(CardNotNows::AccountId).string().not_null())
                    .col(ColumnDef::new(CardNotNows::CardId).string().not_null())
                    .col(ColumnDef::new(CardNotNows::UserId).string())
                    .col(ColumnDef::new(CardNotNows::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(CardNotNows::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_card_not_nows_account_id")
                            .from(CardNotNows::Table, CardNotNows::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_card_not_nows_card_id")
                            .from(CardNotNows::Table, CardNotNows::CardId)
                            .to(Cards::Table, Cards::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_card_not_nows_user_id")
                            .from(CardNotNows::Table, CardNotNows::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_card_not_nows_card_id")
                    .table(CardNotNows::Table)
                    .col(CardNotNows::CardId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CardActivitySpikes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(CardActivitySpikes::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(CardActivitySpikes::AccountId).string().not_null())
                    .col(ColumnDef::new(CardActivitySpikes::CardId).string().not_null())
                    .col(ColumnDef::new(CardActivitySpikes::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(CardActivitySpikes::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_card_activity_spikes_account_id")
                            .from(CardActivitySpikes::Table, CardActivitySpikes::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_card_activity_spikes_card_id")
                            .from(CardActivitySpikes::Table, CardActivitySpikes::CardId)
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
                    .name("idx_card_activity_spikes_card_id")
                    .table(CardActivitySpikes::Table)
                    .col(CardActivitySpikes::CardId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Watches::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Watches::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Watches::AccountId).string().not_null())
                    .col(ColumnDef::new(Watches::CardId).string().not_null())
                    .col(ColumnDef::new(Watches::UserId).string().not_null())
                    .col(ColumnDef::new(Watches::Watching).boolean().not_null())
                    .col(ColumnDef::new(Watches::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Watches::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_watches_account_id")
                            .from(Watches::Table, Watches::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_watches_card_id")
                            .from(Watches::Table, Watches::CardId)
                            .to(Cards::Table, Cards::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_watches_user_id")
                            .from(Watches::Table, Watches::UserId)
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
                    .name("uq_watches_card_id_user_id")
                    .table(Watches::Table)
                    .col(Watches::CardId)
                    .col(Watches::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Pins::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Pins::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Pins::AccountId).string().not_null())
                    .col(ColumnDef::new(Pins::CardId).string().not_null())
                    .col(ColumnDef::new(Pins::UserId).string().not_null())
                    .col(ColumnDef::new(Pins::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Pins::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_pins_account_id")
                            .from(Pins::Table, Pins::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_pins_card_id")
                            .from(Pins::Table, Pins::CardId)
                            .to(Cards::Table, Cards::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_pins_user_id")
                            .from(Pins::Table, Pins::UserId)
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
                    .name("uq_pins_card_id_user_id")
                    .table(Pins::Table)
                    .col(Pins::CardId)
                    .col(Pins::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Reactions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Reactions::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Reactions::AccountId).string().not_null())
                    .col(ColumnDef::new(Reactions::CommentId).string().not_null())
                    .col(ColumnDef::new(Reactions::ReacterId).string().not_null())
                    .col(ColumnDef::new(Reactions::Content).string().not_null())
                    .col(ColumnDef::new(Reactions::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Reactions::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reactions_account_id")
                            .from(Reactions::Table, Reactions::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reactions_comment_id")
                            .from(Reactions::Table, Reactions::CommentId)
                            .to(Comments::Table, Comments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reactions_reacter_id")
                            .from(Reactions::Table, Reactions::ReacterId)
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
                    .name("idx_reactions_comment_id")
                    .table(Reactions::Table)
                    .col(Reactions::CommentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Mentions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Mentions::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Mentions::AccountId).string().not_null())
                    .col(ColumnDef::new(Mentions::SourceType).string().not_null())
                    .col(ColumnDef::new(Mentions::SourceId).string().not_null())
                    .col(ColumnDef::new(Mentions::MentionerId).string().not_null())
                    .col(ColumnDef::new(Mentions::MentioneeId).string().not_null())
                    .col(ColumnDef::new(Mentions::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Mentions::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_mentions_account_id")
                            .from(Mentions::Table, Mentions::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_mentions_mentioner_id")
                            .from(Mentions::Table, Mentions::MentionerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_mentions_mentionee_id")
                            .from(Mentions::Table, Mentions::MentioneeId)
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
                    .name("idx_mentions_source_type_source_id")
                    .table(Mentions::Table)
                    .col(Mentions::SourceType)
                    .col(Mentions::SourceId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Filters::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Filters::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Filters::AccountId).string().not_null())
                    .col(ColumnDef::new(Filters::CreatorId).string().not_null())
                    .col(ColumnDef::new(Filters::ParamsDigest).string().not_null())
                    .col(ColumnDef::new(Filters::Fields).text().not_null())
                    .col(ColumnDef::new(Filters::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Filters::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_filters_account_id")
                            .from(Filters::Table, Filters::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_filters_creator_id")
                            .from(Filters::Table, Filters::CreatorId)
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
                    .name("idx_filters_creator_id")
                    .table(Filters::Table)
                    .col(Filters::CreatorId)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Filters::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Mentions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Reactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Pins::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Watches::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CardActivitySpikes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CardNotNows::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CardGoldnesses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Closures::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Taggings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Assignments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accesses::Table).to_owned())
            .await?;
        Ok(())
    }
}


#[derive(Iden)]
enum Accesses {
    Table,
    Id,
    AccountId,
    BoardId,
    UserId,
    Involvement,
    AccessedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Assignments {
    Table,
    Id,
    AccountId,
    CardId,
    AssigneeId,
    AssignerId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Taggings {
    Table,
    Id,
    AccountId,
    CardId,
    TagId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Closures {
    Table,
    Id,
    AccountId,
    CardId,
    UserId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum CardGoldnesses {
    Table,
    Id,
    AccountId,
    CardId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum CardNotNows {
    Table,
    Id,
    AccountId,
    CardId,
    UserId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum CardActivitySpikes {
    Table,
    Id,
    AccountId,
    CardId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Watches {
    Table,
    Id,
    AccountId,
    CardId,
    UserId,
    Watching,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Pins {
    Table,
    Id,
    AccountId,
    CardId,
    UserId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Reactions {
    Table,
    Id,
    AccountId,
    CommentId,
    ReacterId,
    Content,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Mentions {
    Table,
    Id,
    AccountId,
    SourceType,
    SourceId,
    MentionerId,
    MentioneeId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Filters {
    Table,
    Id,
    AccountId,
    CreatorId,
    ParamsDigest,
    Fields,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
}

#[derive(Iden)]
enum Boards {
    Table,
    Id,
}

#[derive(Iden)]
enum Cards {
    Table,
    Id,
}

#[derive(Iden)]
enum Comments {
    Table,
    Id,
}

#[derive(Iden)]
enum Tags {
    Table,
    Id,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}
