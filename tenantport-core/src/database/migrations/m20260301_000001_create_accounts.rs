use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Accounts::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Accounts::Name).string().not_null())
                    .col(ColumnDef::new(Accounts::ExternalAccountId).big_integer().not_null())
                    .col(ColumnDef::new(Accounts::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Accounts::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_accounts_external_account_id")
                    .table(Accounts::Table)
                    .col(Accounts::ExternalAccountId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Identities::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Identities::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Identities::EmailAddress).string().not_null())
                    .col(ColumnDef::new(Identities::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Identities::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_identities_email_address")
                    .table(Identities::Table)
                    .col(Identities::EmailAddress)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AccountJoinCodes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(AccountJoinCodes::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(AccountJoinCodes::AccountId).string().not_null())
                    .col(ColumnDef::new(AccountJoinCodes::Code).string().not_null())
                    .col(ColumnDef::new(AccountJoinCodes::UsageCount).big_integer().not_null())
                    .col(ColumnDef::new(AccountJoinCodes::UsageLimit).big_integer().not_null())
                    .col(ColumnDef::new(AccountJoinCodes::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(AccountJoinCodes::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_account_join_codes_account_id")
                            .from(AccountJoinCodes::Table, AccountJoinCodes::AccountId)
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
                    .name("uq_account_join_codes_account_id")
                    .table(AccountJoinCodes::Table)
                    .col(AccountJoinCodes::AccountId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_account_join_codes_code")
                    .table(AccountJoinCodes::Table)
                    .col(AccountJoinCodes::Code)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Users::AccountId).string().not_null())
                    .col(ColumnDef::new(Users::IdentityId).string())
                    .col(ColumnDef::new(Users::Name).string().not_null())
                    .col(ColumnDef::new(Users::Role).string().not_null())
                    .col(ColumnDef::new(Users::Active).boolean().not_null())
                    .col(ColumnDef::new(Users::VerifiedAt).timestamp())
                    .col(ColumnDef::new(Users::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Users::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_users_account_id")
                            .from(Users::Table, Users::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_users_identity_id")
                            .from(Users::Table, Users::IdentityId)
                            .to(Identities::Table, Identities::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_users_account_id_identity_id")
                    .table(Users::Table)
                    .col(Users::AccountId)
                    .col(Users::IdentityId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_users_account_id")
                    .table(Users::Table)
                    .col(Users::AccountId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AccountImports::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(AccountImports::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(AccountImports::AccountId).string().not_null())
                    .col(ColumnDef::new(AccountImports::IdentityId).string().not_null())
                    .col(ColumnDef::new(AccountImports::Status).string().not_null())
                    .col(ColumnDef::new(AccountImports::FileKey).string())
                    .col(ColumnDef::new(AccountImports::CompletedAt).timestamp())
                    .col(ColumnDef::new(AccountImports::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(AccountImports::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_account_imports_account_id")
                            .from(AccountImports::Table, AccountImports::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_account_imports_identity_id")
                            .from(AccountImports::Table, AccountImports::IdentityId)
                            .to(Identities::Table, Identities::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_account_imports_account_id")
                    .table(AccountImports::Table)
                    .col(AccountImports::AccountId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AccountExports::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(AccountExports::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(AccountExports::AccountId).string().not_null())
                    .col(ColumnDef::new(AccountExports::UserId).string().not_null())
                    .col(ColumnDef::new(AccountExports::Kind).string().not_null())
                    .col(ColumnDef::new(AccountExports::Status).string().not_null())
                    .col(ColumnDef::new(AccountExports::FileKey).string())
                    .col(ColumnDef::new(AccountExports::CompletedAt).timestamp())
                    .col(ColumnDef::new(AccountExports::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(AccountExports::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_account_exports_account_id")
                            .from(AccountExports::Table, AccountExports::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_account_exports_user_id")
                            .from(AccountExports::Table, AccountExports::UserId)
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
                    .name("idx_account_exports_account_id")
                    .table(AccountExports::Table)
                    .col(AccountExports::AccountId)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AccountExports::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AccountImports::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AccountJoinCodes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Identities::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;
        Ok(())
    }
}


#[derive(Iden)]
enum Accounts {
    Table,
    Id,
    Name,
    ExternalAccountId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Identities {
    Table,
    Id,
    EmailAddress,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum AccountJoinCodes {
    Table,
    Id,
    AccountId,
    Code,
    UsageCount,
    UsageLimit,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
    AccountId,
    IdentityId,
    Name,
    Role,
    Active,
    VerifiedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum AccountImports {
    Table,
    Id,
    AccountId,
    IdentityId,
    Status,
    FileKey,
    CompletedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum AccountExports {
    Table,
    Id,
    AccountId,
    UserId,
    Kind,
    Status,
    FileKey,
    CompletedAt,
    CreatedAt,
    UpdatedAt,
}
