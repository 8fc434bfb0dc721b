use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Webhooks::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Webhooks::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Webhooks::AccountId).string().not_null())
                    .col(ColumnDef::new(Webhooks::BoardId).string().not_null())
                    .col(ColumnDef::new(Webhooks::Name).string().not_null())
                    .col(ColumnDef::new(Webhooks::Url).string().not_null())
                    .col(ColumnDef::new(Webhooks::SigningSecret).string().not_null())
                    .col(ColumnDef::new(Webhooks::Active).boolean().not_null())
                    .col(ColumnDef::new(Webhooks::SubscribedActions).text().not_null())
                    .col(ColumnDef::new(Webhooks::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Webhooks::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_webhooks_account_id")
                            .from(Webhooks::Table, Webhooks::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_webhooks_board_id")
                            .from(Webhooks::Table, Webhooks::BoardId)
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
                    .name("idx_webhooks_board_id")
                    .table(Webhooks::Table)
                    .col(Webhooks::BoardId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(WebhookDelinquencyTrackers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(WebhookDelinquencyTrackers::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(WebhookDelinquencyTrackers::AccountId).string().not_null())
                    .col(ColumnDef::new(WebhookDelinquencyTrackers::WebhookId).string().not_null())
                    .col(ColumnDef::new(WebhookDelinquencyTrackers::ConsecutiveFailuresCount).integer().not_null())
                    .col(ColumnDef::new(WebhookDelinquencyTrackers::FirstFailureAt).timestamp())
                    .col(ColumnDef::new(WebhookDelinquencyTrackers::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(WebhookDelinquencyTrackers::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_webhook_delinquency_trackers_account_id")
                            .from(WebhookDelinquencyTrackers::Table, WebhookDelinquencyTrackers::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_webhook_delinquency_trackers_webhook_id")
                            .from(WebhookDelinquencyTrackers::Table, WebhookDelinquencyTrackers::WebhookId)
                            .to(Webhooks::Table, Webhooks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_webhook_delinquency_trackers_webhook_id")
                    .table(WebhookDelinquencyTrackers::Table)
                    .col(WebhookDelinquencyTrackers::WebhookId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(WebhookDeliveries::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(WebhookDeliveries::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(WebhookDeliveries::AccountId).string().not_null())
                    .col(ColumnDef::new(WebhookDeliveries::WebhookId).string().not_null())
                    .col(ColumnDef::new(WebhookDeliveries::EventId).string())
                    .col(ColumnDef::new(WebhookDeliveries::State).string().not_null())
                    .col(ColumnDef::new(WebhookDeliveries::Request).text())
                    .col(ColumnDef::new(WebhookDeliveries::Response).text())
                    .col(ColumnDef::new(WebhookDeliveries::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(WebhookDeliveries::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_webhook_deliveries_account_id")
                            .from(WebhookDeliveries::Table, WebhookDeliveries::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_webhook_deliveries_webhook_id")
                            .from(WebhookDeliveries::Table, WebhookDeliveries::WebhookId)
                            .to(Webhooks::Table, Webhooks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_webhook_deliveries_webhook_id")
                    .table(WebhookDeliveries::Table)
                    .col(WebhookDeliveries::WebhookId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_webhook_deliveries_event_id")
                    .table(WebhookDeliveries::Table)
                    .col(WebhookDeliveries::EventId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Events::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Events::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Events::AccountId).string().not_null())
                    .col(ColumnDef::new(Events::BoardId).string().not_null())
                    .col(ColumnDef::new(Events::CreatorId).string().not_null())
                    .col(ColumnDef::new(Events::Action).string().not_null())
                    .col(ColumnDef::new(Events::EventableType).string().not_null())
                    .col(ColumnDef::new(Events::EventableId).string().not_null())
                    .col(ColumnDef::new(Events::Particulars).text().not_null())
                    .col(ColumnDef::new(Events::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Events::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_events_account_id")
                            .from(Events::Table, Events::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_events_board_id")
                            .from(Events::Table, Events::BoardId)
                            .to(Boards::Table, Boards::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_events_creator_id")
                            .from(Events::Table, Events::CreatorId)
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
                    .name("idx_events_board_id")
                    .table(Events::Table)
                    .col(Events::BoardId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_events_eventable_type_eventable_id")
                    .table(Events::Table)
                    .col(Events::EventableType)
                    .col(Events::EventableId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Notifications::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Notifications::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Notifications::AccountId).string().not_null())
                    .col(ColumnDef::new(Notifications::UserId).string().not_null())
                    .col(ColumnDef::new(Notifications::CreatorId).string())
                    .col(ColumnDef::new(Notifications::SourceType).string().not_null())
                    .col(ColumnDef::new(Notifications::SourceId).string().not_null())
                    .col(ColumnDef::new(Notifications::ReadAt).timestamp())
                    .col(ColumnDef::new(Notifications::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Notifications::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notifications_account_id")
                            .from(Notifications::Table, Notifications::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notifications_user_id")
                            .from(Notifications::Table, Notifications::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notifications_creator_id")
                            .from(Notifications::Table, Notifications::CreatorId)
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
                    .name("idx_notifications_user_id")
                    .table(Notifications::Table)
                    .col(Notifications::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(NotificationBundles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(NotificationBundles::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(NotificationBundles::AccountId).string().not_null())
                    .col(ColumnDef::new(NotificationBundles::UserId).string().not_null())
                    .col(ColumnDef::new(NotificationBundles::StartsAt).timestamp().not_null())
                    .col(ColumnDef::new(NotificationBundles::EndsAt).timestamp().not_null())
                    .col(ColumnDef::new(NotificationBundles::Status).string().not_null())
                    .col(ColumnDef::new(NotificationBundles::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(NotificationBundles::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notification_bundles_account_id")
                            .from(NotificationBundles::Table, NotificationBundles::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notification_bundles_user_id")
                            .from(NotificationBundles::Table, NotificationBundles::UserId)
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
                    .name("idx_notification_bundles_user_id")
                    .table(NotificationBundles::Table)
                    .col(NotificationBundles::UserId)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(NotificationBundles::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Notifications::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Events::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WebhookDeliveries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WebhookDelinquencyTrackers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Webhooks::Table).to_owned())
            .await?;
        Ok(())
    }
}


#[derive(Iden)]
enum Webhooks {
    Table,
    Id,
    AccountId,
    BoardId,
    Name,
    Url,
    SigningSecret,
    Active,
    SubscribedActions,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum WebhookDelinquencyTrackers {
    Table,
    Id,
    AccountId,
    WebhookId,
    ConsecutiveFailuresCount,
    FirstFailureAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum WebhookDeliveries {
    Table,
    Id,
    AccountId,
    WebhookId,
    EventId,
    State,
    Request,
    Response,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Events {
    Table,
    Id,
    AccountId,
    BoardId,
    CreatorId,
    Action,
    EventableType,
    EventableId,
    Particulars,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Notifications {
    Table,
    Id,
    AccountId,
    UserId,
    CreatorId,
    SourceType,
    SourceId,
    ReadAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum NotificationBundles {
    Table,
    Id,
    AccountId,
    UserId,
    StartsAt,
    EndsAt,
    Status,
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
enum Users {
    Table,
    Id,
}
