use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Events::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Events::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(string_len(Events::UserId, 255))
                    .col(string_len(Events::EventType, 255))
                    .col(
                        timestamp_with_time_zone(Events::Timestamp)
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Events::Metadata).json_binary().null())
                    .to_owned(),
            )
            .await?;

        // Filters and per-user lookups
        for (name, column) in [
            ("idx_events_user_id", Events::UserId),
            ("idx_events_event_type", Events::EventType),
            ("idx_events_timestamp", Events::Timestamp),
        ] {
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name(name)
                        .table(Events::Table)
                        .col(column)
                        .to_owned(),
                )
                .await?;
        }

        // user-activity: latest event per user
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_events_user_id_timestamp")
                    .table(Events::Table)
                    .col(Events::UserId)
                    .col(Events::Timestamp)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Events::Table).if_exists().to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Events {
    Table,
    Id,
    UserId,
    EventType,
    Timestamp,
    Metadata,
}
