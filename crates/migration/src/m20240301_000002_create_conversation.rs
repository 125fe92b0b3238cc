//! Create `conversation` table.
//!
//! `contact_phone` is a logical join to `contact.phone`, not a foreign key:
//! conversations can exist before their contact does.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Conversation::Table)
                    .if_not_exists()
                    .col(uuid(Conversation::Id).primary_key())
                    .col(string_len(Conversation::ContactPhone, 32).not_null())
                    .col(string_len(Conversation::ContactName, 255).default("Unknown").not_null())
                    .col(timestamp_with_time_zone(Conversation::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Conversation::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Conversation::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Conversation { Table, Id, ContactPhone, ContactName, CreatedAt, UpdatedAt }
