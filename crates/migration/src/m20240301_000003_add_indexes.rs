use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Contact: listing is ordered newest first
        manager
            .create_index(
                Index::create()
                    .name("idx_contact_created_at")
                    .table(Contact::Table)
                    .col(Contact::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Contact: segment filter
        manager
            .create_index(
                Index::create()
                    .name("idx_contact_segment")
                    .table(Contact::Table)
                    .col(Contact::Segment)
                    .to_owned(),
            )
            .await?;

        // Conversation: name cascade filters by (contact_phone, contact_name)
        manager
            .create_index(
                Index::create()
                    .name("idx_conversation_phone_name")
                    .table(Conversation::Table)
                    .col(Conversation::ContactPhone)
                    .col(Conversation::ContactName)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_conversation_phone_name").table(Conversation::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_contact_segment").table(Contact::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_contact_created_at").table(Contact::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Contact { Table, CreatedAt, Segment }

#[derive(DeriveIden)]
enum Conversation { Table, ContactPhone, ContactName }
