//! Create `contact` table.
//!
//! Phone is the natural key and carries a unique constraint so that a
//! concurrent duplicate insert fails instead of producing two rows.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Contact::Table)
                    .if_not_exists()
                    .col(pk_auto(Contact::Id))
                    .col(string_len(Contact::Phone, 32).unique_key().not_null())
                    .col(string_len_null(Contact::Name, 255))
                    .col(string_len_null(Contact::Cpf, 14))
                    .col(integer_null(Contact::Segment))
                    .col(boolean(Contact::IsCpc).default(false).not_null())
                    .col(
                        ColumnDef::new(Contact::LastCpcAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(boolean(Contact::IsNameManual).default(false).not_null())
                    .col(timestamp_with_time_zone(Contact::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Contact::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Contact::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Contact {
    Table,
    Id,
    Phone,
    Name,
    Cpf,
    Segment,
    IsCpc,
    LastCpcAt,
    IsNameManual,
    CreatedAt,
    UpdatedAt,
}
