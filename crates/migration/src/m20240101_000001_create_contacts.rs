//! Create `contacts` table.
//! Email carries a unique index; timestamps default to the insert time.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Contacts::Table)
                    .if_not_exists()
                    .col(pk_auto(Contacts::Id))
                    .col(string_len(Contacts::FirstName, 50).not_null())
                    .col(string_len(Contacts::LastName, 50).not_null())
                    .col(string_len(Contacts::Email, 255).not_null())
                    .col(string_len(Contacts::Phone, 20).not_null())
                    .col(date(Contacts::BirthDate).not_null())
                    .col(
                        ColumnDef::new(Contacts::Notes)
                            .string_len(150)
                            .null(),
                    )
                    .col(
                        timestamp_with_time_zone(Contacts::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Contacts::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uniq_contacts_email")
                    .table(Contacts::Table)
                    .col(Contacts::Email)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Contacts::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Contacts {
    Table,
    Id,
    FirstName,
    LastName,
    Email,
    Phone,
    BirthDate,
    Notes,
    CreatedAt,
    UpdatedAt,
}
