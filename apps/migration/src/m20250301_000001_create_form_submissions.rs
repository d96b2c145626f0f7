use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FormSubmissions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FormSubmissions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FormSubmissions::Kind).string_len(32).not_null())
                    .col(ColumnDef::new(FormSubmissions::Email).string().not_null())
                    .col(ColumnDef::new(FormSubmissions::Name).string().null())
                    .col(ColumnDef::new(FormSubmissions::Product).string().null())
                    .col(ColumnDef::new(FormSubmissions::Payload).json_binary().not_null())
                    .col(
                        ColumnDef::new(FormSubmissions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Duplicate checks filter on kind + email (+ product).
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_form_submissions_kind_email")
                    .table(FormSubmissions::Table)
                    .col(FormSubmissions::Kind)
                    .col(FormSubmissions::Email)
                    .col(FormSubmissions::Product)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FormSubmissions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum FormSubmissions {
    Table,
    Id,
    Kind,
    Email,
    Name,
    Product,
    Payload,
    CreatedAt,
}
