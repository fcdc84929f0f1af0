//! Create idea table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Idea::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Idea::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Idea::Title).text().not_null())
                    .col(ColumnDef::new(Idea::Description).text())
                    .col(ColumnDef::new(Idea::Category).text().not_null().default("Other"))
                    .col(ColumnDef::new(Idea::DataGaps).text())
                    .col(ColumnDef::new(Idea::Quarter).string_len(16).not_null())
                    .col(
                        ColumnDef::new(Idea::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (quarter, created_at) for the newest-first listing
        manager
            .create_index(
                Index::create()
                    .name("idx_idea_quarter_created_at")
                    .table(Idea::Table)
                    .col(Idea::Quarter)
                    .col(Idea::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Unique (id, quarter) so votes can reference an idea within its quarter
        manager
            .create_index(
                Index::create()
                    .name("idx_idea_id_quarter")
                    .table(Idea::Table)
                    .col(Idea::Id)
                    .col(Idea::Quarter)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Idea::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Idea {
    Table,
    Id,
    Title,
    Description,
    Category,
    DataGaps,
    Quarter,
    CreatedAt,
}
