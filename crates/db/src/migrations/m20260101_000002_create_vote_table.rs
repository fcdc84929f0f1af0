//! Create vote table migration.

use sea_orm_migration::prelude::*;

use super::m20260101_000001_create_idea_table::Idea;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Vote::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Vote::UserId).string_len(64).not_null())
                    .col(ColumnDef::new(Vote::IdeaId).string_len(32).not_null())
                    .col(ColumnDef::new(Vote::Quarter).string_len(16).not_null())
                    .col(
                        ColumnDef::new(Vote::Votes)
                            .integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(Vote::Votes).between(0, 3)),
                    )
                    .col(
                        ColumnDef::new(Vote::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .primary_key(
                        Index::create()
                            .col(Vote::UserId)
                            .col(Vote::IdeaId)
                            .col(Vote::Quarter),
                    )
                    // A vote must point at an idea of the same quarter
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vote_idea_quarter")
                            .from(Vote::Table, (Vote::IdeaId, Vote::Quarter))
                            .to(Idea::Table, (Idea::Id, Idea::Quarter))
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (quarter, idea_id) for per-idea totals
        manager
            .create_index(
                Index::create()
                    .name("idx_vote_quarter_idea_id")
                    .table(Vote::Table)
                    .col(Vote::Quarter)
                    .col(Vote::IdeaId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Vote::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Vote {
    Table,
    UserId,
    IdeaId,
    Quarter,
    Votes,
    UpdatedAt,
}
