//! Create the `set_votes` allocation procedure.
//!
//! The per-user, per-quarter vote cap is enforced here and only here. The
//! function serializes writers for one (user, quarter) with a
//! transaction-scoped advisory lock, so the check and the upsert happen as a
//! single atomic step even when several app instances race.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r"
                CREATE OR REPLACE FUNCTION set_votes(
                    p_user_id TEXT,
                    p_idea_id TEXT,
                    p_quarter TEXT,
                    p_votes INTEGER
                ) RETURNS VOID
                LANGUAGE plpgsql
                AS $$
                DECLARE
                    v_max_votes CONSTANT INTEGER := 3;
                    v_other INTEGER;
                    v_total INTEGER;
                BEGIN
                    IF p_votes IS NULL OR p_votes < 0 OR p_votes > v_max_votes THEN
                        RAISE EXCEPTION 'votes must be between 0 and %', v_max_votes
                            USING ERRCODE = '22023';
                    END IF;

                    PERFORM pg_advisory_xact_lock(
                        hashtextextended(p_user_id || '/' || p_quarter, 0)
                    );

                    IF NOT EXISTS (
                        SELECT 1 FROM idea WHERE id = p_idea_id AND quarter = p_quarter
                    ) THEN
                        RAISE EXCEPTION 'idea % not found in quarter %', p_idea_id, p_quarter
                            USING ERRCODE = 'P0002';
                    END IF;

                    SELECT COALESCE(SUM(votes), 0) INTO v_other
                    FROM vote
                    WHERE user_id = p_user_id
                      AND quarter = p_quarter
                      AND idea_id <> p_idea_id;

                    v_total := v_other + p_votes;

                    IF v_total > v_max_votes THEN
                        RAISE EXCEPTION 'vote limit exceeded: % votes allowed per quarter, this would use %',
                            v_max_votes, v_total
                            USING ERRCODE = 'P0001';
                    END IF;

                    INSERT INTO vote (user_id, idea_id, quarter, votes, updated_at)
                    VALUES (p_user_id, p_idea_id, p_quarter, p_votes, now())
                    ON CONFLICT (user_id, idea_id, quarter)
                    DO UPDATE SET votes = EXCLUDED.votes, updated_at = EXCLUDED.updated_at;
                END;
                $$;
                ",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP FUNCTION IF EXISTS set_votes(TEXT, TEXT, TEXT, INTEGER);")
            .await?;

        Ok(())
    }
}
