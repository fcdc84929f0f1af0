//! Vote allocation repository.

use std::sync::Arc;

use crate::entities::{Vote, vote};
use ideavote_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseBackend, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, Statement,
};

use super::{VOTE_LIMIT_MARKER, store_message};

/// Vote repository for database operations.
#[derive(Clone)]
pub struct VoteRepository {
    db: Arc<DatabaseConnection>,
}

impl VoteRepository {
    /// Create a new vote repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// All allocations of a quarter, across users.
    pub async fn find_by_quarter(&self, quarter: &str) -> AppResult<Vec<vote::Model>> {
        Vote::find()
            .filter(vote::Column::Quarter.eq(quarter))
            .all(self.db.as_ref())
            .await
            .map_err(|e| super::database_error(&e))
    }

    /// One user's allocations in a quarter.
    pub async fn find_by_user_and_quarter(
        &self,
        user_id: &str,
        quarter: &str,
    ) -> AppResult<Vec<vote::Model>> {
        Vote::find()
            .filter(vote::Column::UserId.eq(user_id))
            .filter(vote::Column::Quarter.eq(quarter))
            .all(self.db.as_ref())
            .await
            .map_err(|e| super::database_error(&e))
    }

    /// Set the user's allocation for an idea through the `set_votes` procedure.
    ///
    /// The procedure checks the quarter cap and upserts in one statement; on
    /// rejection nothing is written.
    pub async fn set_votes(
        &self,
        user_id: &str,
        idea_id: &str,
        quarter: &str,
        votes: i32,
    ) -> AppResult<()> {
        let stmt = Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "SELECT set_votes($1, $2, $3, $4)",
            [user_id.into(), idea_id.into(), quarter.into(), votes.into()],
        );

        self.db
            .execute(stmt)
            .await
            .map_err(|e| set_votes_error(&e))?;
        Ok(())
    }
}

/// Classify a failure raised by `set_votes`.
fn set_votes_error(err: &DbErr) -> AppError {
    let message = store_message(err);
    if message.to_lowercase().contains(VOTE_LIMIT_MARKER) {
        AppError::VoteLimitExceeded(message)
    } else {
        AppError::Database(message)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{MockDatabase, MockExecResult, Transaction};

    fn mock_vote(user_id: &str, idea_id: &str, votes: i32) -> vote::Model {
        vote::Model {
            user_id: user_id.to_string(),
            idea_id: idea_id.to_string(),
            quarter: "2026Q1".to_string(),
            votes,
            updated_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_set_votes_calls_procedure() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();
        let db = Arc::new(db);
        let repo = VoteRepository::new(Arc::clone(&db));

        repo.set_votes("user-1", "idea-a", "2026Q1", 2).await.unwrap();

        drop(repo);
        let db = Arc::try_unwrap(db).ok().unwrap();
        assert_eq!(
            db.into_transaction_log(),
            [Transaction::from_sql_and_values(
                DatabaseBackend::Postgres,
                "SELECT set_votes($1, $2, $3, $4)",
                ["user-1".into(), "idea-a".into(), "2026Q1".into(), 2i32.into()],
            )]
        );
    }

    #[tokio::test]
    async fn test_set_votes_maps_cap_error() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_errors([DbErr::Custom(
                "vote limit exceeded: 3 votes allowed per quarter, this would use 4".to_string(),
            )])
            .into_connection();
        let repo = VoteRepository::new(Arc::new(db));

        let err = repo.set_votes("user-1", "idea-b", "2026Q1", 2).await.unwrap_err();
        match err {
            AppError::VoteLimitExceeded(message) => {
                assert!(message.contains("vote limit exceeded"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_set_votes_maps_other_errors_to_database() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_errors([DbErr::Custom("idea x not found in quarter 2026Q1".to_string())])
            .into_connection();
        let repo = VoteRepository::new(Arc::new(db));

        let err = repo.set_votes("user-1", "x", "2026Q1", 1).await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }

    #[tokio::test]
    async fn test_find_by_quarter() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[mock_vote("u1", "a", 2), mock_vote("u2", "a", 1)]])
            .into_connection();
        let repo = VoteRepository::new(Arc::new(db));

        let votes = repo.find_by_quarter("2026Q1").await.unwrap();
        assert_eq!(votes.iter().map(|v| v.votes).sum::<i32>(), 3);
    }

    #[test]
    fn test_store_message_strips_driver_prefix() {
        let err = DbErr::Custom(
            "error returned from database: vote limit exceeded: 3 votes allowed".to_string(),
        );
        assert_eq!(store_message(&err), "vote limit exceeded: 3 votes allowed");
    }
}
