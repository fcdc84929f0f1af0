//! Vote allocation service.
//!
//! Every user gets [`MAX_VOTES_PER_QUARTER`] votes per quarter and may stack or
//! split them across ideas. An allocation is always set to an absolute value;
//! the cap itself is enforced atomically by the store.

use std::collections::HashMap;

use ideavote_common::{AppError, AppResult};
use ideavote_db::repositories::VoteRepository;

/// Votes each user may spend in one quarter.
pub const MAX_VOTES_PER_QUARTER: i32 = 3;

/// Parse a submitted vote count.
///
/// Blank or non-numeric input counts as 0. A number that is not a whole
/// number, or does not fit an `i32`, is rejected.
pub fn parse_vote_count(raw: Option<&str>) -> AppResult<i32> {
    let raw = raw.unwrap_or_default().trim();
    if let Ok(value) = raw.parse::<i64>() {
        return i32::try_from(value)
            .map_err(|_| AppError::Validation(format!("vote count out of range: {value}")));
    }
    if raw.parse::<f64>().is_ok_and(f64::is_finite) {
        return Err(AppError::Validation(format!(
            "vote count must be a whole number: {raw}"
        )));
    }
    Ok(0)
}

/// A user's view of the votes in one quarter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuarterBallot {
    /// Total votes per idea across all users.
    pub totals: HashMap<String, i32>,
    /// The user's own allocation per idea.
    pub mine: HashMap<String, i32>,
    /// Votes the user has allocated in the quarter.
    pub used: i32,
    /// Votes the user can still allocate.
    pub remaining: i32,
}

impl QuarterBallot {
    /// Total votes for an idea.
    #[must_use]
    pub fn total_for(&self, idea_id: &str) -> i32 {
        self.totals.get(idea_id).copied().unwrap_or(0)
    }

    /// The user's allocation for an idea.
    #[must_use]
    pub fn mine_for(&self, idea_id: &str) -> i32 {
        self.mine.get(idea_id).copied().unwrap_or(0)
    }
}

/// Vote service for business logic.
#[derive(Clone)]
pub struct VoteService {
    vote_repo: VoteRepository,
}

impl VoteService {
    /// Create a new vote service.
    #[must_use]
    pub const fn new(vote_repo: VoteRepository) -> Self {
        Self { vote_repo }
    }

    /// Set the user's allocation for an idea to `votes`.
    pub async fn set_votes(
        &self,
        user_id: &str,
        idea_id: &str,
        quarter: &str,
        votes: i32,
    ) -> AppResult<()> {
        let idea_id = idea_id.trim();
        let quarter = quarter.trim();

        if idea_id.is_empty() {
            return Err(AppError::Validation("idea is required".to_string()));
        }
        if quarter.is_empty() {
            return Err(AppError::Validation("quarter is required".to_string()));
        }
        if !(0..=MAX_VOTES_PER_QUARTER).contains(&votes) {
            return Err(AppError::Validation(format!(
                "votes must be between 0 and {MAX_VOTES_PER_QUARTER}"
            )));
        }

        match self.vote_repo.set_votes(user_id, idea_id, quarter, votes).await {
            Ok(()) => {
                tracing::info!(user_id, idea_id, quarter, votes, "Votes set");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(user_id, idea_id, quarter, votes, error = %e, "Votes rejected");
                Err(e)
            }
        }
    }

    /// Totals and the user's own allocations for a quarter.
    pub async fn ballot(&self, user_id: &str, quarter: &str) -> AppResult<QuarterBallot> {
        let votes = self.vote_repo.find_by_quarter(quarter).await?;

        let mut ballot = QuarterBallot::default();
        for vote in votes {
            *ballot.totals.entry(vote.idea_id.clone()).or_insert(0) += vote.votes;
            if vote.user_id == user_id {
                ballot.used += vote.votes;
                ballot.mine.insert(vote.idea_id, vote.votes);
            }
        }
        ballot.remaining = (MAX_VOTES_PER_QUARTER - ballot.used).max(0);

        Ok(ballot)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ideavote_db::entities::vote;
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn mock_vote(user_id: &str, idea_id: &str, votes: i32) -> vote::Model {
        vote::Model {
            user_id: user_id.to_string(),
            idea_id: idea_id.to_string(),
            quarter: "2026Q1".to_string(),
            votes,
            updated_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_parse_vote_count() {
        assert_eq!(parse_vote_count(Some("2")).unwrap(), 2);
        assert_eq!(parse_vote_count(Some(" 3 ")).unwrap(), 3);
        assert_eq!(parse_vote_count(Some("abc")).unwrap(), 0);
        assert_eq!(parse_vote_count(Some("")).unwrap(), 0);
        assert_eq!(parse_vote_count(None).unwrap(), 0);
        assert_eq!(parse_vote_count(Some("-1")).unwrap(), -1);
        assert!(parse_vote_count(Some("2.5")).is_err());
        assert!(parse_vote_count(Some("99999999999")).is_err());
    }

    #[tokio::test]
    async fn test_out_of_range_votes_never_reach_store() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = VoteService::new(VoteRepository::new(Arc::clone(&db)));

        for votes in [-1, 4] {
            let err = service.set_votes("u1", "a", "2026Q1", votes).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
        let err = service.set_votes("u1", " ", "2026Q1", 1).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        drop(service);
        let db = Arc::try_unwrap(db).ok().unwrap();
        assert!(db.into_transaction_log().is_empty());
    }

    #[tokio::test]
    async fn test_set_votes_passes_cap_error_through() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_errors([DbErr::Custom(
                "vote limit exceeded: 3 votes allowed per quarter, this would use 4".to_string(),
            )])
            .into_connection();
        let service = VoteService::new(VoteRepository::new(Arc::new(db)));

        let err = service.set_votes("u1", "b", "2026Q1", 2).await.unwrap_err();
        assert!(matches!(err, AppError::VoteLimitExceeded(_)));
        assert!(err.user_message().contains("vote limit exceeded"));
    }

    #[tokio::test]
    async fn test_set_votes_accepts_zero() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();
        let service = VoteService::new(VoteRepository::new(Arc::new(db)));

        service.set_votes("u1", "a", "2026Q1", 0).await.unwrap();
    }

    #[tokio::test]
    async fn test_ballot_splits_totals_and_own_allocation() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[
                mock_vote("u1", "a", 2),
                mock_vote("u2", "a", 3),
                mock_vote("u2", "b", 0),
                mock_vote("u1", "b", 0),
            ]])
            .into_connection();
        let service = VoteService::new(VoteRepository::new(Arc::new(db)));

        let ballot = service.ballot("u1", "2026Q1").await.unwrap();
        assert_eq!(ballot.total_for("a"), 5);
        assert_eq!(ballot.total_for("b"), 0);
        assert_eq!(ballot.total_for("c"), 0);
        assert_eq!(ballot.mine_for("a"), 2);
        assert_eq!(ballot.used, 2);
        assert_eq!(ballot.remaining, 1);
    }
}
