//! Database integration tests for the vote cap.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test -p ideavote-db --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `ideavote_test`)
//!   `TEST_DB_PASSWORD` (default: `ideavote_test`)

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use ideavote_common::{AppError, IdGenerator};
use ideavote_db::{
    entities::{idea, vote},
    repositories::{IdeaRepository, VoteRepository},
    test_utils::TestDatabase,
};
use sea_orm::{Database, DatabaseConnection, NotSet, Set};

const QUARTER: &str = "2026Q1";

async fn setup() -> (TestDatabase, Arc<DatabaseConnection>) {
    let test_db = TestDatabase::create_unique()
        .await
        .expect("Failed to create test database");
    // `DatabaseConnection` is not `Clone` when sea-orm's `mock` feature is on
    // (enabled for this crate's unit tests), so open a second pool to the same database.
    let conn = Arc::new(
        Database::connect(&test_db.config.database_url())
            .await
            .expect("Failed to connect to test database"),
    );
    (test_db, conn)
}

async fn insert_idea(repo: &IdeaRepository, title: &str, quarter: &str) -> idea::Model {
    repo.create(idea::ActiveModel {
        id: Set(IdGenerator::new().generate()),
        title: Set(title.to_string()),
        description: Set(Some("description".to_string())),
        category: Set("Other".to_string()),
        data_gaps: Set(None),
        quarter: Set(quarter.to_string()),
        created_at: NotSet,
    })
    .await
    .unwrap()
}

fn allocation(votes: &[vote::Model], idea_id: &str) -> i32 {
    votes
        .iter()
        .find(|v| v.idea_id == idea_id)
        .map_or(0, |v| v.votes)
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_rejected_allocation_leaves_existing_votes_unchanged() {
    let (test_db, conn) = setup().await;
    let ideas = IdeaRepository::new(Arc::clone(&conn));
    let votes = VoteRepository::new(Arc::clone(&conn));

    let a = insert_idea(&ideas, "Churn model", QUARTER).await;
    let b = insert_idea(&ideas, "Order forecast", QUARTER).await;

    votes.set_votes("alice", &a.id, QUARTER, 2).await.unwrap();
    let err = votes.set_votes("alice", &b.id, QUARTER, 2).await.unwrap_err();
    assert!(matches!(err, AppError::VoteLimitExceeded(_)), "{err:?}");

    let mine = votes.find_by_user_and_quarter("alice", QUARTER).await.unwrap();
    assert_eq!(allocation(&mine, &a.id), 2);
    assert_eq!(allocation(&mine, &b.id), 0);

    test_db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_lowering_an_allocation_is_accepted() {
    let (test_db, conn) = setup().await;
    let ideas = IdeaRepository::new(Arc::clone(&conn));
    let votes = VoteRepository::new(Arc::clone(&conn));

    let a = insert_idea(&ideas, "Churn model", QUARTER).await;
    let b = insert_idea(&ideas, "Order forecast", QUARTER).await;

    votes.set_votes("alice", &a.id, QUARTER, 3).await.unwrap();
    votes.set_votes("alice", &a.id, QUARTER, 1).await.unwrap();
    votes.set_votes("alice", &b.id, QUARTER, 2).await.unwrap();
    votes.set_votes("alice", &b.id, QUARTER, 0).await.unwrap();

    let mine = votes.find_by_user_and_quarter("alice", QUARTER).await.unwrap();
    assert_eq!(allocation(&mine, &a.id), 1);
    // Zero is a valid allocation and keeps its row.
    assert_eq!(mine.len(), 2);
    assert_eq!(allocation(&mine, &b.id), 0);

    test_db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_cap_is_per_user_and_quarter() {
    let (test_db, conn) = setup().await;
    let ideas = IdeaRepository::new(Arc::clone(&conn));
    let votes = VoteRepository::new(Arc::clone(&conn));

    let a = insert_idea(&ideas, "Churn model", QUARTER).await;
    let next = insert_idea(&ideas, "Pricing", "2026Q2").await;

    votes.set_votes("alice", &a.id, QUARTER, 3).await.unwrap();
    votes.set_votes("bob", &a.id, QUARTER, 3).await.unwrap();
    votes.set_votes("alice", &next.id, "2026Q2", 3).await.unwrap();

    let all = votes.find_by_quarter(QUARTER).await.unwrap();
    assert_eq!(all.iter().map(|v| v.votes).sum::<i32>(), 6);

    test_db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_vote_must_target_idea_in_same_quarter() {
    let (test_db, conn) = setup().await;
    let ideas = IdeaRepository::new(Arc::clone(&conn));
    let votes = VoteRepository::new(Arc::clone(&conn));

    let a = insert_idea(&ideas, "Churn model", QUARTER).await;

    let err = votes.set_votes("alice", &a.id, "2026Q2", 1).await.unwrap_err();
    assert!(matches!(err, AppError::Database(_)), "{err:?}");

    let err = votes.set_votes("alice", &a.id, QUARTER, 4).await.unwrap_err();
    assert!(matches!(err, AppError::Database(_)), "{err:?}");

    test_db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_concurrent_allocations_never_exceed_cap() {
    let (test_db, conn) = setup().await;
    let ideas = IdeaRepository::new(Arc::clone(&conn));
    let votes = VoteRepository::new(Arc::clone(&conn));

    let mut idea_ids = Vec::new();
    for i in 0..8 {
        idea_ids.push(insert_idea(&ideas, &format!("Idea {i}"), QUARTER).await.id);
    }

    let attempts = idea_ids.iter().map(|idea_id| {
        let votes = votes.clone();
        let idea_id = idea_id.clone();
        async move { votes.set_votes("alice", &idea_id, QUARTER, 1).await }
    });
    let results = futures::future::join_all(attempts).await;

    let accepted = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(accepted, 3);
    assert!(
        results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, AppError::VoteLimitExceeded(_)))
    );

    let mine = votes.find_by_user_and_quarter("alice", QUARTER).await.unwrap();
    assert_eq!(mine.iter().map(|v| v.votes).sum::<i32>(), 3);

    test_db.drop_database().await.unwrap();
}
