//! Repositories over the store.

pub mod idea;
pub mod vote;

pub use idea::IdeaRepository;
pub use vote::VoteRepository;

use ideavote_common::AppError;
use sea_orm::DbErr;

/// Marker the `set_votes` procedure puts in its cap-exceeded message.
pub const VOTE_LIMIT_MARKER: &str = "vote limit exceeded";

/// Extract the message the database reported, without driver prefixes.
#[must_use]
pub fn store_message(err: &DbErr) -> String {
    let text = err.to_string();
    match text.rsplit_once("error returned from database: ") {
        Some((_, message)) => message.trim().to_string(),
        None => text,
    }
}

pub(crate) fn database_error(err: &DbErr) -> AppError {
    AppError::Database(store_message(err))
}
