//! Idea repository.

use std::sync::Arc;

use crate::entities::{Idea, idea};
use ideavote_common::AppResult;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};

use super::database_error;

/// Idea repository for database operations.
#[derive(Clone)]
pub struct IdeaRepository {
    db: Arc<DatabaseConnection>,
}

impl IdeaRepository {
    /// Create a new idea repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Insert a new idea.
    ///
    /// `created_at` is left to the column default and read back from the store.
    pub async fn create(&self, model: idea::ActiveModel) -> AppResult<idea::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| database_error(&e))
    }

    /// List the ideas of a quarter, newest first.
    pub async fn find_by_quarter(&self, quarter: &str) -> AppResult<Vec<idea::Model>> {
        Idea::find()
            .filter(idea::Column::Quarter.eq(quarter))
            .order_by_desc(idea::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| database_error(&e))
    }
}
