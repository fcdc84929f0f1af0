//! Idea submission service.

use ideavote_common::{AppResult, IdGenerator};
use ideavote_db::{entities::idea, repositories::IdeaRepository};
use sea_orm::{NotSet, Set};
use validator::Validate;

/// Category stored when the submitter leaves it blank.
pub const DEFAULT_CATEGORY: &str = "Other";

/// Raw idea fields as submitted by the form.
#[derive(Debug, Clone, Default)]
pub struct SubmitIdeaInput {
    /// Short name of the question, required.
    pub title: Option<String>,
    /// What to answer and why, required.
    pub description: Option<String>,
    /// Free-form grouping; blank becomes [`DEFAULT_CATEGORY`].
    pub category: Option<String>,
    /// Known missing data; blank is stored as `NULL`.
    pub data_gaps: Option<String>,
    /// Quarter label the idea competes in, required.
    pub quarter: Option<String>,
}

/// Trimmed idea fields with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
struct NewIdea {
    #[validate(length(min = 1, message = "title is required"))]
    title: String,
    #[validate(length(min = 1, message = "description is required"))]
    description: String,
    category: String,
    data_gaps: Option<String>,
    #[validate(length(min = 1, message = "quarter is required"))]
    quarter: String,
}

impl From<SubmitIdeaInput> for NewIdea {
    fn from(input: SubmitIdeaInput) -> Self {
        let trimmed = |value: Option<String>| value.map(|v| v.trim().to_string()).unwrap_or_default();
        let non_blank = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            title: trimmed(input.title),
            description: trimmed(input.description),
            category: non_blank(input.category).unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            data_gaps: non_blank(input.data_gaps),
            quarter: trimmed(input.quarter),
        }
    }
}

/// Idea service for business logic.
#[derive(Clone)]
pub struct IdeaService {
    idea_repo: IdeaRepository,
    id_gen: IdGenerator,
}

impl IdeaService {
    /// Create a new idea service.
    #[must_use]
    pub const fn new(idea_repo: IdeaRepository) -> Self {
        Self {
            idea_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Validate and store a new idea.
    ///
    /// Title, description and quarter are required after trimming; nothing is
    /// written when any of them is missing.
    pub async fn submit(&self, input: SubmitIdeaInput) -> AppResult<idea::Model> {
        let new_idea = NewIdea::from(input);
        new_idea.validate()?;

        let model = idea::ActiveModel {
            id: Set(self.id_gen.generate()),
            title: Set(new_idea.title),
            description: Set(Some(new_idea.description)),
            category: Set(new_idea.category),
            data_gaps: Set(new_idea.data_gaps),
            quarter: Set(new_idea.quarter),
            created_at: NotSet,
        };

        let idea = self.idea_repo.create(model).await?;
        tracing::info!(idea_id = %idea.id, quarter = %idea.quarter, "Idea submitted");
        Ok(idea)
    }

    /// Ideas of a quarter, newest first.
    pub async fn list_for_quarter(&self, quarter: &str) -> AppResult<Vec<idea::Model>> {
        self.idea_repo.find_by_quarter(quarter).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ideavote_common::AppError;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn input(title: &str, description: &str, category: &str, quarter: &str) -> SubmitIdeaInput {
        SubmitIdeaInput {
            title: Some(title.to_string()),
            description: Some(description.to_string()),
            category: Some(category.to_string()),
            data_gaps: Some("  ".to_string()),
            quarter: Some(quarter.to_string()),
        }
    }

    #[test]
    fn test_blank_category_and_data_gaps_are_defaulted() {
        let idea = NewIdea::from(input(" Churn model ", " Who leaves? ", "  ", "2026Q1"));
        assert_eq!(idea.title, "Churn model");
        assert_eq!(idea.description, "Who leaves?");
        assert_eq!(idea.category, "Other");
        assert_eq!(idea.data_gaps, None);
    }

    #[test]
    fn test_absent_fields_normalize_to_empty() {
        let idea = NewIdea::from(SubmitIdeaInput::default());
        assert_eq!(idea.category, "Other");
        assert!(idea.validate().is_err());
    }

    #[tokio::test]
    async fn test_missing_description_is_rejected_without_store_call() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = IdeaService::new(IdeaRepository::new(Arc::clone(&db)));

        let err = service
            .submit(input("Churn model", "", "", "2026Q1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        drop(service);
        let db = Arc::try_unwrap(db).ok().unwrap();
        assert!(db.into_transaction_log().is_empty());
    }

    #[tokio::test]
    async fn test_missing_title_or_quarter_is_rejected() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = IdeaService::new(IdeaRepository::new(db));

        assert!(service.submit(input("  ", "d", "", "2026Q1")).await.is_err());
        assert!(service.submit(input("t", "d", "", " ")).await.is_err());
    }

    #[tokio::test]
    async fn test_blank_category_and_data_gaps_are_stored_as_defaults() {
        let stored = idea::Model {
            id: "01hx".to_string(),
            title: "Churn model".to_string(),
            description: Some("Who leaves?".to_string()),
            category: DEFAULT_CATEGORY.to_string(),
            data_gaps: None,
            quarter: "2026Q1".to_string(),
            created_at: Utc::now().into(),
        };
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[stored]])
                .into_connection(),
        );
        let service = IdeaService::new(IdeaRepository::new(Arc::clone(&db)));

        service
            .submit(input(" Churn model ", "Who leaves?", "   ", "2026Q1"))
            .await
            .unwrap();

        drop(service);
        let db = Arc::try_unwrap(db).ok().unwrap();
        let log = db.into_transaction_log();
        assert_eq!(log.len(), 1);
        let insert = format!("{:?}", log[0]);
        assert!(insert.contains(r#"INSERT INTO \"idea\""#));
        assert!(insert.contains(r#"String(Some("Churn model"))"#));
        assert!(insert.contains(r#"String(Some("Other"))"#));
        // data_gaps is the only optional column written
        assert!(insert.contains("String(None)"));
        assert!(!insert.contains(r#"String(Some("   "))"#));
    }

    #[tokio::test]
    async fn test_submit_returns_stored_idea() {
        let stored = idea::Model {
            id: "01hx".to_string(),
            title: "Order forecast".to_string(),
            description: Some("Weekly orders by region".to_string()),
            category: "Forecast".to_string(),
            data_gaps: Some("No 2023 data".to_string()),
            quarter: "2026Q1".to_string(),
            created_at: Utc::now().into(),
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[stored.clone()]])
            .into_connection();
        let service = IdeaService::new(IdeaRepository::new(Arc::new(db)));

        let idea = service
            .submit(SubmitIdeaInput {
                title: Some("Order forecast".to_string()),
                description: Some("Weekly orders by region".to_string()),
                category: Some("Forecast".to_string()),
                data_gaps: Some("No 2023 data".to_string()),
                quarter: Some("2026Q1".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(idea, stored);
    }
}
