use crate::core::filters::MealFilter;
use crate::models::{Meal, PerMealTarget};
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when reading from a meal repository
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Repository unavailable: {0}")]
    Unavailable(String),
}

/// Read-only access to the dining hall meal catalogue
///
/// Implementations return rows in their natural order where the contract
/// does not specify one; the matcher re-ranks stably on top of that.
#[async_trait]
pub trait MealRepository: Send + Sync {
    /// Meals passing every filter, nearest to the target first
    async fn nearest_meals(
        &self,
        target: &PerMealTarget,
        filters: &[MealFilter],
        limit: usize,
    ) -> Result<Vec<Meal>, RepositoryError>;

    /// Up to `n` meals in randomized order
    async fn sample_meals(&self, n: usize) -> Result<Vec<Meal>, RepositoryError>;

    /// Unfiltered meals ordered by absolute calorie difference
    async fn meals_by_calorie_distance(
        &self,
        target_calories: f64,
        limit: usize,
    ) -> Result<Vec<Meal>, RepositoryError>;
}
