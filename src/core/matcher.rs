use crate::core::{
    distance::{calorie_distance, nutrition_distance_sq, sort_by_distance},
    filters::MealFilter,
};
use crate::models::{Meal, MatchQuery, PerMealTarget};
use crate::services::repository::{MealRepository, RepositoryError};
use std::sync::Arc;

/// Hard cap on recommendations per request
pub const MAX_SUGGESTIONS: usize = 5;

/// Result of the matching process
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub meals: Vec<Meal>,
    /// True when no meal passed the filters and calorie proximity was used
    pub used_fallback: bool,
}

/// Nearest-meal search over the meal repository
///
/// # Pipeline Stages
/// 1. Filtered query ranked by squared distance in calorie/macro space
/// 2. If nothing passes the filters, an unfiltered query ranked by calorie
///    difference alone
///
/// Both stages are re-ranked stably here, so the ordering guarantee holds
/// regardless of how a repository orders ties.
#[derive(Clone)]
pub struct MealMatcher {
    repository: Arc<dyn MealRepository>,
    limit: usize,
}

impl MealMatcher {
    pub fn new(repository: Arc<dyn MealRepository>, limit: usize) -> Self {
        Self {
            repository,
            limit: limit.clamp(1, MAX_SUGGESTIONS),
        }
    }

    pub fn with_default_limit(repository: Arc<dyn MealRepository>) -> Self {
        Self::new(repository, MAX_SUGGESTIONS)
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Find the meals closest to a per-meal target
    ///
    /// An empty filtered result is not an error; it triggers the calorie
    /// fallback, which itself yields an empty list on an empty repository.
    /// Repository failures propagate unchanged.
    pub async fn find_meals(
        &self,
        target: &PerMealTarget,
        filters: &[MealFilter],
    ) -> Result<MatchResult, RepositoryError> {
        let query = MatchQuery {
            target: *target,
            filters: filters.to_vec(),
            limit: self.limit,
        };

        let mut meals = self
            .repository
            .nearest_meals(&query.target, &query.filters, query.limit)
            .await?;

        if !meals.is_empty() {
            sort_by_distance(&mut meals, |m| nutrition_distance_sq(m, &query.target));
            meals.truncate(query.limit);

            tracing::debug!(
                "Matched {} meals with filters {:?}",
                meals.len(),
                query.filters
            );

            return Ok(MatchResult {
                meals,
                used_fallback: false,
            });
        }

        tracing::info!(
            "No meals matched filters {:?}, falling back to calorie proximity ({:.0} kcal)",
            query.filters,
            query.target.calories
        );

        let mut meals = self
            .repository
            .meals_by_calorie_distance(query.target.calories, query.limit)
            .await?;

        sort_by_distance(&mut meals, |m| calorie_distance(m, query.target.calories));
        meals.truncate(query.limit);

        Ok(MatchResult {
            meals,
            used_fallback: true,
        })
    }
}

impl std::fmt::Debug for MealMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MealMatcher")
            .field("limit", &self.limit)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::memory::InMemoryMealRepository;
    use async_trait::async_trait;

    fn create_meal(id: i32, calories: f64, protein: f64, price: f64, tags: &[&str]) -> Meal {
        Meal {
            meal_id: id,
            name: format!("Meal {}", id),
            location: "Rathbone".to_string(),
            price,
            calories,
            protein_g: protein,
            carbs_g: 60.0,
            fat_g: 20.0,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn target() -> PerMealTarget {
        PerMealTarget {
            calories: 700.0,
            carbs_g: 60.0,
            protein_g: 35.0,
            fat_g: 20.0,
        }
    }

    fn matcher(meals: Vec<Meal>) -> MealMatcher {
        MealMatcher::with_default_limit(Arc::new(InMemoryMealRepository::new(meals)))
    }

    struct BrokenRepository;

    #[async_trait]
    impl MealRepository for BrokenRepository {
        async fn nearest_meals(
            &self,
            _target: &PerMealTarget,
            _filters: &[MealFilter],
            _limit: usize,
        ) -> Result<Vec<Meal>, RepositoryError> {
            Err(RepositoryError::Unavailable("connection refused".into()))
        }

        async fn sample_meals(&self, _n: usize) -> Result<Vec<Meal>, RepositoryError> {
            Err(RepositoryError::Unavailable("connection refused".into()))
        }

        async fn meals_by_calorie_distance(
            &self,
            _target_calories: f64,
            _limit: usize,
        ) -> Result<Vec<Meal>, RepositoryError> {
            Err(RepositoryError::Unavailable("connection refused".into()))
        }
    }

    #[test]
    fn test_limit_capped_at_five() {
        let m = MealMatcher::new(Arc::new(InMemoryMealRepository::default()), 50);
        assert_eq!(m.limit(), MAX_SUGGESTIONS);

        let m = MealMatcher::new(Arc::new(InMemoryMealRepository::default()), 0);
        assert_eq!(m.limit(), 1);
    }

    #[tokio::test]
    async fn test_find_meals_ranks_nearest_first() {
        let m = matcher(vec![
            create_meal(1, 1200.0, 35.0, 9.0, &[]),
            create_meal(2, 710.0, 35.0, 9.0, &[]),
            create_meal(3, 400.0, 35.0, 9.0, &[]),
        ]);

        let result = m.find_meals(&target(), &[]).await.unwrap();

        assert!(!result.used_fallback);
        let ids: Vec<i32> = result.meals.iter().map(|m| m.meal_id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[tokio::test]
    async fn test_respects_limit() {
        let m = matcher((0..20).map(|i| create_meal(i, 500.0 + i as f64 * 10.0, 35.0, 9.0, &[])).collect());

        let result = m.find_meals(&target(), &[]).await.unwrap();
        assert_eq!(result.meals.len(), MAX_SUGGESTIONS);
    }

    #[tokio::test]
    async fn test_filters_applied() {
        let m = matcher(vec![
            create_meal(1, 700.0, 10.0, 9.0, &[]),
            create_meal(2, 900.0, 40.0, 9.0, &["vegetarian"]),
        ]);

        let result = m
            .find_meals(&target(), &[MealFilter::HighProtein, MealFilter::Vegetarian])
            .await
            .unwrap();

        assert!(!result.used_fallback);
        assert_eq!(result.meals.len(), 1);
        assert_eq!(result.meals[0].meal_id, 2);
    }

    #[tokio::test]
    async fn test_fallback_when_filters_match_nothing() {
        let m = matcher(vec![
            create_meal(1, 1000.0, 10.0, 9.0, &[]),
            create_meal(2, 680.0, 10.0, 9.0, &[]),
        ]);

        let result = m.find_meals(&target(), &[MealFilter::Vegan]).await.unwrap();

        assert!(result.used_fallback);
        let ids: Vec<i32> = result.meals.iter().map(|m| m.meal_id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[tokio::test]
    async fn test_empty_repository_returns_empty() {
        let result = matcher(vec![]).find_meals(&target(), &[]).await.unwrap();

        assert!(result.meals.is_empty());
        assert!(result.used_fallback);
    }

    #[tokio::test]
    async fn test_repository_error_propagates() {
        let m = MealMatcher::with_default_limit(Arc::new(BrokenRepository));

        let err = m.find_meals(&target(), &[]).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Unavailable(_)));
    }
}
