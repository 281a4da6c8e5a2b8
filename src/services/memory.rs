use crate::core::{
    distance::{calorie_distance, nutrition_distance_sq, sort_by_distance},
    filters::{matches_all, MealFilter},
};
use crate::models::{Meal, PerMealTarget};
use crate::services::repository::{MealRepository, RepositoryError};
use async_trait::async_trait;
use rand::seq::SliceRandom;

/// Meal repository backed by a vector, for tests and database-free runs
#[derive(Debug, Clone, Default)]
pub struct InMemoryMealRepository {
    meals: Vec<Meal>,
}

impl InMemoryMealRepository {
    pub fn new(meals: Vec<Meal>) -> Self {
        Self { meals }
    }

    pub fn len(&self) -> usize {
        self.meals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meals.is_empty()
    }
}

#[async_trait]
impl MealRepository for InMemoryMealRepository {
    async fn nearest_meals(
        &self,
        target: &PerMealTarget,
        filters: &[MealFilter],
        limit: usize,
    ) -> Result<Vec<Meal>, RepositoryError> {
        let mut rows: Vec<Meal> = self
            .meals
            .iter()
            .filter(|meal| matches_all(meal, filters))
            .cloned()
            .collect();

        sort_by_distance(&mut rows, |m| nutrition_distance_sq(m, target));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn sample_meals(&self, n: usize) -> Result<Vec<Meal>, RepositoryError> {
        let mut rng = rand::thread_rng();
        Ok(self
            .meals
            .choose_multiple(&mut rng, n)
            .cloned()
            .collect())
    }

    async fn meals_by_calorie_distance(
        &self,
        target_calories: f64,
        limit: usize,
    ) -> Result<Vec<Meal>, RepositoryError> {
        let mut rows = self.meals.clone();
        sort_by_distance(&mut rows, |m| calorie_distance(m, target_calories));
        rows.truncate(limit);
        Ok(rows)
    }
}
