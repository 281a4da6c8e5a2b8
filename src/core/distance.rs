use crate::models::{Meal, PerMealTarget};
use std::cmp::Ordering;

/// Squared Euclidean distance in (calories, carbs, protein, fat) space
///
/// Calories dominate the metric because they are an order of magnitude
/// larger than the gram values; that matches the recommendation query.
#[inline]
pub fn nutrition_distance_sq(meal: &Meal, target: &PerMealTarget) -> f64 {
    (meal.calories - target.calories).powi(2)
        + (meal.carbs_g - target.carbs_g).powi(2)
        + (meal.protein_g - target.protein_g).powi(2)
        + (meal.fat_g - target.fat_g).powi(2)
}

/// Absolute calorie difference, used by the unfiltered fallback ranking
#[inline]
pub fn calorie_distance(meal: &Meal, target_calories: f64) -> f64 {
    (meal.calories - target_calories).abs()
}

/// Stable sort by a distance key, NaN distances last
pub fn sort_by_distance<F>(meals: &mut [Meal], key: F)
where
    F: Fn(&Meal) -> f64,
{
    meals.sort_by(|a, b| {
        let (da, db) = (key(a), key(b));
        da.partial_cmp(&db).unwrap_or_else(|| {
            // Push NaN to the end without disturbing the rest
            match (da.is_nan(), db.is_nan()) {
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                _ => Ordering::Equal,
            }
        })
    });
}
