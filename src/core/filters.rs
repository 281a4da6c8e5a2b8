use crate::models::Meal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const HIGH_PROTEIN_MIN_G: f64 = 30.0;
pub const LOW_PROTEIN_MAX_G: f64 = 15.0;
pub const LOW_CARB_MAX_G: f64 = 40.0;
pub const HIGH_CARB_MIN_G: f64 = 80.0;
pub const LOW_COST_MAX: f64 = 10.0;
pub const HIGH_COST_MIN: f64 = 12.0;

/// Categorical filter selectable on the dining page
///
/// Filters combine with AND. Diet filters are a case-insensitive substring
/// match on the meal's tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealFilter {
    HighProtein,
    LowProtein,
    LowCarb,
    HighCarb,
    LowCost,
    HighCost,
    Vegetarian,
    Vegan,
}

impl MealFilter {
    pub const ALL: [MealFilter; 8] = [
        MealFilter::HighProtein,
        MealFilter::LowProtein,
        MealFilter::LowCarb,
        MealFilter::HighCarb,
        MealFilter::LowCost,
        MealFilter::HighCost,
        MealFilter::Vegetarian,
        MealFilter::Vegan,
    ];

    /// Label as shown in the UI
    pub fn label(self) -> &'static str {
        match self {
            MealFilter::HighProtein => "High Protein",
            MealFilter::LowProtein => "Low Protein",
            MealFilter::LowCarb => "Low Carb",
            MealFilter::HighCarb => "High Carb",
            MealFilter::LowCost => "Low Cost",
            MealFilter::HighCost => "High Cost",
            MealFilter::Vegetarian => "Vegetarian",
            MealFilter::Vegan => "Vegan",
        }
    }

    /// Tag searched for by the diet filters
    pub fn tag(self) -> Option<&'static str> {
        match self {
            MealFilter::Vegetarian => Some("vegetarian"),
            MealFilter::Vegan => Some("vegan"),
            _ => None,
        }
    }

    #[inline]
    pub fn matches(self, meal: &Meal) -> bool {
        match self {
            MealFilter::HighProtein => meal.protein_g >= HIGH_PROTEIN_MIN_G,
            MealFilter::LowProtein => meal.protein_g <= LOW_PROTEIN_MAX_G,
            MealFilter::LowCarb => meal.carbs_g <= LOW_CARB_MAX_G,
            MealFilter::HighCarb => meal.carbs_g >= HIGH_CARB_MIN_G,
            MealFilter::LowCost => meal.price <= LOW_COST_MAX,
            MealFilter::HighCost => meal.price >= HIGH_COST_MIN,
            MealFilter::Vegetarian | MealFilter::Vegan => {
                self.tag().is_some_and(|tag| meal.has_tag(tag))
            }
        }
    }
}

impl fmt::Display for MealFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown meal filter '{0}'")]
pub struct UnknownFilter(pub String);

impl FromStr for MealFilter {
    type Err = UnknownFilter;

    /// Accepts "High Protein", "high-protein", "high_protein" and "highprotein"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect::<String>()
            .to_lowercase();

        MealFilter::ALL
            .into_iter()
            .find(|filter| filter.label().replace(' ', "").to_lowercase() == key)
            .ok_or_else(|| UnknownFilter(s.trim().to_string()))
    }
}

/// Parse a comma-separated filter list, dropping duplicates
pub fn parse_filters(raw: &str) -> Result<Vec<MealFilter>, UnknownFilter> {
    let mut filters = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let filter: MealFilter = part.parse()?;
        if !filters.contains(&filter) {
            filters.push(filter);
        }
    }
    Ok(filters)
}

/// Check a meal against every filter (conjunctive)
#[inline]
pub fn matches_all(meal: &Meal, filters: &[MealFilter]) -> bool {
    filters.iter().all(|filter| filter.matches(meal))
}
