use crate::models::{round_non_negative, Gender, Goal, NutritionTargets, UserProfile};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while deriving nutrition targets
#[derive(Debug, Error, PartialEq)]
pub enum NutritionError {
    #[error("Invalid profile: {0}")]
    InvalidProfile(String),
}

const KCAL_PER_GRAM_CARBS: f64 = 4.0;
const KCAL_PER_GRAM_PROTEIN: f64 = 4.0;
const KCAL_PER_GRAM_FAT: f64 = 9.0;

const LOSE_ADJUSTMENT_KCAL: f64 = -500.0;
const GAIN_ADJUSTMENT_KCAL: f64 = 300.0;

const PROTEIN_G_PER_KG: f64 = 1.6;

/// The two target formulas exposed by the service
///
/// `DailyGoal` feeds meal recommendations for stored users and honors the
/// user's goal. `PerMealCalculator` backs the standalone calculator and
/// sizes protein by body weight. They are deliberately kept apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NutritionStrategy {
    DailyGoal,
    PerMealCalculator,
}

impl NutritionStrategy {
    /// Multiplier applied when the activity level is not recognized
    pub fn default_multiplier(self) -> f64 {
        match self {
            NutritionStrategy::DailyGoal => 1.2,
            NutritionStrategy::PerMealCalculator => 1.55,
        }
    }
}

/// Compute daily targets for a profile with the given strategy
pub fn compute_targets(
    profile: &UserProfile,
    strategy: NutritionStrategy,
) -> Result<NutritionTargets, NutritionError> {
    validate_profile(profile)?;

    let multiplier = profile
        .activity_level
        .multiplier()
        .unwrap_or_else(|| strategy.default_multiplier());
    let tdee = basal_metabolic_rate(profile) * multiplier;

    let targets = match strategy {
        NutritionStrategy::DailyGoal => daily_goal_split(tdee, profile.goal),
        NutritionStrategy::PerMealCalculator => per_weight_split(tdee, profile.weight_kg),
    };

    Ok(targets)
}

/// Mifflin-St Jeor basal metabolic rate in kcal/day
#[inline]
pub fn basal_metabolic_rate(profile: &UserProfile) -> f64 {
    let base = 10.0 * profile.weight_kg + 6.25 * profile.height_cm - 5.0 * profile.age;
    match profile.gender {
        Gender::Male => base + 5.0,
        Gender::Female => base - 161.0,
    }
}

/// Goal-adjusted calories split 40/30/30 across carbs/protein/fat
fn daily_goal_split(tdee: f64, goal: Goal) -> NutritionTargets {
    let calories = match goal {
        Goal::Lose => tdee + LOSE_ADJUSTMENT_KCAL,
        Goal::Maintain => tdee,
        Goal::Gain => tdee + GAIN_ADJUSTMENT_KCAL,
    }
    .max(0.0);

    NutritionTargets {
        calories: round_non_negative(calories),
        carbs_g: round_non_negative(calories * 0.4 / KCAL_PER_GRAM_CARBS),
        protein_g: round_non_negative(calories * 0.3 / KCAL_PER_GRAM_PROTEIN),
        fat_g: round_non_negative(calories * 0.3 / KCAL_PER_GRAM_FAT),
    }
}

/// Protein by body weight, fat at 25% of calories, carbs take the rest
///
/// Each step works from the already rounded figures before it.
///
/// Protein depends on weight only. When the energy estimate is tiny or
/// negative (implausible but positive metrics), calories, fat and carbs clamp
/// to 0 while protein stays weight-based, so macro calories can then exceed
/// the calorie total.
fn per_weight_split(tdee: f64, weight_kg: f64) -> NutritionTargets {
    let kcal = round_non_negative(tdee);
    let protein = round_non_negative(weight_kg * PROTEIN_G_PER_KG);
    let fat = round_non_negative(kcal as f64 * 0.25 / KCAL_PER_GRAM_FAT);

    let remaining = kcal as f64
        - (protein as f64 * KCAL_PER_GRAM_PROTEIN + fat as f64 * KCAL_PER_GRAM_FAT);
    let carbs = round_non_negative(remaining / KCAL_PER_GRAM_CARBS);

    NutritionTargets {
        calories: kcal,
        carbs_g: carbs,
        protein_g: protein,
        fat_g: fat,
    }
}

fn validate_profile(profile: &UserProfile) -> Result<(), NutritionError> {
    let metrics = [
        ("height_cm", profile.height_cm),
        ("weight_kg", profile.weight_kg),
        ("age", profile.age),
    ];

    for (field, value) in metrics {
        if !value.is_finite() {
            return Err(NutritionError::InvalidProfile(format!(
                "{} must be a number, got {}",
                field, value
            )));
        }
        if value <= 0.0 {
            return Err(NutritionError::InvalidProfile(format!(
                "{} must be positive, got {}",
                field, value
            )));
        }
    }

    Ok(())
}
