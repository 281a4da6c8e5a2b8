use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Biological sex used by the Mifflin-St Jeor equation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

/// Self-reported activity level
///
/// Both the short labels stored on user records (`low`, `high`) and the
/// calculator labels (`sedentary`, `active`) are accepted. Anything else
/// deserializes to `Unknown`, whose multiplier depends on the strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    #[serde(alias = "low")]
    Sedentary,
    Light,
    Moderate,
    #[serde(alias = "high")]
    Active,
    VeryActive,
    #[serde(other)]
    Unknown,
}

impl ActivityLevel {
    /// TDEE multiplier, or `None` for an unrecognized level
    pub fn multiplier(self) -> Option<f64> {
        match self {
            ActivityLevel::Sedentary => Some(1.2),
            ActivityLevel::Light => Some(1.375),
            ActivityLevel::Moderate => Some(1.55),
            ActivityLevel::Active => Some(1.725),
            ActivityLevel::VeryActive => Some(1.9),
            ActivityLevel::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Goal {
    Lose,
    #[default]
    Maintain,
    Gain,
}

/// Error returned when a stored enum column holds an unexpected value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized value '{0}'")]
pub struct ParseEnumError(pub String);

impl FromStr for Gender {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            other => Err(ParseEnumError(other.to_string())),
        }
    }
}

impl FromStr for ActivityLevel {
    type Err = ParseEnumError;

    /// Never fails: unrecognized levels map to `Unknown`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let level = match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "low" | "sedentary" => ActivityLevel::Sedentary,
            "light" => ActivityLevel::Light,
            "moderate" => ActivityLevel::Moderate,
            "high" | "active" => ActivityLevel::Active,
            "very_active" => ActivityLevel::VeryActive,
            _ => ActivityLevel::Unknown,
        };
        Ok(level)
    }
}

impl FromStr for Goal {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lose" => Ok(Goal::Lose),
            "maintain" => Ok(Goal::Maintain),
            "gain" => Ok(Goal::Gain),
            other => Err(ParseEnumError(other.to_string())),
        }
    }
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl ActivityLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "sedentary",
            ActivityLevel::Light => "light",
            ActivityLevel::Moderate => "moderate",
            ActivityLevel::Active => "active",
            ActivityLevel::VeryActive => "very_active",
            ActivityLevel::Unknown => "unknown",
        }
    }
}

impl Goal {
    pub fn as_str(self) -> &'static str {
        match self {
            Goal::Lose => "lose",
            Goal::Maintain => "maintain",
            Goal::Gain => "gain",
        }
    }
}

/// Body metrics and goals used to derive nutrition targets
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub gender: Gender,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub age: f64,
    pub activity_level: ActivityLevel,
    #[serde(default)]
    pub goal: Goal,
}

/// A registered user as stored in the `users` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: i32,
    pub name: String,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub age: f64,
    pub gender: String,
    pub activity_level: String,
    pub goal: String,
}

impl User {
    /// Interpret the stored text columns as a nutrition profile
    pub fn profile(&self) -> Result<UserProfile, ParseEnumError> {
        Ok(UserProfile {
            gender: self.gender.parse()?,
            height_cm: self.height_cm,
            weight_kg: self.weight_kg,
            age: self.age,
            activity_level: self.activity_level.parse()?,
            goal: self.goal.parse()?,
        })
    }
}

/// Daily calorie and macro targets, rounded to whole units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NutritionTargets {
    pub calories: u32,
    #[serde(rename = "carbs")]
    pub carbs_g: u32,
    #[serde(rename = "protein")]
    pub protein_g: u32,
    #[serde(rename = "fat")]
    pub fat_g: u32,
}

impl NutritionTargets {
    /// Split daily totals into one of three meals
    pub fn per_meal(&self) -> PerMealTarget {
        PerMealTarget {
            calories: self.calories as f64 / 3.0,
            carbs_g: self.carbs_g as f64 / 3.0,
            protein_g: self.protein_g as f64 / 3.0,
            fat_g: self.fat_g as f64 / 3.0,
        }
    }

    /// Calories implied by the macro split (4/4/9 kcal per gram)
    pub fn macro_calories(&self) -> u32 {
        self.carbs_g * 4 + self.protein_g * 4 + self.fat_g * 9
    }
}

/// One third of the daily targets, unrounded so ranking is exact
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerMealTarget {
    pub calories: f64,
    pub carbs_g: f64,
    pub protein_g: f64,
    pub fat_g: f64,
}

impl PerMealTarget {
    pub fn rounded(&self) -> NutritionTargets {
        NutritionTargets {
            calories: round_non_negative(self.calories),
            carbs_g: round_non_negative(self.carbs_g),
            protein_g: round_non_negative(self.protein_g),
            fat_g: round_non_negative(self.fat_g),
        }
    }
}

/// Round to the nearest whole unit, clamping negatives to zero
#[inline]
pub fn round_non_negative(value: f64) -> u32 {
    value.max(0.0).round() as u32
}

/// A dining hall meal as stored by the meal repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub meal_id: i32,
    pub name: String,
    pub location: String,
    pub price: f64,
    pub calories: f64,
    #[serde(rename = "protein")]
    pub protein_g: f64,
    #[serde(rename = "carbs")]
    pub carbs_g: f64,
    #[serde(rename = "fat")]
    pub fat_g: f64,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Meal {
    /// Case-insensitive substring match against any tag
    pub fn has_tag(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.tags
            .iter()
            .any(|tag| tag.to_lowercase().contains(&needle))
    }
}

/// Split a comma-separated tags column into trimmed, non-empty tags
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Query handed to the matcher for a single request
#[derive(Debug, Clone)]
pub struct MatchQuery {
    pub target: PerMealTarget,
    pub filters: Vec<crate::core::filters::MealFilter>,
    pub limit: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// One prior message in a conversation, oldest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

/// Outcome of a single model call in the fallback chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success(String),
    Decommissioned,
    OtherError { code: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelAttempt {
    pub model: String,
    pub outcome: AttemptOutcome,
}

impl ModelAttempt {
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, AttemptOutcome::Success(_))
    }
}
