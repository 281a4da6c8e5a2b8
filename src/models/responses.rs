use crate::models::domain::{Meal, NutritionTargets, User};
use serde::{Deserialize, Serialize};

/// Daily and per-meal goals returned with recommendations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserGoals {
    pub daily: NutritionTargets,
    pub per_meal: NutritionTargets,
}

/// Response for the recommend meals endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendMealsResponse {
    pub user_goals: UserGoals,
    pub suggested_meals: Vec<Meal>,
    pub used_fallback: bool,
}

/// Response of the standalone calculator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculateNutritionResponse {
    pub kcal: u32,
    pub protein: u32,
    pub fat: u32,
    pub carbs: u32,
}

impl From<NutritionTargets> for CalculateNutritionResponse {
    fn from(targets: NutritionTargets) -> Self {
        Self {
            kcal: targets.calories,
            protein: targets.protein_g,
            fat: targets.fat_g,
            carbs: targets.carbs_g,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserResponse {
    pub message: String,
    pub user: User,
}

/// Chat reply; `success` stays true even when every model failed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub success: bool,
    #[serde(rename = "modelUsed")]
    pub model_used: String,
    pub reply: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatErrorResponse {
    pub success: bool,
    pub error: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbTestResponse {
    pub connected: bool,
    #[serde(rename = "serverTime", skip_serializing_if = "Option::is_none")]
    pub server_time: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
