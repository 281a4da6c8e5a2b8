// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    parse_tags, round_non_negative, ActivityLevel, AttemptOutcome, ChatRole, ChatTurn, Gender,
    Goal, MatchQuery, Meal, ModelAttempt, NutritionTargets, ParseEnumError, PerMealTarget, User,
    UserProfile,
};
pub use requests::{CalculateNutritionRequest, ChatRequest, CreateUserRequest, Numeric, RecommendMealsQuery};
pub use responses::{
    CalculateNutritionResponse, ChatErrorResponse, ChatResponse, CreateUserResponse,
    DbTestResponse, ErrorResponse, HealthResponse, RecommendMealsResponse, UserGoals,
};
