use super::{error_response, AppState};
use crate::core::{compute_targets, parse_filters, NutritionStrategy};
use crate::models::{
    ActivityLevel, CalculateNutritionRequest, CalculateNutritionResponse, CreateUserRequest,
    CreateUserResponse, Gender, Goal, Numeric, RecommendMealsQuery, RecommendMealsResponse,
    UserGoals, UserProfile,
};
use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use validator::Validate;

/// Configure user and meal routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/users", web::post().to(create_user))
        .route("/recommend-meals", web::get().to(recommend_meals))
        .route("/calculate-nutrition", web::post().to(calculate_nutrition));
}

/// Create user endpoint
///
/// POST /api/users
///
/// Request body:
/// ```json
/// {
///   "name": "string",
///   "height_cm": 170,
///   "weight_kg": 70,
///   "age": 25,
///   "gender": "male|female",
///   "activity_level": "low|moderate|high|...",
///   "goal": "lose|maintain|gain"
/// }
/// ```
async fn create_user(
    state: web::Data<AppState>,
    req: web::Json<CreateUserRequest>,
) -> impl Responder {
    let (name, profile) = match new_user_profile(&req) {
        Ok(parsed) => parsed,
        Err(resp) => return resp,
    };

    match state.postgres.create_user(&name, &profile).await {
        Ok(user) => HttpResponse::Created().json(CreateUserResponse {
            message: "User successfully created".to_string(),
            user,
        }),
        Err(e) => {
            tracing::error!("Error creating user: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Server error", e.to_string())
        }
    }
}

/// Validate a registration request into a name and profile
fn new_user_profile(req: &CreateUserRequest) -> Result<(String, UserProfile), HttpResponse> {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for create_user request: {:?}", errors);
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "Validation failed",
            errors.to_string(),
        ));
    }

    let (
        Some(name),
        Some(height_cm),
        Some(weight_kg),
        Some(age),
        Some(gender),
        Some(activity_level),
        Some(goal),
    ) = (
        req.name.as_deref(),
        req.height_cm,
        req.weight_kg,
        req.age,
        req.gender.as_deref(),
        req.activity_level.as_deref(),
        req.goal.as_deref(),
    )
    else {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "Missing required fields",
            "name, height_cm, weight_kg, age, gender, activity_level and goal are required",
        ));
    };

    let gender: Gender = gender.parse().map_err(|e| {
        error_response(StatusCode::BAD_REQUEST, "Invalid gender", format!("{}", e))
    })?;
    let goal: Goal = goal.parse().map_err(|e| {
        error_response(StatusCode::BAD_REQUEST, "Invalid goal", format!("{}", e))
    })?;
    let activity_level: ActivityLevel = activity_level.parse().unwrap_or(ActivityLevel::Unknown);

    Ok((
        name.to_string(),
        UserProfile {
            gender,
            height_cm,
            weight_kg,
            age,
            activity_level,
            goal,
        },
    ))
}

/// Recommend meals endpoint
///
/// GET /api/recommend-meals?user_id={id}&filters=High Protein,Vegan
///
/// Targets come from the daily goal strategy; one meal is a third of the day.
async fn recommend_meals(
    state: web::Data<AppState>,
    query: web::Query<RecommendMealsQuery>,
) -> impl Responder {
    let Some(user_id) = query.user_id else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Missing user_id query parameter",
            "user_id query parameter is required",
        );
    };

    let filters = match parse_filters(query.filters.as_deref().unwrap_or("")) {
        Ok(filters) => filters,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, "Invalid filter", e.to_string()),
    };

    let user = match state.postgres.get_user(user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return error_response(
                StatusCode::NOT_FOUND,
                "User not found",
                format!("No user with id {}", user_id),
            )
        }
        Err(e) => {
            tracing::error!("Failed to fetch user {}: {}", user_id, e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Server error", e.to_string());
        }
    };

    let daily = match user
        .profile()
        .map_err(|e| e.to_string())
        .and_then(|profile| {
            compute_targets(&profile, NutritionStrategy::DailyGoal).map_err(|e| e.to_string())
        }) {
        Ok(targets) => targets,
        Err(message) => {
            tracing::info!("User {} has an invalid nutrition profile: {}", user_id, message);
            return error_response(StatusCode::BAD_REQUEST, "Invalid profile", message);
        }
    };

    let per_meal = daily.per_meal();

    let result = match state.matcher.find_meals(&per_meal, &filters).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!("Recommendation error for user {}: {}", user_id, e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Server error", e.to_string());
        }
    };

    tracing::info!(
        "Returning {} meals for user {} (fallback: {})",
        result.meals.len(),
        user_id,
        result.used_fallback
    );

    HttpResponse::Ok().json(RecommendMealsResponse {
        user_goals: UserGoals {
            daily,
            per_meal: per_meal.rounded(),
        },
        suggested_meals: result.meals,
        used_fallback: result.used_fallback,
    })
}

/// Standalone nutrition calculator
///
/// POST /api/calculate-nutrition
///
/// Request body:
/// ```json
/// {
///   "gender": "male",
///   "age": "25",
///   "weight": "70",
///   "height": "170",
///   "activityLevel": "moderate"
/// }
/// ```
async fn calculate_nutrition(req: web::Json<CalculateNutritionRequest>) -> impl Responder {
    match calculator_targets(&req) {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(resp) => resp,
    }
}

fn calculator_targets(
    req: &CalculateNutritionRequest,
) -> Result<CalculateNutritionResponse, HttpResponse> {
    let (Some(gender), Some(age), Some(weight), Some(height), Some(activity_level)) = (
        req.gender.as_deref(),
        req.age.map(Numeric::value),
        req.weight.map(Numeric::value),
        req.height.map(Numeric::value),
        req.activity_level.as_deref(),
    ) else {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "Missing required fields.",
            "gender, age, weight, height and activityLevel are required",
        ));
    };

    let gender: Gender = gender.parse().map_err(|e| {
        error_response(StatusCode::BAD_REQUEST, "Invalid gender", format!("{}", e))
    })?;

    let profile = UserProfile {
        gender,
        height_cm: height,
        weight_kg: weight,
        age,
        activity_level: activity_level.parse().unwrap_or(ActivityLevel::Unknown),
        goal: Goal::Maintain,
    };

    compute_targets(&profile, NutritionStrategy::PerMealCalculator)
        .map(CalculateNutritionResponse::from)
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, "Invalid profile", e.to_string()))
}
