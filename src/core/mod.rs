// Core algorithm exports
pub mod distance;
pub mod fallback;
pub mod filters;
pub mod grounding;
pub mod matcher;
pub mod nutrition;

pub use distance::{calorie_distance, nutrition_distance_sq, sort_by_distance};
pub use fallback::{ChatError, ChatOutcome, FallbackOrchestrator, FallbackTrigger, OrchestratorConfig};
pub use filters::{matches_all, parse_filters, MealFilter};
pub use grounding::{build_grounded_message, format_meal_line, DEFAULT_SYSTEM_PROMPT};
pub use matcher::{MatchResult, MealMatcher, MAX_SUGGESTIONS};
pub use nutrition::{compute_targets, NutritionError, NutritionStrategy};
