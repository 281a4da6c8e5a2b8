// Unit tests for NourishLU

use nourish_lu::core::{
    compute_targets,
    distance::{calorie_distance, nutrition_distance_sq, sort_by_distance},
    filters::{matches_all, parse_filters, MealFilter},
    grounding::{build_grounded_message, format_meal_line, MEAL_DATA_HEADER},
    nutrition::basal_metabolic_rate,
    NutritionStrategy,
};
use nourish_lu::models::{ActivityLevel, Gender, Goal, Meal, PerMealTarget, UserProfile};

fn create_test_profile(gender: Gender, activity_level: ActivityLevel, goal: Goal) -> UserProfile {
    UserProfile {
        gender,
        height_cm: 170.0,
        weight_kg: 70.0,
        age: 25.0,
        activity_level,
        goal,
    }
}

fn create_test_meal(id: i32, calories: f64, protein: f64, carbs: f64, fat: f64, price: f64) -> Meal {
    Meal {
        meal_id: id,
        name: format!("Meal {}", id),
        location: "Rathbone".to_string(),
        price,
        calories,
        protein_g: protein,
        carbs_g: carbs,
        fat_g: fat,
        tags: vec![],
    }
}

#[test]
fn test_bmr_reference_values() {
    let male = create_test_profile(Gender::Male, ActivityLevel::Moderate, Goal::Maintain);
    let female = create_test_profile(Gender::Female, ActivityLevel::Moderate, Goal::Maintain);

    assert!((basal_metabolic_rate(&male) - 1642.5).abs() < 1e-9);
    // Female offset is 166 kcal below male
    assert!((basal_metabolic_rate(&male) - basal_metabolic_rate(&female) - 166.0).abs() < 1e-9);
}

#[test]
fn test_daily_goal_macros_follow_split() {
    for goal in [Goal::Lose, Goal::Maintain, Goal::Gain] {
        let profile = create_test_profile(Gender::Male, ActivityLevel::Active, goal);
        let targets = compute_targets(&profile, NutritionStrategy::DailyGoal).unwrap();

        let kcal = targets.calories as f64;
        assert!((targets.carbs_g as f64 - kcal * 0.40 / 4.0).abs() <= 1.0);
        assert!((targets.protein_g as f64 - kcal * 0.30 / 4.0).abs() <= 1.0);
        assert!((targets.fat_g as f64 - kcal * 0.30 / 9.0).abs() <= 1.0);
    }
}

#[test]
fn test_goal_ordering() {
    let calories = |goal| {
        let profile = create_test_profile(Gender::Female, ActivityLevel::Light, goal);
        compute_targets(&profile, NutritionStrategy::DailyGoal)
            .unwrap()
            .calories
    };

    assert!(calories(Goal::Lose) < calories(Goal::Maintain));
    assert!(calories(Goal::Maintain) < calories(Goal::Gain));
    assert_eq!(calories(Goal::Maintain) - calories(Goal::Lose), 500);
    assert_eq!(calories(Goal::Gain) - calories(Goal::Maintain), 300);
}

#[test]
fn test_more_activity_never_lowers_calories() {
    let levels = [
        ActivityLevel::Sedentary,
        ActivityLevel::Light,
        ActivityLevel::Moderate,
        ActivityLevel::Active,
        ActivityLevel::VeryActive,
    ];

    for strategy in [NutritionStrategy::DailyGoal, NutritionStrategy::PerMealCalculator] {
        let calories: Vec<u32> = levels
            .iter()
            .map(|&level| {
                let profile = create_test_profile(Gender::Male, level, Goal::Maintain);
                compute_targets(&profile, strategy).unwrap().calories
            })
            .collect();

        assert!(calories.windows(2).all(|w| w[0] <= w[1]));
    }
}

#[test]
fn test_per_meal_calculator_reference_values() {
    let profile = create_test_profile(Gender::Male, ActivityLevel::Moderate, Goal::Maintain);
    let targets = compute_targets(&profile, NutritionStrategy::PerMealCalculator).unwrap();

    assert_eq!(targets.calories, 2546);
    assert_eq!(targets.protein_g, 112);
    assert_eq!(targets.fat_g, 71);
    assert_eq!(targets.carbs_g, 365);
}

#[test]
fn test_per_meal_target_is_a_third() {
    let profile = create_test_profile(Gender::Male, ActivityLevel::Moderate, Goal::Maintain);
    let daily = compute_targets(&profile, NutritionStrategy::DailyGoal).unwrap();
    let per_meal = daily.per_meal();

    assert!((per_meal.calories * 3.0 - daily.calories as f64).abs() < 1e-9);
    assert_eq!(per_meal.rounded().calories, 849);
}

#[test]
fn test_invalid_profiles_rejected() {
    let mut profile = create_test_profile(Gender::Male, ActivityLevel::Moderate, Goal::Maintain);
    profile.weight_kg = -5.0;
    assert!(compute_targets(&profile, NutritionStrategy::DailyGoal).is_err());

    profile.weight_kg = f64::INFINITY;
    assert!(compute_targets(&profile, NutritionStrategy::PerMealCalculator).is_err());
}

#[test]
fn test_filter_thresholds_inclusive() {
    let meal = create_test_meal(1, 500.0, 30.0, 40.0, 10.0, 10.0);

    assert!(MealFilter::HighProtein.matches(&meal));
    assert!(MealFilter::LowCarb.matches(&meal));
    assert!(MealFilter::LowCost.matches(&meal));
    assert!(!MealFilter::HighCost.matches(&meal));
    assert!(!MealFilter::LowProtein.matches(&meal));
}

#[test]
fn test_filters_combine_with_and() {
    let filters = parse_filters("High Protein, Low Cost").unwrap();
    let cheap_protein = create_test_meal(1, 600.0, 35.0, 50.0, 20.0, 8.5);
    let pricey_protein = create_test_meal(2, 600.0, 35.0, 50.0, 20.0, 13.0);

    assert!(matches_all(&cheap_protein, &filters));
    assert!(!matches_all(&pricey_protein, &filters));
    assert!(matches_all(&pricey_protein, &[]));
}

#[test]
fn test_parse_filters_rejects_unknown() {
    let err = parse_filters("Vegan,Keto").unwrap_err();
    assert_eq!(err.to_string(), "unknown meal filter 'Keto'");
}

#[test]
fn test_vegan_is_separate_from_vegetarian() {
    let mut meal = create_test_meal(1, 400.0, 12.0, 60.0, 9.0, 7.0);
    meal.tags = vec!["Vegetarian".to_string()];

    assert!(MealFilter::Vegetarian.matches(&meal));
    assert!(!MealFilter::Vegan.matches(&meal));
}

#[test]
fn test_distance_prefers_exact_match() {
    let target = PerMealTarget {
        calories: 700.0,
        carbs_g: 70.0,
        protein_g: 50.0,
        fat_g: 23.0,
    };
    let exact = create_test_meal(1, 700.0, 50.0, 70.0, 23.0, 9.0);
    let off = create_test_meal(2, 710.0, 50.0, 70.0, 23.0, 9.0);

    assert_eq!(nutrition_distance_sq(&exact, &target), 0.0);
    assert_eq!(nutrition_distance_sq(&off, &target), 100.0);
    assert_eq!(calorie_distance(&off, 700.0), 10.0);
}

#[test]
fn test_sort_by_distance_keeps_ties_in_order() {
    let mut meals = vec![
        create_test_meal(1, 900.0, 0.0, 0.0, 0.0, 0.0),
        create_test_meal(2, 500.0, 0.0, 0.0, 0.0, 0.0),
        create_test_meal(3, 700.0, 0.0, 0.0, 0.0, 0.0),
        create_test_meal(4, 300.0, 0.0, 0.0, 0.0, 0.0),
    ];

    // 500 and 900 are both 200 away from 700
    sort_by_distance(&mut meals, |m| calorie_distance(m, 700.0));

    let ids: Vec<i32> = meals.iter().map(|m| m.meal_id).collect();
    assert_eq!(ids, vec![3, 1, 2, 4]);
}

#[test]
fn test_grounded_message_layout() {
    let mut meal = create_test_meal(3, 650.0, 42.0, 55.0, 18.5, 11.0);
    meal.name = "Chicken Burrito Bowl".to_string();
    meal.tags = vec!["gluten-free".to_string(), "high protein".to_string()];

    let line = format_meal_line(1, &meal);
    assert_eq!(
        line,
        "1. Chicken Burrito Bowl — Rathbone — $11.00 — 650 kcal, P:42g C:55g F:18.5g (gluten-free, high protein)"
    );

    let message = build_grounded_message(&[meal], "Where can I get protein?");
    let lines: Vec<&str> = message.lines().collect();
    assert_eq!(lines[0], MEAL_DATA_HEADER);
    assert_eq!(lines[1], line);
    assert_eq!(lines[2], "");
    assert_eq!(lines[3], "User question: Where can I get protein?");
}

fn all_profiles() -> Vec<UserProfile> {
    let mut profiles = Vec::new();
    for gender in [Gender::Male, Gender::Female] {
        for activity_level in [
            ActivityLevel::Sedentary,
            ActivityLevel::Light,
            ActivityLevel::Moderate,
            ActivityLevel::Active,
            ActivityLevel::VeryActive,
            ActivityLevel::Unknown,
        ] {
            for goal in [Goal::Lose, Goal::Maintain, Goal::Gain] {
                profiles.push(create_test_profile(gender, activity_level, goal));
            }
        }
    }
    profiles
}

#[test]
fn test_macro_calories_track_total_calories() {
    for profile in all_profiles() {
        let daily = compute_targets(&profile, NutritionStrategy::DailyGoal).unwrap();
        // Three independently rounded macros: at most 2 + 2 + 4.5 kcal off, plus the total's own rounding
        let gap = (daily.macro_calories() as f64 - daily.calories as f64).abs();
        assert!(gap <= 9.0, "{:?}: daily gap {}", profile, gap);

        let calc = compute_targets(&profile, NutritionStrategy::PerMealCalculator).unwrap();
        // Carbs absorb the remainder, so only their rounding shows
        let gap = (calc.macro_calories() as f64 - calc.calories as f64).abs();
        assert!(gap <= 2.0, "{:?}: calculator gap {}", profile, gap);
    }
}

#[test]
fn test_compute_targets_is_deterministic() {
    for profile in all_profiles() {
        for strategy in [NutritionStrategy::DailyGoal, NutritionStrategy::PerMealCalculator] {
            let first = compute_targets(&profile, strategy).unwrap();
            let second = compute_targets(&profile, strategy).unwrap();
            assert_eq!(first, second);
        }
    }
}
