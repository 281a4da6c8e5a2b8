//! NourishLU - campus dining nutrition backend
//!
//! Computes calorie and macronutrient targets from a user profile, matches
//! dining hall meals against per-meal targets and answers free-text dining
//! questions through a chain of hosted language models.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{compute_targets, FallbackOrchestrator, MealMatcher, NutritionStrategy};
pub use models::{Meal, NutritionTargets, PerMealTarget, UserProfile};
