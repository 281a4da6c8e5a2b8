use crate::models::Meal;

/// Persona and answering rules sent as the system message
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are NourishLU, a friendly campus dining assistant for Lehigh University.\n\
You are given real meal data with names, locations, prices and nutrition facts.\n\
When you answer:\n\
- Mention only meals that appear in the provided meal data.\n\
- Suggest 2 or 3 meals that fit the user's question.\n\
- Write short conversational sentences, never lists or headers.\n\
- Work details such as location, calories or protein naturally into the sentences.\n\
- Finish with one short follow-up question about their preferences.\n\
Keep the whole reply under 100 words.";

pub const MEAL_DATA_HEADER: &str = "Meal data currently available from campus dining:";
pub const USE_ONLY_INSTRUCTION: &str = "Use only the above meal data when answering.";

/// One meal as a numbered fact line, `index` starting at 1
pub fn format_meal_line(index: usize, meal: &Meal) -> String {
    format!(
        "{}. {} — {} — ${:.2} — {} kcal, P:{}g C:{}g F:{}g ({})",
        index,
        meal.name,
        meal.location,
        meal.price,
        meal.calories,
        meal.protein_g,
        meal.carbs_g,
        meal.fat_g,
        meal.tags.join(", ")
    )
}

pub fn format_meal_lines(meals: &[Meal]) -> String {
    meals
        .iter()
        .enumerate()
        .map(|(i, meal)| format_meal_line(i + 1, meal))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Wrap a user question with the sampled meal facts
pub fn build_grounded_message(meals: &[Meal], question: &str) -> String {
    format!(
        "{}\n{}\n\nUser question: {}\n{}",
        MEAL_DATA_HEADER,
        format_meal_lines(meals),
        question,
        USE_ONLY_INSTRUCTION
    )
}
