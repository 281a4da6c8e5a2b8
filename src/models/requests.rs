use crate::models::domain::ChatTurn;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Number that may arrive as JSON number or numeric string (form inputs)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Number(f64),
    #[serde(with = "numeric_string")]
    Text(f64),
}

impl ChatRequest {
    /// The question text, if `message` is a JSON string
    pub fn message_text(&self) -> Option<&str> {
        self.message.as_ref().and_then(serde_json::Value::as_str)
    }
}

impl Numeric {
    pub fn value(self) -> f64 {
        match self {
            Numeric::Number(v) | Numeric::Text(v) => v,
        }
    }
}

mod numeric_string {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.trim().parse::<f64>().map_err(de::Error::custom)
    }
}

/// Request to register a user
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    #[validate(range(min = 1.0, max = 300.0))]
    pub height_cm: Option<f64>,
    #[validate(range(min = 1.0, max = 700.0))]
    pub weight_kg: Option<f64>,
    #[validate(range(min = 1.0, max = 150.0))]
    pub age: Option<f64>,
    pub gender: Option<String>,
    pub activity_level: Option<String>,
    pub goal: Option<String>,
}

/// Query string of the recommendation endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendMealsQuery {
    pub user_id: Option<i32>,
    /// Comma-separated filter labels, e.g. "High Protein,Vegan"
    #[serde(default)]
    pub filters: Option<String>,
}

/// Body of the standalone nutrition calculator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculateNutritionRequest {
    pub gender: Option<String>,
    pub age: Option<Numeric>,
    pub weight: Option<Numeric>,
    pub height: Option<Numeric>,
    #[serde(rename = "activityLevel", alias = "activity_level")]
    pub activity_level: Option<String>,
}

/// Chat question with optional prior turns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Kept as raw JSON so a non-string value is a chat error, not an extractor error
    pub message: Option<serde_json::Value>,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_accepts_numbers_and_strings() {
        let req: CalculateNutritionRequest = serde_json::from_str(
            r#"{"gender":"male","age":"25","weight":70,"height":" 170.5 ","activityLevel":"moderate"}"#,
        )
        .unwrap();

        assert_eq!(req.age.map(Numeric::value), Some(25.0));
        assert_eq!(req.weight.map(Numeric::value), Some(70.0));
        assert_eq!(req.height.map(Numeric::value), Some(170.5));
    }

    #[test]
    fn test_numeric_rejects_garbage() {
        let req = serde_json::from_str::<CalculateNutritionRequest>(r#"{"age":"old"}"#);
        assert!(req.is_err());
    }

    #[test]
    fn test_create_user_validation() {
        let req = CreateUserRequest {
            name: Some(String::new()),
            height_cm: Some(170.0),
            weight_kg: Some(70.0),
            age: Some(400.0),
            gender: Some("male".to_string()),
            activity_level: Some("moderate".to_string()),
            goal: Some("maintain".to_string()),
        };

        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("age"));
        assert!(!fields.contains_key("height_cm"));
    }

    #[test]
    fn test_chat_request_history_defaults_empty() {
        let req: ChatRequest = serde_json::from_str(r#"{"message":"hi"}"#).unwrap();
        assert!(req.history.is_empty());
        assert_eq!(req.message_text(), Some("hi"));
    }

    #[test]
    fn test_chat_request_non_string_message() {
        let req: ChatRequest = serde_json::from_str(r#"{"message":123}"#).unwrap();
        assert_eq!(req.message_text(), None);
    }
}
