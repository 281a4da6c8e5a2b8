use crate::models::ChatTurn;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Reply text used whenever a model produced nothing usable
pub const NO_RESPONSE: &str = "(no response)";

pub const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Upper bound on generated tokens per reply
pub const MAX_TOKENS_CEILING: u32 = 300;

/// Outcome of one chat completion call
///
/// Transport and API failures are values, not errors, so the fallback
/// chain can inspect the code and decide what to try next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawCompletion {
    Text(String),
    Error { code: String, message: String },
}

impl RawCompletion {
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        RawCompletion::Error {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Anything able to answer a single chat completion request
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Whether an API credential is configured
    fn has_credentials(&self) -> bool;

    async fn complete(
        &self,
        model: &str,
        system_prompt: &str,
        history: &[ChatTurn],
        user_message: &str,
    ) -> RawCompletion;
}

/// Sampling parameters sent with every request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl GenerationParams {
    /// Clamp temperature to [0, 1] and the token budget to [1, 300]
    pub fn bounded(temperature: f32, max_tokens: u32) -> Self {
        let temperature = if temperature.is_finite() {
            temperature.clamp(0.0, 1.0)
        } else {
            Self::default().temperature
        };

        Self {
            temperature,
            max_tokens: max_tokens.clamp(1, MAX_TOKENS_CEILING),
        }
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.5,
            max_tokens: MAX_TOKENS_CEILING,
        }
    }
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionBody {
    #[serde(default)]
    choices: Vec<Choice>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: Option<String>,
    message: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

/// Client for an OpenAI-compatible chat completions endpoint
pub struct CompletionClient {
    client: Client,
    api_url: String,
    api_key: Option<String>,
    params: GenerationParams,
}

impl CompletionClient {
    /// Create a new completion client
    ///
    /// `request_timeout` bounds each HTTP call; a blank key counts as missing.
    pub fn new(
        api_url: String,
        api_key: Option<String>,
        params: GenerationParams,
        request_timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(request_timeout).build()?;

        Ok(Self {
            client,
            api_url,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            params,
        })
    }

    pub fn params(&self) -> GenerationParams {
        self.params
    }

    fn build_request<'a>(
        &self,
        model: &'a str,
        system_prompt: &'a str,
        history: &'a [ChatTurn],
        user_message: &'a str,
    ) -> CompletionRequest<'a> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(WireMessage {
            role: "system",
            content: system_prompt,
        });
        messages.extend(history.iter().map(|turn| WireMessage {
            role: turn.role.as_str(),
            content: &turn.content,
        }));
        messages.push(WireMessage {
            role: "user",
            content: user_message,
        });

        CompletionRequest {
            model,
            messages,
            temperature: self.params.temperature,
            max_tokens: self.params.max_tokens,
        }
    }
}

#[async_trait]
impl CompletionBackend for CompletionClient {
    fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }

    async fn complete(
        &self,
        model: &str,
        system_prompt: &str,
        history: &[ChatTurn],
        user_message: &str,
    ) -> RawCompletion {
        let Some(api_key) = self.api_key.as_deref() else {
            return RawCompletion::error("missing_credentials", "No API key configured");
        };

        let request = self.build_request(model, system_prompt, history, user_message);

        tracing::debug!("Requesting completion from {} with model {}", self.api_url, model);

        let response = match self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_timeout() => return RawCompletion::error("timeout", e.to_string()),
            Err(e) => return RawCompletion::error("network_error", e.to_string()),
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => return RawCompletion::error("network_error", e.to_string()),
        };

        parse_completion(status, &text)
    }
}

/// Map an HTTP status and body onto a completion result
fn parse_completion(status: reqwest::StatusCode, text: &str) -> RawCompletion {
    let http_code = format!("http_{}", status.as_u16());

    let body: CompletionBody = match serde_json::from_str(text) {
        Ok(body) => body,
        Err(e) if status.is_success() => {
            return RawCompletion::error("invalid_response", format!("Failed to parse body: {}", e));
        }
        Err(_) => return RawCompletion::error(http_code, status.to_string()),
    };

    if let Some(error) = body.error {
        return RawCompletion::Error {
            code: error.code.or(error.kind).unwrap_or(http_code),
            message: error.message.unwrap_or_default(),
        };
    }

    if !status.is_success() {
        return RawCompletion::error(http_code, status.to_string());
    }

    let content = body
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .unwrap_or_else(|| NO_RESPONSE.to_string());

    RawCompletion::Text(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChatRole;
    use reqwest::StatusCode;

    #[test]
    fn test_generation_params_bounded() {
        let params = GenerationParams::bounded(1.7, 4096);
        assert_eq!(params.temperature, 1.0);
        assert_eq!(params.max_tokens, MAX_TOKENS_CEILING);

        let params = GenerationParams::bounded(f32::NAN, 0);
        assert_eq!(params.temperature, 0.5);
        assert_eq!(params.max_tokens, 1);
    }

    #[test]
    fn test_request_orders_system_history_user() {
        let client = CompletionClient::new(
            DEFAULT_API_URL.to_string(),
            Some("key".to_string()),
            GenerationParams::default(),
            Duration::from_secs(5),
        )
        .unwrap();

        let history = vec![
            ChatTurn { role: ChatRole::User, content: "hi".to_string() },
            ChatTurn { role: ChatRole::Assistant, content: "hello".to_string() },
        ];
        let request = client.build_request("m", "persona", &history, "question");
        let json = serde_json::to_value(&request).unwrap();

        let roles: Vec<&str> = json["messages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["role"].as_str().unwrap())
            .collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
        assert_eq!(json["messages"][3]["content"], "question");
        assert_eq!(json["max_tokens"], 300);
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let client = CompletionClient::new(
            DEFAULT_API_URL.to_string(),
            Some("   ".to_string()),
            GenerationParams::default(),
            Duration::from_secs(5),
        )
        .unwrap();

        assert!(!client.has_credentials());
    }

    #[test]
    fn test_parse_success() {
        let body = r#"{"choices":[{"message":{"content":"  Try the wrap.  "}}]}"#;
        assert_eq!(
            parse_completion(StatusCode::OK, body),
            RawCompletion::Text("Try the wrap.".to_string())
        );
    }

    #[test]
    fn test_parse_missing_content_is_sentinel() {
        let body = r#"{"choices":[{"message":{}}]}"#;
        assert_eq!(
            parse_completion(StatusCode::OK, body),
            RawCompletion::Text(NO_RESPONSE.to_string())
        );
        assert_eq!(
            parse_completion(StatusCode::OK, r#"{"choices":[]}"#),
            RawCompletion::Text(NO_RESPONSE.to_string())
        );
    }

    #[test]
    fn test_parse_api_error() {
        let body = r#"{"error":{"message":"The model `x` has been decommissioned","type":"invalid_request_error","code":"model_decommissioned"}}"#;
        match parse_completion(StatusCode::BAD_REQUEST, body) {
            RawCompletion::Error { code, message } => {
                assert_eq!(code, "model_decommissioned");
                assert!(message.contains("decommissioned"));
            }
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_non_json_failure_uses_status() {
        match parse_completion(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>") {
            RawCompletion::Error { code, .. } => assert_eq!(code, "http_502"),
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_malformed_success_body() {
        match parse_completion(StatusCode::OK, "not json") {
            RawCompletion::Error { code, .. } => assert_eq!(code, "invalid_response"),
            other => panic!("expected error, got {:?}", other),
        }
    }
}
