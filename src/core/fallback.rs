use crate::core::grounding::build_grounded_message;
use crate::models::{AttemptOutcome, ChatTurn, ModelAttempt};
use crate::services::completion::{CompletionBackend, RawCompletion, NO_RESPONSE};
use crate::services::repository::{MealRepository, RepositoryError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub const DECOMMISSIONED_CODE: &str = "model_decommissioned";

/// Errors reported to the caller of the chat flow
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Missing or invalid \"message\" field.")]
    MissingMessage,

    #[error("Missing chat API key in configuration.")]
    MissingCredential,

    #[error("Failed to load meal data: {0}")]
    Repository(#[from] RepositoryError),

    #[error("All models failed, last attempted: {last_model}")]
    AllModelsExhausted { last_model: String },
}

/// When the primary model's failure moves the chain on to the fallbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FallbackTrigger {
    /// Only a decommissioned primary is replaced
    Decommissioned,
    /// Any unsuccessful primary attempt is replaced
    #[default]
    AnyFailure,
}

impl FallbackTrigger {
    pub fn should_fall_back(self, outcome: &AttemptOutcome) -> bool {
        match (self, outcome) {
            (_, AttemptOutcome::Success(_)) => false,
            (FallbackTrigger::Decommissioned, AttemptOutcome::Decommissioned) => true,
            (FallbackTrigger::Decommissioned, AttemptOutcome::OtherError { .. }) => false,
            (FallbackTrigger::AnyFailure, _) => true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub primary_model: String,
    pub fallback_models: Vec<String>,
    pub trigger: FallbackTrigger,
    pub system_prompt: String,
    /// Meals sampled into the prompt; 0 sends the question ungrounded
    pub grounding_sample_size: usize,
    pub attempt_timeout: Duration,
}

/// Final answer of the chat flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatOutcome {
    pub reply: String,
    pub model_used: String,
    pub attempts: Vec<ModelAttempt>,
    /// Every model failed; `reply` holds the sentinel
    pub exhausted: bool,
}

impl ChatOutcome {
    /// Turn exhaustion into an error for callers that do not want the sentinel
    pub fn into_strict(self) -> Result<ChatOutcome, ChatError> {
        if self.exhausted {
            Err(ChatError::AllModelsExhausted {
                last_model: self.model_used,
            })
        } else {
            Ok(self)
        }
    }
}

enum State {
    TryingPrimary,
    TryingFallback(usize),
    Succeeded { model: String, reply: String },
    Exhausted,
}

/// Drives the completion backend through the primary and fallback models
///
/// Attempts run strictly one after another, each bounded by the
/// per-attempt timeout. Nothing is shared between invocations.
pub struct FallbackOrchestrator {
    backend: Arc<dyn CompletionBackend>,
    repository: Arc<dyn MealRepository>,
    config: OrchestratorConfig,
}

impl FallbackOrchestrator {
    pub fn new(
        backend: Arc<dyn CompletionBackend>,
        repository: Arc<dyn MealRepository>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            backend,
            repository,
            config,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Answer a free-text question, grounded in sampled meal data
    ///
    /// Precondition failures are returned before any model is called. The
    /// question is forwarded exactly as given.
    pub async fn answer_question(
        &self,
        message: &str,
        history: &[ChatTurn],
    ) -> Result<ChatOutcome, ChatError> {
        if message.trim().is_empty() {
            return Err(ChatError::MissingMessage);
        }
        if !self.backend.has_credentials() {
            return Err(ChatError::MissingCredential);
        }

        let prompt = self.build_prompt(message).await?;
        Ok(self.run(&prompt, history).await)
    }

    /// The user message actually sent to the models
    pub async fn build_prompt(&self, message: &str) -> Result<String, RepositoryError> {
        if self.config.grounding_sample_size == 0 {
            return Ok(message.to_string());
        }

        let meals = self
            .repository
            .sample_meals(self.config.grounding_sample_size)
            .await?;

        tracing::debug!("Grounding chat prompt with {} sampled meals", meals.len());

        Ok(build_grounded_message(&meals, message))
    }

    async fn run(&self, prompt: &str, history: &[ChatTurn]) -> ChatOutcome {
        let fallbacks = &self.config.fallback_models;
        let mut attempts: Vec<ModelAttempt> = Vec::with_capacity(fallbacks.len() + 1);
        let mut state = State::TryingPrimary;

        loop {
            state = match state {
                State::TryingPrimary => {
                    let attempt = self.attempt(&self.config.primary_model, prompt, history).await;
                    let next = match &attempt.outcome {
                        AttemptOutcome::Success(reply) => State::Succeeded {
                            model: attempt.model.clone(),
                            reply: reply.clone(),
                        },
                        outcome
                            if self.config.trigger.should_fall_back(outcome)
                                && !fallbacks.is_empty() =>
                        {
                            tracing::warn!(
                                "Primary model \"{}\" unavailable, trying fallback models",
                                attempt.model
                            );
                            State::TryingFallback(0)
                        }
                        _ => State::Exhausted,
                    };
                    attempts.push(attempt);
                    next
                }
                State::TryingFallback(i) => {
                    let attempt = self.attempt(&fallbacks[i], prompt, history).await;
                    let next = match &attempt.outcome {
                        AttemptOutcome::Success(reply) => State::Succeeded {
                            model: attempt.model.clone(),
                            reply: reply.clone(),
                        },
                        _ if i + 1 < fallbacks.len() => State::TryingFallback(i + 1),
                        _ => State::Exhausted,
                    };
                    attempts.push(attempt);
                    next
                }
                State::Succeeded { model, reply } => {
                    tracing::info!("Chat completed using model: {}", model);
                    return ChatOutcome {
                        reply,
                        model_used: model,
                        attempts,
                        exhausted: false,
                    };
                }
                State::Exhausted => {
                    let last_model = attempts
                        .last()
                        .map(|a| a.model.clone())
                        .unwrap_or_else(|| self.config.primary_model.clone());

                    tracing::warn!(
                        "All {} model attempts failed, last attempted: {}",
                        attempts.len(),
                        last_model
                    );

                    return ChatOutcome {
                        reply: NO_RESPONSE.to_string(),
                        model_used: last_model,
                        attempts,
                        exhausted: true,
                    };
                }
            };
        }
    }

    async fn attempt(&self, model: &str, prompt: &str, history: &[ChatTurn]) -> ModelAttempt {
        let call = self
            .backend
            .complete(model, &self.config.system_prompt, history, prompt);

        let outcome = match tokio::time::timeout(self.config.attempt_timeout, call).await {
            Ok(raw) => classify(raw),
            Err(_) => AttemptOutcome::OtherError {
                code: "timeout".to_string(),
                message: format!("No reply within {:?}", self.config.attempt_timeout),
            },
        };

        match &outcome {
            AttemptOutcome::Success(_) => tracing::debug!("Model \"{}\" answered", model),
            AttemptOutcome::Decommissioned => {
                tracing::warn!("Model \"{}\" is decommissioned", model)
            }
            AttemptOutcome::OtherError { code, message } => {
                tracing::warn!("Chat attempt with model \"{}\" failed: {} ({})", model, message, code)
            }
        }

        ModelAttempt {
            model: model.to_string(),
            outcome,
        }
    }
}

/// Sort a raw completion into success, decommissioned or other failure
pub fn classify(raw: RawCompletion) -> AttemptOutcome {
    match raw {
        RawCompletion::Text(text) => {
            let text = text.trim();
            if text.is_empty() || text == NO_RESPONSE {
                AttemptOutcome::OtherError {
                    code: "empty_reply".to_string(),
                    message: "Model returned no text".to_string(),
                }
            } else {
                AttemptOutcome::Success(text.to_string())
            }
        }
        RawCompletion::Error { code, message } => {
            if code == DECOMMISSIONED_CODE || message.contains("decommissioned") {
                AttemptOutcome::Decommissioned
            } else {
                AttemptOutcome::OtherError { code, message }
            }
        }
    }
}
